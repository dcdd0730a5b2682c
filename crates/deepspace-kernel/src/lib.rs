//! `deepspace-kernel` – mechanism framework and safety primitives.
//!
//! The kernel does not know what any particular mechanism does.  It defines
//! the contract they all follow and the small set of rules that keep them
//! safe.
//!
//! # Modules
//!
//! - [`mechanism`] – [`Mechanism`] and [`MechanismState`]: the uniform "has a
//!   current state, can transition to an explicit state" abstraction.
//! - [`capability`] – narrow status channels injected into mechanisms at
//!   construction instead of a shared robot handle.
//! - [`travel_limits`] – [`TravelLimits`]: soft-limit zone detection, speed
//!   clamping near the ends of travel and target clamping.
//! - [`watchdog`] – [`CycleWatchdog`]: flags control cycles that overrun
//!   their period.

pub mod capability;
pub mod mechanism;
pub mod travel_limits;
pub mod watchdog;

pub use capability::{StatusPublisher, StatusQuery, status_channel};
pub use mechanism::{Mechanism, MechanismState, transition_by_name};
pub use travel_limits::TravelLimits;
pub use watchdog::{CycleHealth, CycleWatchdog};
