//! Session – paces a [`ControlLoop`] at its fixed period and takes requests
//! from the shell between cycles.

use std::sync::atomic::Ordering;
use std::time::Duration;

use deepspace_kernel::MechanismState;
use deepspace_runtime::{ControlLoop, Phase, TracingSink};
use deepspace_types::RobotState;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Shell → loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Queue a robot state; it runs from the next cycle on.
    Request(RobotState),
    /// Same as the Ctrl-C edge.
    Stop,
}

/// Loop → shell, published after every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStatus {
    pub phase: Phase,
    pub state: RobotState,
    pub pending: Option<RobotState>,
    pub cycles: u64,
    pub overruns: u64,
    pub worst: Duration,
    pub fault: Option<String>,
}

impl LoopStatus {
    pub fn of(ctl: &ControlLoop) -> Self {
        Self {
            phase: ctl.phase(),
            state: ctl.robot().state(),
            pending: ctl.robot().pending(),
            cycles: ctl.cycles(),
            overruns: ctl.watchdog().overruns(),
            worst: ctl.watchdog().worst(),
            fault: ctl.fault().map(ToString::to_string),
        }
    }
}

/// Channel ends for the shell side of a session.
pub struct SessionHandle {
    pub commands: mpsc::UnboundedSender<Command>,
    pub status: watch::Receiver<LoopStatus>,
}

/// Build the channels for `ctl`.  Pass the receiver to [`run`].
pub fn channels(
    ctl: &ControlLoop,
) -> (
    SessionHandle,
    mpsc::UnboundedReceiver<Command>,
    watch::Sender<LoopStatus>,
) {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (status_tx, status) = watch::channel(LoopStatus::of(ctl));
    (SessionHandle { commands, status }, command_rx, status_tx)
}

/// Tick `ctl` once per period until it stops.  Returns the final status.
pub async fn run(
    mut ctl: ControlLoop,
    mut commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<LoopStatus>,
) -> LoopStatus {
    let mut interval = time::interval(ctl.period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sink = TracingSink::new();
    info!(period_ms = ctl.period().as_millis() as u64, "control loop started");

    loop {
        interval.tick().await;
        while let Ok(command) = commands.try_recv() {
            debug!(?command, "shell command");
            match command {
                Command::Request(state) => ctl.robot_mut().request(MechanismState::of(state)),
                Command::Stop => ctl.stop_handle().store(true, Ordering::SeqCst),
            }
        }
        // The loop logs and acts on its own errors.
        let _ = ctl.tick(&mut sink);
        let latest = LoopStatus::of(&ctl);
        status.send_replace(latest.clone());
        if latest.phase == Phase::Stopped {
            info!(cycles = latest.cycles, records = sink.records(), "control loop finished");
            return latest;
        }
    }
}
