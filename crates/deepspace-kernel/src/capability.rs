//! Status channels – narrow capabilities passed between mechanisms.
//!
//! A mechanism that needs to know something about a peer (the drivetrain
//! slowing down while the hatch intake is extended, for example) receives a
//! [`StatusQuery`] at construction.  The owning mechanism keeps the matching
//! [`StatusPublisher`] and is the only writer.  No mechanism ever holds a
//! handle to the whole robot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Create a connected publisher/query pair named `name`, initially `false`.
///
/// # Example
///
/// ```
/// use deepspace_kernel::capability::status_channel;
///
/// let (publisher, query) = status_channel("hatch/extended");
/// assert!(!query.get());
/// publisher.publish(true);
/// assert!(query.get());
/// ```
pub fn status_channel(name: &'static str) -> (StatusPublisher, StatusQuery) {
    let flag = Arc::new(AtomicBool::new(false));
    (
        StatusPublisher {
            name,
            flag: Arc::clone(&flag),
        },
        StatusQuery { name, flag },
    )
}

/// Write end of a status channel.  Not `Clone`: one writer per channel.
#[derive(Debug)]
pub struct StatusPublisher {
    name: &'static str,
    flag: Arc<AtomicBool>,
}

impl StatusPublisher {
    /// Set the published value.  Changes are logged at `debug`.
    pub fn publish(&self, value: bool) {
        let previous = self.flag.swap(value, Ordering::SeqCst);
        if previous != value {
            tracing::debug!(status = self.name, value, "status changed");
        }
    }

    /// Current published value.
    pub fn get(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Hand out another reader for this channel.
    pub fn query(&self) -> StatusQuery {
        StatusQuery {
            name: self.name,
            flag: Arc::clone(&self.flag),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Read end of a status channel.
#[derive(Debug, Clone)]
pub struct StatusQuery {
    name: &'static str,
    flag: Arc<AtomicBool>,
}

impl StatusQuery {
    /// A query with no publisher that always reads `value`.
    ///
    /// Used when the mechanism that would publish it is disabled.
    pub fn constant(name: &'static str, value: bool) -> Self {
        Self {
            name,
            flag: Arc::new(AtomicBool::new(value)),
        }
    }

    pub fn get(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_sees_published_value() {
        let (p, q) = status_channel("intake/extended");
        assert!(!q.get());
        p.publish(true);
        assert!(q.get());
        p.publish(false);
        assert!(!q.get());
    }

    #[test]
    fn extra_readers_share_the_channel() {
        let (p, q1) = status_channel("hatch/holding");
        let q2 = p.query();
        let q3 = q1.clone();
        p.publish(true);
        assert!(q1.get() && q2.get() && q3.get());
        assert_eq!(q2.name(), "hatch/holding");
    }

    #[test]
    fn constant_query_never_changes() {
        let q = StatusQuery::constant("intake/extended", false);
        assert!(!q.get());
        let q = StatusQuery::constant("intake/extended", true);
        assert!(q.get());
    }

    #[test]
    fn republishing_same_value_is_harmless() {
        let (p, q) = status_channel("x");
        p.publish(true);
        p.publish(true);
        assert!(q.get());
        assert!(p.get());
    }
}
