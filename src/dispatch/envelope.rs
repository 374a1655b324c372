use std::sync::atomic::{AtomicU64, Ordering};

/// Registered name of the simulated email task.
pub const SEND_BUG_REPORT_EMAIL: &str = "send_bug_report_email";
/// Registered name of the outbound webhook task.
pub const NOTIFY_WEBHOOK: &str = "notify_webhook";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A unit of deferred work handed to the notifier queue. The id exists only
/// for log correlation; nothing waits on it or retains an acknowledgment.
#[derive(Debug, Clone)]
pub struct DispatchEnvelope {
    pub id: u64,
    pub task: String,
    pub args: Vec<String>,
}

impl DispatchEnvelope {
    pub fn new(task: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            task: task.into(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_ids_are_distinct_and_increasing() {
        let a = DispatchEnvelope::new(SEND_BUG_REPORT_EMAIL, vec![]);
        let b = DispatchEnvelope::new(NOTIFY_WEBHOOK, vec![]);
        assert!(b.id > a.id);
    }
}
