//! Asynchronous notification dispatch, decoupled from the request path.
//!
//! Layout:
//! - `envelope.rs`: the unit of deferred work and the task name registry
//! - `actor.rs`: the queue itself (ractor actor) and the enqueue handle
//! - `tasks.rs`: handler functions executed by the worker

pub mod actor;
pub mod envelope;
pub mod tasks;

pub use actor::{spawn, NotifierHandle, NotifierMessage};
pub use envelope::{DispatchEnvelope, NOTIFY_WEBHOOK, SEND_BUG_REPORT_EMAIL};
pub use tasks::{run_task, NotifyConfig};
