//! The notifier actor: an in-process queue that executes deferred work
//! outside the caller's failure domain.

use crate::dispatch::envelope::DispatchEnvelope;
use crate::dispatch::tasks::{self, NotifyConfig};
use crate::error::TrackerError;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use std::time::Duration;
use tracing::{error, info, warn};

/// Messages handled by the notifier actor.
#[derive(Debug)]
pub enum NotifierMessage {
    /// Fire-and-forget hand-off; never acknowledged back to the caller.
    Dispatch(DispatchEnvelope),
}

/// Handle for enqueueing deferred work onto the notifier queue.
#[derive(Clone)]
pub struct NotifierHandle {
    actor: ActorRef<NotifierMessage>,
}

impl NotifierHandle {
    /// Enqueue a task by registered name. A dispatch failure is logged and
    /// swallowed: the caller's already-committed mutation stays successful.
    pub fn enqueue(&self, task: &str, args: Vec<String>) {
        if let Err(e) = self.try_enqueue(task, args) {
            warn!(task, "notification dropped: {e}");
        }
    }

    /// Enqueue and surface the dispatch outcome, for callers that want to
    /// log it with more context.
    pub fn try_enqueue(&self, task: &str, args: Vec<String>) -> Result<(), TrackerError> {
        let envelope = DispatchEnvelope::new(task, args);
        ractor::cast!(self.actor, NotifierMessage::Dispatch(envelope))
            .map_err(|e| TrackerError::Dispatch(format!("queue unreachable: {e}")))
    }

    /// Stop accepting work; anything still queued is discarded.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

struct NotifierActorState {
    client: reqwest::Client,
    notify: NotifyConfig,
}

struct NotifierActor;

#[ractor::async_trait]
impl Actor for NotifierActor {
    type Msg = NotifierMessage;
    type State = NotifierActorState;
    type Arguments = NotifyConfig;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        notify: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let client = reqwest::Client::builder()
            .user_agent("bugkiller-notifier/1.0")
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| ActorProcessingErr::from(format!("notifier HTTP client init failed: {e}")))?;
        info!(
            webhook = notify
                .webhook_url
                .as_ref()
                .map(|u| u.as_str())
                .unwrap_or("<none>"),
            "notifier worker started"
        );
        Ok(NotifierActorState { client, notify })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            NotifierMessage::Dispatch(envelope) => {
                let client = state.client.clone();
                let notify = state.notify.clone();
                // Run each task on its own so one slow send cannot back up
                // the queue; no ordering is promised between tasks.
                tokio::spawn(async move {
                    let task = envelope.task.clone();
                    let id = envelope.id;
                    if let Err(e) = tasks::run_task(envelope, client, &notify).await {
                        // At-most-once: log and drop, no redelivery.
                        error!(task = %task, id, "task execution failed: {e}");
                    }
                });
            }
        }
        Ok(())
    }
}

/// Spawn the notifier actor; returns the enqueue handle and the join handle
/// of the actor itself.
pub async fn spawn(notify: NotifyConfig) -> (NotifierHandle, ractor::concurrency::JoinHandle<()>) {
    let (actor, jh) = Actor::spawn(Some("NotifierActor".to_string()), NotifierActor, notify)
        .await
        .expect("failed to spawn NotifierActor");
    (NotifierHandle { actor }, jh)
}
