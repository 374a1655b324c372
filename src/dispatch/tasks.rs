//! Worker-side task handlers, dispatched by registered name.

use crate::config::Config;
use crate::dispatch::envelope::{DispatchEnvelope, NOTIFY_WEBHOOK, SEND_BUG_REPORT_EMAIL};
use crate::error::TrackerError;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use url::Url;

/// Tuning shared by all task handlers.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub webhook_url: Option<Url>,
    /// Hard cap on the outbound call so a downstream outage cannot stall
    /// the worker.
    pub webhook_timeout: Duration,
    /// Length of the simulated email send.
    pub email_delay: Duration,
}

impl NotifyConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            webhook_url: cfg.webhook_url.clone(),
            webhook_timeout: Duration::from_secs(2),
            email_delay: Duration::from_secs(5),
        }
    }
}

/// Execute one dequeued task. Errors are returned to the caller (the actor),
/// which logs and drops them: at-most-once, no redelivery.
pub async fn run_task(
    envelope: DispatchEnvelope,
    client: reqwest::Client,
    cfg: &NotifyConfig,
) -> Result<(), TrackerError> {
    match envelope.task.as_str() {
        SEND_BUG_REPORT_EMAIL => send_bug_report_email(&envelope, cfg.email_delay).await,
        NOTIFY_WEBHOOK => notify_webhook(&envelope, client, cfg).await,
        other => Err(TrackerError::TaskExecution {
            task: other.to_string(),
            reason: "no handler registered under this name".to_string(),
        }),
    }
}

fn titled_args(envelope: &DispatchEnvelope) -> Result<(&str, &str), TrackerError> {
    match envelope.args.as_slice() {
        [title, status, ..] => Ok((title, status)),
        _ => Err(TrackerError::TaskExecution {
            task: envelope.task.clone(),
            reason: format!("expected (title, status), got {} args", envelope.args.len()),
        }),
    }
}

/// Stand-in for the SMTP round-trip of a real deployment.
async fn send_bug_report_email(
    envelope: &DispatchEnvelope,
    delay: Duration,
) -> Result<(), TrackerError> {
    let (title, status) = titled_args(envelope)?;
    info!(id = envelope.id, %title, "sending bug report email");
    sleep(delay).await;
    info!(id = envelope.id, %title, %status, "bug report email sent");
    Ok(())
}

async fn notify_webhook(
    envelope: &DispatchEnvelope,
    client: reqwest::Client,
    cfg: &NotifyConfig,
) -> Result<(), TrackerError> {
    let (title, status) = titled_args(envelope)?;
    let Some(url) = cfg.webhook_url.as_ref() else {
        info!(id = envelope.id, "webhook endpoint not configured, skipping");
        return Ok(());
    };
    let body = json!({ "text": format!("New bug reported: {title} [{status}]") });
    let response = client
        .post(url.clone())
        .timeout(cfg.webhook_timeout)
        .json(&body)
        .send()
        .await?;
    // Status is logged, never propagated to the enqueueing side.
    info!(id = envelope.id, status = %response.status(), "webhook delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> NotifyConfig {
        NotifyConfig {
            webhook_url: None,
            webhook_timeout: Duration::from_millis(100),
            email_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn from_config_carries_the_webhook_endpoint() {
        let mut cfg = Config::default();
        assert!(NotifyConfig::from_config(&cfg).webhook_url.is_none());

        cfg.webhook_url = Some(Url::parse("https://hooks.example.com/T000/B000").unwrap());
        let notify = NotifyConfig::from_config(&cfg);
        assert_eq!(
            notify.webhook_url.as_ref().map(Url::as_str),
            Some("https://hooks.example.com/T000/B000")
        );
        assert_eq!(notify.webhook_timeout, Duration::from_secs(2));
        assert_eq!(notify.email_delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unknown_task_names_are_rejected() {
        let envelope = DispatchEnvelope::new("reticulate_splines", vec![]);
        let err = run_task(envelope, reqwest::Client::new(), &test_config())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::TaskExecution { .. }));
    }

    #[tokio::test]
    async fn email_task_requires_title_and_status() {
        let envelope = DispatchEnvelope::new(SEND_BUG_REPORT_EMAIL, vec!["only-title".to_string()]);
        let err = run_task(envelope, reqwest::Client::new(), &test_config())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::TaskExecution { .. }));
    }

    #[tokio::test]
    async fn email_task_completes_after_the_simulated_send() {
        let envelope = DispatchEnvelope::new(
            SEND_BUG_REPORT_EMAIL,
            vec!["Broken link".to_string(), "New".to_string()],
        );
        run_task(envelope, reqwest::Client::new(), &test_config())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn webhook_task_is_a_noop_without_an_endpoint() {
        let envelope = DispatchEnvelope::new(
            NOTIFY_WEBHOOK,
            vec!["Broken link".to_string(), "New".to_string()],
        );
        run_task(envelope, reqwest::Client::new(), &test_config())
            .await
            .unwrap();
    }
}
