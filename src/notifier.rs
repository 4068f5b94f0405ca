//! Hand-off of a freshly issued bearer token to the desktop application
//!
//! The desktop application listens on a loopback port. After a successful
//! sign-in the relay sends it one `GET <callback_url>?token=<token>`. The
//! request runs on its own task so the browser response is never held up; it
//! has a bounded timeout, is never retried, and its outcome is only logged.
//!
//! For observability the spawned task's [`JoinHandle`] yields the
//! [`NotifyOutcome`], and a completion channel can be attached to receive
//! every outcome as it happens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::auth::guards::redact;
use crate::config::NotifierConfig;
use crate::error::{RelayError, Result};

/// How a notification attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The desktop listener answered. Any status counts; the body is logged
    /// but not interpreted.
    Delivered { status: u16, body: String },
    /// The listener could not be reached or did not answer in time.
    Failed { reason: String },
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered { .. })
    }
}

/// Notifies the local desktop application of new bearer tokens.
#[derive(Debug, Clone)]
pub struct LocalAppNotifier {
    http: reqwest::Client,
    callback_url: Url,
    completions: Option<mpsc::UnboundedSender<NotifyOutcome>>,
}

impl LocalAppNotifier {
    /// Builds a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Notifier`] if the callback URL is invalid, or
    /// [`RelayError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let callback_url = Url::parse(&config.callback_url)
            .map_err(|e| RelayError::Notifier(format!("invalid callback URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(RelayError::Http)?;
        Ok(Self {
            http,
            callback_url,
            completions: None,
        })
    }

    /// Publishes every [`NotifyOutcome`] on `tx` once the request finishes.
    pub fn with_completion_channel(mut self, tx: mpsc::UnboundedSender<NotifyOutcome>) -> Self {
        self.completions = Some(tx);
        self
    }

    /// The URL the desktop listener is called with, `token` URL-encoded into
    /// the query.
    pub fn target_url(&self, token: &str) -> Url {
        let mut url = self.callback_url.clone();
        url.query_pairs_mut().append_pair("token", token);
        url
    }

    /// Sends the notification and waits for the outcome.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`NotifyOutcome::Failed`].
    pub async fn notify(&self, token: &str) -> NotifyOutcome {
        tracing::info!(
            target_url = %self.callback_url,
            token = %redact(token),
            "Notifying desktop app"
        );

        let outcome = match self.http.get(self.target_url(token)).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                tracing::info!("Desktop app notified, status: {}", status);
                let body = resp.text().await.unwrap_or_else(|e| {
                    tracing::warn!("Failed to read desktop app response: {}", e);
                    String::new()
                });
                tracing::info!("Desktop app response: {}", body);
                NotifyOutcome::Delivered { status, body }
            }
            Err(e) => {
                tracing::error!("Error notifying desktop app: {}", e);
                NotifyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if let Some(tx) = &self.completions {
            // Receiver may be gone; nobody is waiting then.
            let _ = tx.send(outcome.clone());
        }
        outcome
    }

    /// Starts [`notify`](Self::notify) on a background task and returns
    /// immediately.
    pub fn spawn_notify(self: &Arc<Self>, token: String) -> JoinHandle<NotifyOutcome> {
        let notifier = Arc::clone(self);
        tokio::spawn(async move { notifier.notify(&token).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> LocalAppNotifier {
        LocalAppNotifier::new(&NotifierConfig::default()).unwrap()
    }

    #[test]
    fn test_target_url_default_listener() {
        let url = notifier().target_url("abc");
        assert_eq!(url.as_str(), "http://localhost:8888/callback?token=abc");
    }

    #[test]
    fn test_target_url_encodes_token() {
        let url = notifier().target_url("a+b/c=d&e");
        assert_eq!(
            url.as_str(),
            "http://localhost:8888/callback?token=a%2Bb%2Fc%3Dd%26e"
        );
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "token");
        assert_eq!(value, "a+b/c=d&e");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = NotifierConfig {
            callback_url: "nope".to_string(),
            ..NotifierConfig::default()
        };
        assert!(LocalAppNotifier::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_listener_is_reported_not_raised() {
        // Port 9 (discard) on loopback is almost never listening.
        let config = NotifierConfig {
            callback_url: "http://127.0.0.1:9/callback".to_string(),
            timeout_seconds: 2,
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(LocalAppNotifier::new(&config).unwrap().with_completion_channel(tx));

        let outcome = notifier.spawn_notify("tok".to_string()).await.unwrap();
        assert!(!outcome.is_delivered());
        assert_eq!(rx.recv().await, Some(outcome));
    }
}
