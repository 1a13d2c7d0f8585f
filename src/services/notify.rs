use async_trait::async_trait;

/// Terminal-state callback. Never fails the job.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, payload: &serde_json::Value);
}

/// POSTs the job status as JSON; failures are logged and dropped.
#[derive(Clone, Debug, Default)]
pub struct WebhookNotifier {
    client: reqwest::Client,
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, url: &str, payload: &serde_json::Value) {
        match self.client.post(url).json(payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(url, status = %resp.status(), "webhook delivered");
            }
            Ok(resp) => tracing::warn!(url, status = %resp.status(), "webhook rejected"),
            Err(e) => tracing::warn!(url, error = %e, "webhook failed"),
        }
    }
}
