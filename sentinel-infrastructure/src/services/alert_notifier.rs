use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use sentinel_domain::ports::AlertNotifier;
use sentinel_domain::RuntimeConfig;

const DEFAULT_TEMPLATE: &str = r#"{"message":"Sentinel froze {total} account(s)\n{lines}"}"#;
const MAX_LINES: usize = 8;

/// Posts freeze reports to the operator webhook, if one is configured.
pub struct WebhookAlertNotifier {
    url: Option<String>,
    template: String,
    timeout: Duration,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl WebhookAlertNotifier {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            url: config
                .alert_webhook_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(ToString::to_string),
            template: config
                .alert_webhook_template
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            timeout: Duration::from_secs(config.request_timeout_seconds.max(3)),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|err| err.into_inner());
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(handle);
    }

    fn client(&self) -> Result<Client> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }
}

#[async_trait]
impl AlertNotifier for WebhookAlertNotifier {
    fn spawn_notify(&self, reports: Vec<String>) {
        let Some(url) = self.url.clone() else {
            return;
        };
        if reports.is_empty() {
            return;
        }
        let payload = build_payload(&reports, &self.template);
        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                warn!("alert webhook client init failed: {}", err);
                return;
            }
        };
        let handle = tokio::spawn(async move {
            let result = async {
                client
                    .post(&url)
                    .header("Content-Type", "application/json")
                    .body(payload)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<_, reqwest::Error>(())
            }
            .await;
            match result {
                Ok(()) => info!(freezes = reports.len(), "alert webhook delivered"),
                Err(err) => warn!("alert webhook failed: {}", err),
            }
        });
        self.track(handle);
    }

    async fn check_target(&self) -> Result<()> {
        let Some(url) = self.url.as_deref() else {
            anyhow::bail!("alert webhook url not configured");
        };
        let response = self.client()?.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("alert webhook responded {}", response.status());
        }
        Ok(())
    }

    fn mode(&self) -> &'static str {
        if self.url.is_some() {
            "http"
        } else {
            "unset"
        }
    }

    async fn flush(&self) {
        let pending = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|err| err.into_inner());
            std::mem::take(&mut *in_flight)
        };
        for handle in pending {
            if let Err(err) = handle.await {
                warn!("alert webhook task aborted: {}", err);
            }
        }
    }
}

fn build_payload(reports: &[String], template: &str) -> String {
    let mut line_text = reports
        .iter()
        .take(MAX_LINES)
        .map(|line| escape_json_text(line))
        .collect::<Vec<_>>()
        .join("\\n");
    if reports.len() > MAX_LINES {
        line_text.push_str(&format!("\\n...and {} more", reports.len() - MAX_LINES));
    }
    template
        .replace("{total}", &reports.len().to_string())
        .replace("{lines}", &line_text)
}

fn escape_json_text(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
