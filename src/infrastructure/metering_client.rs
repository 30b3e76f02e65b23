// HTTP metering API repository implementation
use crate::application::metering_repository::{MeteringRepository, RawSample};
use crate::domain::telemetry::coerce_number;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HttpMeteringRepository {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl HttpMeteringRepository {
    pub fn new(host: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn history_url(&self, channel_id: &str, start_ms: i64, end_ms: i64, interval_seconds: i64) -> String {
        format!(
            "{}/feed/data.json?id={}&start={}&end={}&interval={}&apikey={}",
            self.host,
            urlencoding::encode(channel_id),
            start_ms,
            end_ms,
            interval_seconds,
            urlencoding::encode(&self.api_key)
        )
    }

    fn live_url(&self, channel_id: &str) -> String {
        format!(
            "{}/feed/value.json?id={}&apikey={}",
            self.host,
            urlencoding::encode(channel_id),
            urlencoding::encode(&self.api_key)
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to metering API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Metering API request failed with status {}: {}", status, body);
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse metering API response")
    }
}

#[async_trait]
impl MeteringRepository for HttpMeteringRepository {
    async fn fetch_history(
        &self,
        channel_id: &str,
        start_ms: i64,
        end_ms: i64,
        interval_seconds: i64,
    ) -> Result<Vec<RawSample>> {
        tracing::debug!(channel = %channel_id, start_ms, end_ms, interval_seconds, "requesting history");
        let url = self.history_url(channel_id, start_ms, end_ms, interval_seconds);
        let body = self.get_json(&url).await?;
        parse_history(&body)
    }

    async fn fetch_live(&self, channel_id: &str) -> Result<f64> {
        let body = self.get_json(&self.live_url(channel_id)).await?;
        parse_live(&body)
    }
}

/// Rows that are not `[timestamp, value, ...]` with a numeric timestamp are
/// skipped.
fn parse_history(body: &Value) -> Result<Vec<RawSample>> {
    let Some(rows) = body.as_array() else {
        anyhow::bail!("Expected an array of samples, got: {}", body);
    };

    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        let Some([timestamp, value, ..]) = row.as_array().map(Vec::as_slice) else {
            continue;
        };
        let timestamp = timestamp
            .as_i64()
            .or_else(|| timestamp.as_f64().map(|t| t as i64));
        if let Some(timestamp_seconds) = timestamp {
            samples.push(RawSample::new(timestamp_seconds, value.clone()));
        }
    }

    Ok(samples)
}

fn parse_live(body: &Value) -> Result<f64> {
    coerce_number(body).with_context(|| format!("Non-numeric live value: {}", body))
}
