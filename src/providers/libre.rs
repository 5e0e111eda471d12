use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::retry::{
    is_rate_limited, retry_after, wait_with_backoff, RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES,
};
use super::TranslateFuture;
use crate::config::LibreConfig;

const FREE_BASE_URL: &str = "https://libretranslate.de";
const BASE_URL: &str = "https://libretranslate.com";

#[derive(Debug, Clone)]
pub struct Libre {
    key: String,
    source: String,
    target: String,
    base_url: String,
}

impl Libre {
    pub fn new(source: String, target: String, config: &LibreConfig) -> Self {
        let base_url = if !config.custom_url.trim().is_empty() {
            config.custom_url.trim().trim_end_matches('/').to_string()
        } else if config.use_free_api {
            FREE_BASE_URL.to_string()
        } else {
            BASE_URL.to_string()
        };
        Self {
            key: config.api_key.trim().to_string(),
            source,
            target,
            base_url,
        }
    }

    pub(crate) fn translate(&self, text: &str) -> TranslateFuture {
        let service = self.clone();
        let text = text.to_string();
        Box::pin(async move { translate_text(service, text).await })
    }
}

async fn translate_text(service: Libre, text: String) -> Result<String> {
    let client = reqwest::Client::new();
    let url = format!("{}/translate", service.base_url);

    let mut body = json!({
        "q": text,
        "source": service.source,
        "target": service.target,
        "format": "text",
    });
    if !service.key.is_empty() {
        body["api_key"] = json!(service.key);
    }

    let mut attempt = 0usize;
    let mut delay = RATE_LIMIT_BASE_DELAY;
    loop {
        attempt += 1;
        let response = client.post(&url).json(&body).send().await?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return extract_translation(&text);
        }
        if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
            delay = wait_with_backoff("LibreTranslate", attempt, delay, retry_after).await;
            continue;
        }
        return Err(anyhow!("LibreTranslate API error ({}): {}", status, text));
    }
}

fn extract_translation(body: &str) -> Result<String> {
    let payload: LibreResponse = serde_json::from_str(body)
        .with_context(|| "failed to parse LibreTranslate response JSON")?;
    payload
        .translated_text
        .ok_or_else(|| anyhow!("no translation returned from LibreTranslate"))
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}
