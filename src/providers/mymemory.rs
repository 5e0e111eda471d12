use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::retry::{
    is_rate_limited, retry_after, wait_with_backoff, RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES,
};
use super::TranslateFuture;
use crate::config::MyMemoryConfig;

const BASE_URL: &str = "https://api.mymemory.translated.net";

/// MyMemory translation memory API. Passing a contact email raises the free
/// daily quota.
#[derive(Debug, Clone)]
pub struct MyMemory {
    email: String,
    source: String,
    target: String,
}

impl MyMemory {
    pub fn new(source: String, target: String, config: &MyMemoryConfig) -> Self {
        Self {
            email: config.email.trim().to_string(),
            source,
            target,
        }
    }

    pub(crate) fn translate(&self, text: &str) -> TranslateFuture {
        let service = self.clone();
        let text = text.to_string();
        Box::pin(async move { translate_text(service, text).await })
    }
}

async fn translate_text(service: MyMemory, text: String) -> Result<String> {
    let client = reqwest::Client::new();
    let url = format!("{BASE_URL}/get");
    let langpair = format!("{}|{}", service.source, service.target);

    let mut query = vec![("q", text.clone()), ("langpair", langpair)];
    if !service.email.is_empty() {
        query.push(("de", service.email.clone()));
    }

    let mut attempt = 0usize;
    let mut delay = RATE_LIMIT_BASE_DELAY;
    loop {
        attempt += 1;
        let response = client.get(&url).query(&query).send().await?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            return extract_translation(&body);
        }
        if is_rate_limited(status, &body) && attempt < RATE_LIMIT_MAX_RETRIES {
            delay = wait_with_backoff("MyMemory", attempt, delay, retry_after).await;
            continue;
        }
        return Err(anyhow!("MyMemory API error ({}): {}", status, body));
    }
}

fn extract_translation(body: &str) -> Result<String> {
    let payload: MyMemoryResponse =
        serde_json::from_str(body).with_context(|| "failed to parse MyMemory response JSON")?;
    let translated = payload
        .response_data
        .and_then(|data| data.translated_text)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("no translation returned from MyMemory"))?;
    Ok(translated)
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<MyMemoryData>,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}
