use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use super::retry::{
    is_rate_limited, retry_after, wait_with_backoff, RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES,
};
use super::TranslateFuture;

const BASE_URL: &str = "https://translate.googleapis.com";

/// Free Google Translate endpoint; needs no credentials.
#[derive(Debug, Clone)]
pub struct Google {
    source: String,
    target: String,
}

impl Google {
    pub fn new(source: String, target: String) -> Self {
        Self { source, target }
    }

    pub(crate) fn translate(&self, text: &str) -> TranslateFuture {
        let service = self.clone();
        let text = text.to_string();
        Box::pin(async move { translate_text(service, text).await })
    }
}

async fn translate_text(service: Google, text: String) -> Result<String> {
    let client = reqwest::Client::new();
    let url = format!("{BASE_URL}/translate_a/single");

    let mut attempt = 0usize;
    let mut delay = RATE_LIMIT_BASE_DELAY;
    loop {
        attempt += 1;
        let response = client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", service.source.as_str()),
                ("tl", service.target.as_str()),
                ("dt", "t"),
                ("q", text.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            return extract_translation(&body);
        }
        if is_rate_limited(status, &body) && attempt < RATE_LIMIT_MAX_RETRIES {
            delay = wait_with_backoff("Google", attempt, delay, retry_after).await;
            continue;
        }
        return Err(anyhow!("Google Translate API error ({}): {}", status, body));
    }
}

/// The endpoint answers with nested arrays; the translated sentence segments
/// sit at `[0][i][0]`.
fn extract_translation(body: &str) -> Result<String> {
    let payload: Value = serde_json::from_str(body)
        .with_context(|| "failed to parse Google Translate response JSON")?;
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("no translation returned from Google Translate"))?;

    let mut translated = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            translated.push_str(part);
        }
    }
    if translated.is_empty() {
        return Err(anyhow!("empty translation returned from Google Translate"));
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::extract_translation;

    #[test]
    fn joins_sentence_segments() {
        let body = r#"[[["Hello. ","Halo. ",null,null,10],["World","Dunia",null,null,10]],null,"id"]"#;
        assert_eq!(extract_translation(body).unwrap(), "Hello. World");
    }

    #[test]
    fn rejects_payload_without_segments() {
        assert!(extract_translation("[null]").is_err());
        assert!(extract_translation("not json").is_err());
    }
}
