use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;

use super::retry::{
    is_rate_limited, retry_after, wait_with_backoff, RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES,
};
use super::TranslateFuture;
use crate::config::DeeplConfig;

const FREE_BASE_URL: &str = "https://api-free.deepl.com";
const PRO_BASE_URL: &str = "https://api.deepl.com";

#[derive(Debug, Clone)]
pub struct Deepl {
    key: String,
    source: String,
    target: String,
    base_url: String,
}

impl Deepl {
    pub fn new(source: String, target: String, config: &DeeplConfig) -> Result<Self> {
        let key = config.api_key.trim();
        if key.is_empty() {
            return Err(anyhow!(
                "DeeplTranslator requires an api_key in the configuration"
            ));
        }
        let base_url = if config.use_free_api {
            FREE_BASE_URL
        } else {
            PRO_BASE_URL
        };
        Ok(Self {
            key: key.to_string(),
            source,
            target,
            base_url: base_url.to_string(),
        })
    }

    pub(crate) fn translate(&self, text: &str) -> TranslateFuture {
        let service = self.clone();
        let text = text.to_string();
        Box::pin(async move { translate_text(service, text).await })
    }
}

async fn translate_text(service: Deepl, text: String) -> Result<String> {
    let client = reqwest::Client::new();
    let url = format!("{}/v2/translate", service.base_url);

    let mut body = json!({
        "text": [text],
        "target_lang": service.target.to_uppercase(),
    });
    // DeepL auto-detects the source language when the field is absent.
    if !service.source.trim().eq_ignore_ascii_case("auto") {
        body["source_lang"] = json!(service.source.to_uppercase());
    }

    let mut attempt = 0usize;
    let mut delay = RATE_LIMIT_BASE_DELAY;
    loop {
        attempt += 1;
        let response = client
            .post(&url)
            .header(
                "Authorization",
                format!("DeepL-Auth-Key {}", service.key),
            )
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return extract_translation(&text);
        }
        if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
            delay = wait_with_backoff("DeepL", attempt, delay, retry_after).await;
            continue;
        }
        return Err(anyhow!("DeepL API error ({}): {}", status, text));
    }
}

fn extract_translation(body: &str) -> Result<String> {
    let payload: DeeplResponse =
        serde_json::from_str(body).with_context(|| "failed to parse DeepL response JSON")?;
    payload
        .translations
        .into_iter()
        .next()
        .map(|item| item.text)
        .ok_or_else(|| anyhow!("no translation returned from DeepL"))
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    #[serde(default)]
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::{extract_translation, Deepl};
    use crate::config::DeeplConfig;

    #[test]
    fn extracts_first_translation() {
        let body = r#"{"translations":[{"detected_source_language":"ID","text":"Hello"}]}"#;
        assert_eq!(extract_translation(body).unwrap(), "Hello");
    }

    #[test]
    fn rejects_empty_translation_list() {
        assert!(extract_translation(r#"{"translations":[]}"#).is_err());
    }

    #[test]
    fn free_flag_selects_free_endpoint() {
        let config = DeeplConfig {
            api_key: "key".to_string(),
            use_free_api: true,
        };
        let service = Deepl::new("id".to_string(), "en".to_string(), &config).unwrap();
        assert!(service.base_url.contains("api-free"));
    }
}
