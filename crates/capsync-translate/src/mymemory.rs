//! MyMemory translation API client.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use capsync_models::LanguagePair;

use crate::error::{TranslateError, TranslateResult};
use crate::translator::Translator;

pub const DEFAULT_MYMEMORY_ENDPOINT: &str = "https://api.mymemory.translated.net/get";

/// Configuration for the MyMemory client.
#[derive(Debug, Clone)]
pub struct MyMemoryConfig {
    /// Full URL of the `get` endpoint
    pub endpoint: String,
    /// Language the captions are spoken in
    pub source_language: String,
    /// Contact address; raises the anonymous daily quota
    pub email: Option<String>,
    pub timeout: Duration,
}

impl Default for MyMemoryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MYMEMORY_ENDPOINT.to_string(),
            source_language: "en".to_string(),
            email: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    #[serde(default)]
    response_data: Option<ResponseData>,
    /// Number on success, sometimes a string on errors
    #[serde(default)]
    response_status: Value,
    #[serde(default)]
    response_details: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    #[serde(default)]
    translated_text: Option<String>,
}

fn status_code(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Client for the MyMemory `get` endpoint.
pub struct MyMemoryTranslator {
    http: Client,
    config: MyMemoryConfig,
}

impl MyMemoryTranslator {
    pub fn new(config: MyMemoryConfig) -> TranslateResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Translate one text, surfacing every failure.
    pub async fn request(&self, text: &str, target_language: &str) -> TranslateResult<String> {
        let langpair = LanguagePair::new(&self.config.source_language, target_language).as_langpair();
        let mut query = vec![("q", text), ("langpair", langpair.as_str())];
        if let Some(email) = self.config.email.as_deref() {
            query.push(("de", email));
        }

        debug!(langpair = %langpair, chars = text.chars().count(), "Requesting translation");

        let response = self.http.get(&self.config.endpoint).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::HttpStatus(status.as_u16()));
        }

        let body: MyMemoryResponse = response.json().await?;
        if status_code(&body.response_status) != Some(200) {
            let details = match &body.response_details {
                Value::String(s) => s.clone(),
                Value::Null => "Translation failed".to_string(),
                other => other.to_string(),
            };
            return Err(TranslateError::rejected(body.response_status.to_string(), details));
        }

        body.response_data
            .and_then(|d| d.translated_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(TranslateError::Empty)
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Option<String> {
        match self.request(text, target_language).await {
            Ok(translation) => Some(translation),
            Err(e) => {
                counter!("capsync_translation_failures_total").increment(1);
                warn!(error = %e, "Translation failed, leaving caption untranslated");
                None
            }
        }
    }
}
