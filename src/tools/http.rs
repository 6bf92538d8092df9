//! Shared HTTP plumbing for the tool adapters.

use crate::types::{AppError, Record, Result};
use crate::utils::toml_config::ToolsConfig;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

/// Build the single client every adapter shares.
pub fn shared_client(config: &ToolsConfig) -> Client {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// One upstream endpoint: a client plus a base URL.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Tool(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Tool(format!("Base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document, treating any non-success status as an error.
    pub async fn get_json(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value> {
        self.get_json_opt(segments, query).await?.ok_or_else(|| {
            AppError::Tool(format!("{} returned 404", self.base_url))
        })
    }

    /// GET a JSON document; `404 Not Found` means "no matches" and yields `None`.
    pub async fn get_json_opt(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let url = self.url(segments)?;
        let response = self.client.get(url).query(query).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json::<Value>().await?))
    }

    pub async fn post_json(&self, segments: &[&str], body: &Value) -> Result<Value> {
        let url = self.url(segments)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

/// String at a JSON pointer, accepting numbers as text.
pub fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Number at a JSON pointer, accepting numeric strings (several APIs quote their floats).
pub fn number_at(value: &Value, pointer: &str) -> Option<f64> {
    match value.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build a record from `(key, value)` pairs, skipping nulls so keys stay meaningful.
pub fn record<I>(fields: I) -> Record
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    fields
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Remove inline markup such as Reactome's `<span class="highlighting">` wrappers.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

const GENERIC_TERMS: &[&str] = &[
    "the", "and", "for", "with", "role", "roles", "effect", "effects", "mechanism",
    "mechanisms", "signaling", "signalling", "pathway", "pathways", "receptor", "receptors",
    "disease", "diseases", "therapy", "treatment", "function", "regulation", "in", "of", "on",
];

/// First specific word of a free-text topic, for identifier-style lookups.
pub fn key_term(query: &str) -> String {
    query
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .find(|word| word.len() >= 3 && !GENERIC_TERMS.contains(&word.to_lowercase().as_str()))
        .unwrap_or(query.trim())
        .to_string()
}
