//! Pathway and target-disease evidence: Reactome ContentService and Open Targets.

use crate::tools::http::{HttpSource, number_at, record, strip_markup, text_at};
use crate::tools::registry::ToolAdapter;
use crate::types::{AppError, Record, Result};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

const REACTOME_BASE: &str = "https://reactome.org/ContentService";
const OPEN_TARGETS_BASE: &str = "https://api.platform.opentargets.org/api/v4";

const OPEN_TARGETS_SEARCH: &str = r#"
query search($q: String!, $size: Int!) {
  search(queryString: $q, page: {index: 0, size: $size}) {
    hits { id name entity score }
  }
}"#;

pub struct ReactomePathways {
    source: HttpSource,
    max_items: usize,
}

impl ReactomePathways {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("reactome_pathways", REACTOME_BASE)),
            max_items: config.max_items,
        }
    }
}

/// Reactome groups hits by type; entries are flattened across groups.
pub(crate) fn parse_reactome(body: &Value) -> Vec<Record> {
    let Some(groups) = body.pointer("/results").and_then(Value::as_array) else {
        return Vec::new();
    };
    groups
        .iter()
        .filter_map(|group| group.get("entries").and_then(Value::as_array))
        .flatten()
        .map(|entry| {
            record([
                ("st_id", json!(text_at(entry, "/stId"))),
                ("name", json!(text_at(entry, "/name").map(|n| strip_markup(&n)))),
                ("species", json!(text_at(entry, "/species/0"))),
            ])
        })
        .collect()
}

#[async_trait]
impl ToolAdapter for ReactomePathways {
    fn name(&self) -> &str {
        "reactome_pathways"
    }

    fn description(&self) -> &str {
        "Search curated biological pathways in Reactome"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let body = self
            .source
            .get_json_opt(
                &["search", "query"],
                &[("query", query), ("types", "Pathway"), ("cluster", "true")],
            )
            .await?;
        let mut records = body.as_ref().map(parse_reactome).unwrap_or_default();
        records.truncate(self.max_items);
        Ok(records)
    }
}

pub struct OpenTargetsSearch {
    source: HttpSource,
    max_items: usize,
}

impl OpenTargetsSearch {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("opentargets_search", OPEN_TARGETS_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_open_targets(body: &Value) -> Result<Vec<Record>> {
    if let Some(message) = text_at(body, "/errors/0/message") {
        return Err(AppError::Tool(format!("Open Targets: {}", message)));
    }
    Ok(body
        .pointer("/data/search/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| {
                    record([
                        ("id", json!(text_at(hit, "/id"))),
                        ("name", json!(text_at(hit, "/name"))),
                        ("entity", json!(text_at(hit, "/entity"))),
                        ("score", json!(number_at(hit, "/score"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default())
}

#[async_trait]
impl ToolAdapter for OpenTargetsSearch {
    fn name(&self) -> &str {
        "opentargets_search"
    }

    fn description(&self) -> &str {
        "Search targets, diseases and drugs in the Open Targets Platform"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let payload = json!({
            "query": OPEN_TARGETS_SEARCH,
            "variables": {"q": query, "size": self.max_items},
        });
        let body = self.source.post_json(&["graphql"], &payload).await?;
        parse_open_targets(&body)
    }
}
