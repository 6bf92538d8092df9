//! Clinical sources: ClinicalTrials.gov v2 and openFDA drug labels.

use crate::tools::http::{HttpSource, record, text_at};
use crate::tools::registry::ToolAdapter;
use crate::types::{Record, Result};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

const CLINICAL_TRIALS_BASE: &str = "https://clinicaltrials.gov/api/v2";
const OPENFDA_BASE: &str = "https://api.fda.gov";

pub struct ClinicalTrials {
    source: HttpSource,
    max_items: usize,
}

impl ClinicalTrials {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("clinical_trials", CLINICAL_TRIALS_BASE)),
            max_items: config.max_items,
        }
    }
}

fn strings_at(value: &Value, pointer: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_trials(body: &Value) -> Vec<Record> {
    body.pointer("/studies")
        .and_then(Value::as_array)
        .map(|studies| {
            studies
                .iter()
                .map(|study| {
                    let phases = strings_at(study, "/protocolSection/designModule/phases");
                    let phase = if phases.is_empty() {
                        "NA".to_string()
                    } else {
                        phases.join("/")
                    };
                    record([
                        (
                            "nct_id",
                            json!(text_at(study, "/protocolSection/identificationModule/nctId")),
                        ),
                        (
                            "title",
                            json!(text_at(study, "/protocolSection/identificationModule/briefTitle")),
                        ),
                        (
                            "status",
                            json!(text_at(study, "/protocolSection/statusModule/overallStatus")),
                        ),
                        ("phase", json!(phase)),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for ClinicalTrials {
    fn name(&self) -> &str {
        "clinical_trials"
    }

    fn description(&self) -> &str {
        "Search registered interventional and observational studies on ClinicalTrials.gov"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let page_size = self.max_items.to_string();
        let body = self
            .source
            .get_json(
                &["studies"],
                &[
                    ("query.term", query),
                    ("pageSize", page_size.as_str()),
                    ("format", "json"),
                ],
            )
            .await?;
        Ok(parse_trials(&body))
    }
}

pub struct OpenFdaLabels {
    source: HttpSource,
    max_items: usize,
}

impl OpenFdaLabels {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("openfda_labels", OPENFDA_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_labels(body: &Value) -> Vec<Record> {
    body.pointer("/results")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .map(|label| {
                    let routes = strings_at(label, "/openfda/route");
                    let route = (!routes.is_empty()).then(|| routes.join("/"));
                    record([
                        ("brand_name", json!(text_at(label, "/openfda/brand_name/0"))),
                        ("generic_name", json!(text_at(label, "/openfda/generic_name/0"))),
                        ("route", json!(route)),
                        ("product_type", json!(text_at(label, "/openfda/product_type/0"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for OpenFdaLabels {
    fn name(&self) -> &str {
        "openfda_labels"
    }

    fn description(&self) -> &str {
        "Search FDA structured product labels via openFDA"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let limit = self.max_items.to_string();
        // openFDA answers 404 when nothing matches.
        let body = self
            .source
            .get_json_opt(
                &["drug", "label.json"],
                &[("search", query), ("limit", limit.as_str())],
            )
            .await?;
        Ok(body.as_ref().map(parse_labels).unwrap_or_default())
    }
}
