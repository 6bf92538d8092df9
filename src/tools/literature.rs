//! Bibliographic sources: PubMed (NCBI E-utilities), Europe PMC and OpenAlex.
//!
//! All three emit a `year` field so their results feed the publication histogram.

use crate::tools::http::{HttpSource, number_at, record, text_at};
use crate::tools::registry::ToolAdapter;
use crate::types::{Record, Result};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const EUROPE_PMC_BASE: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest";
const OPENALEX_BASE: &str = "https://api.openalex.org";

/// esearch then esummary against an E-utilities database. Returns the summary
/// documents in esearch rank order.
pub(crate) async fn eutils_summaries(
    source: &HttpSource,
    db: &str,
    term: &str,
    retmax: usize,
) -> Result<Vec<Value>> {
    let retmax = retmax.to_string();
    let search = source
        .get_json(
            &["esearch.fcgi"],
            &[("db", db), ("term", term), ("retmax", retmax.as_str()), ("retmode", "json")],
        )
        .await?;

    let ids: Vec<String> = search
        .pointer("/esearchresult/idlist")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let joined = ids.join(",");
    let summary = source
        .get_json(
            &["esummary.fcgi"],
            &[("db", db), ("id", joined.as_str()), ("retmode", "json")],
        )
        .await?;

    Ok(ids
        .iter()
        .filter_map(|id| summary.pointer(&format!("/result/{}", id)).cloned())
        .collect())
}

pub struct PubMedSearch {
    source: HttpSource,
    max_items: usize,
}

impl PubMedSearch {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("pubmed_search", EUTILS_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_pubmed_summary(doc: &Value) -> Option<Record> {
    let pmid = text_at(doc, "/uid")?;
    Some(record([
        ("pmid", json!(pmid)),
        ("title", json!(text_at(doc, "/title"))),
        (
            "journal",
            json!(text_at(doc, "/fulljournalname").or_else(|| text_at(doc, "/source"))),
        ),
        ("year", json!(text_at(doc, "/pubdate"))),
    ]))
}

#[async_trait]
impl ToolAdapter for PubMedSearch {
    fn name(&self) -> &str {
        "pubmed_search"
    }

    fn description(&self) -> &str {
        "Search PubMed citations via NCBI E-utilities"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let docs = eutils_summaries(&self.source, "pubmed", query, self.max_items).await?;
        Ok(docs.iter().filter_map(parse_pubmed_summary).collect())
    }
}

pub struct EuropePmc {
    source: HttpSource,
    max_items: usize,
}

impl EuropePmc {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("europe_pmc", EUROPE_PMC_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_europe_pmc(body: &Value) -> Vec<Record> {
    body.pointer("/resultList/result")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .map(|r| {
                    record([
                        ("id", json!(text_at(r, "/id"))),
                        ("title", json!(text_at(r, "/title"))),
                        ("journal", json!(text_at(r, "/journalTitle"))),
                        ("year", json!(text_at(r, "/pubYear"))),
                        ("cited_by", json!(number_at(r, "/citedByCount"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for EuropePmc {
    fn name(&self) -> &str {
        "europe_pmc"
    }

    fn description(&self) -> &str {
        "Search Europe PMC for articles and preprints"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let page_size = self.max_items.to_string();
        let body = self
            .source
            .get_json(
                &["search"],
                &[
                    ("query", query),
                    ("format", "json"),
                    ("resultType", "lite"),
                    ("pageSize", page_size.as_str()),
                ],
            )
            .await?;
        Ok(parse_europe_pmc(&body))
    }
}

pub struct OpenAlexWorks {
    source: HttpSource,
    max_items: usize,
}

impl OpenAlexWorks {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("openalex_works", OPENALEX_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_openalex(body: &Value) -> Vec<Record> {
    body.pointer("/results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .map(|w| {
                    record([
                        ("id", json!(text_at(w, "/id"))),
                        ("title", json!(text_at(w, "/display_name"))),
                        (
                            "journal",
                            json!(text_at(w, "/primary_location/source/display_name")),
                        ),
                        ("year", json!(text_at(w, "/publication_year"))),
                        ("cited_by", json!(number_at(w, "/cited_by_count"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for OpenAlexWorks {
    fn name(&self) -> &str {
        "openalex_works"
    }

    fn description(&self) -> &str {
        "Search scholarly works and citation counts in OpenAlex"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let per_page = self.max_items.to_string();
        let body = self
            .source
            .get_json(&["works"], &[("search", query), ("per-page", per_page.as_str())])
            .await?;
        Ok(parse_openalex(&body))
    }
}
