//! Gene, protein and interaction sources: UniProtKB, NCBI Gene and STRING.

use crate::tools::http::{HttpSource, key_term, number_at, record, text_at};
use crate::tools::literature::eutils_summaries;
use crate::tools::registry::ToolAdapter;
use crate::types::{Record, Result};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

const UNIPROT_BASE: &str = "https://rest.uniprot.org";
const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const STRING_BASE: &str = "https://string-db.org/api";

/// NCBI taxonomy id for human; STRING needs a species to resolve names.
const HUMAN_TAXON: &str = "9606";

pub struct UniProtSearch {
    source: HttpSource,
    max_items: usize,
}

impl UniProtSearch {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("uniprot_search", UNIPROT_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_uniprot(body: &Value) -> Vec<Record> {
    body.pointer("/results")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|e| {
                    let name = text_at(e, "/proteinDescription/recommendedName/fullName/value")
                        .or_else(|| {
                            text_at(e, "/proteinDescription/submissionNames/0/fullName/value")
                        });
                    record([
                        ("accession", json!(text_at(e, "/primaryAccession"))),
                        ("name", json!(name)),
                        ("gene", json!(text_at(e, "/genes/0/geneName/value"))),
                        ("organism", json!(text_at(e, "/organism/scientificName"))),
                        ("length", json!(number_at(e, "/sequence/length"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for UniProtSearch {
    fn name(&self) -> &str {
        "uniprot_search"
    }

    fn description(&self) -> &str {
        "Search reviewed and unreviewed protein entries in UniProtKB"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let size = self.max_items.to_string();
        let body = self
            .source
            .get_json(
                &["uniprotkb", "search"],
                &[
                    ("query", query),
                    ("format", "json"),
                    ("size", size.as_str()),
                    (
                        "fields",
                        "accession,protein_name,gene_names,organism_name,length",
                    ),
                ],
            )
            .await?;
        Ok(parse_uniprot(&body))
    }
}

pub struct NcbiGene {
    source: HttpSource,
    max_items: usize,
}

impl NcbiGene {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("ncbi_gene", EUTILS_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_gene_summary(doc: &Value) -> Option<Record> {
    let gene_id = text_at(doc, "/uid")?;
    let start = number_at(doc, "/genomicinfo/0/chrstart");
    let stop = number_at(doc, "/genomicinfo/0/chrstop");
    let length = match (start, stop) {
        (Some(a), Some(b)) => Some((b - a).abs() + 1.0),
        _ => None,
    };
    Some(record([
        ("gene_id", json!(gene_id)),
        ("symbol", json!(text_at(doc, "/name"))),
        ("description", json!(text_at(doc, "/description"))),
        ("chromosome", json!(text_at(doc, "/chromosome"))),
        ("length", json!(length)),
    ]))
}

#[async_trait]
impl ToolAdapter for NcbiGene {
    fn name(&self) -> &str {
        "ncbi_gene"
    }

    fn description(&self) -> &str {
        "Search human genes and genomic coordinates in NCBI Gene"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let term = format!("({}) AND \"Homo sapiens\"[Organism]", query);
        let docs = eutils_summaries(&self.source, "gene", &term, self.max_items).await?;
        Ok(docs.iter().filter_map(parse_gene_summary).collect())
    }
}

pub struct StringInteractions {
    source: HttpSource,
    max_items: usize,
}

impl StringInteractions {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("string_interactions", STRING_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_string(body: &Value) -> Vec<Record> {
    body.as_array()
        .map(|edges| {
            edges
                .iter()
                .map(|edge| {
                    let a = text_at(edge, "/preferredName_A");
                    let b = text_at(edge, "/preferredName_B");
                    let name = match (&a, &b) {
                        (Some(a), Some(b)) => Some(format!("{}–{}", a, b)),
                        _ => None,
                    };
                    record([
                        ("name", json!(name)),
                        ("partner_a", json!(a)),
                        ("partner_b", json!(b)),
                        ("score", json!(number_at(edge, "/score"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for StringInteractions {
    fn name(&self) -> &str {
        "string_interactions"
    }

    fn description(&self) -> &str {
        "Retrieve scored protein-protein interaction partners from STRING"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let identifier = key_term(query);
        let limit = self.max_items.to_string();
        let body = self
            .source
            .get_json_opt(
                &["json", "interaction_partners"],
                &[
                    ("identifiers", identifier.as_str()),
                    ("species", HUMAN_TAXON),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        Ok(body.as_ref().map(parse_string).unwrap_or_default())
    }
}
