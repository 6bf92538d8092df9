//! Compound databases: PubChem PUG-REST and ChEMBL.
//!
//! Both normalize a numeric `molecular_weight` (Da) for the weight histogram.

use crate::tools::http::{HttpSource, key_term, number_at, record, text_at};
use crate::tools::registry::ToolAdapter;
use crate::types::{Record, Result};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

const PUBCHEM_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
const CHEMBL_BASE: &str = "https://www.ebi.ac.uk/chembl/api/data";

const PUBCHEM_PROPERTIES: &str = "Title,MolecularFormula,MolecularWeight,XLogP";

pub struct PubChemCompound {
    source: HttpSource,
}

impl PubChemCompound {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("pubchem_compound", PUBCHEM_BASE)),
        }
    }
}

pub(crate) fn parse_pubchem(body: &Value) -> Vec<Record> {
    body.pointer("/PropertyTable/Properties")
        .and_then(Value::as_array)
        .map(|props| {
            props
                .iter()
                .map(|p| {
                    record([
                        ("cid", json!(text_at(p, "/CID"))),
                        ("name", json!(text_at(p, "/Title"))),
                        ("formula", json!(text_at(p, "/MolecularFormula"))),
                        ("molecular_weight", json!(number_at(p, "/MolecularWeight"))),
                        ("xlogp", json!(number_at(p, "/XLogP"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for PubChemCompound {
    fn name(&self) -> &str {
        "pubchem_compound"
    }

    fn description(&self) -> &str {
        "Look up compounds and physicochemical properties in PubChem"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let term = key_term(query);
        let body = self
            .source
            .get_json_opt(
                &["compound", "name", term.as_str(), "property", PUBCHEM_PROPERTIES, "JSON"],
                &[],
            )
            .await?;
        Ok(body.as_ref().map(parse_pubchem).unwrap_or_default())
    }
}

pub struct ChemblMolecule {
    source: HttpSource,
    max_items: usize,
}

impl ChemblMolecule {
    pub fn new(client: Client, config: &ToolsConfig) -> Self {
        Self {
            source: HttpSource::new(client, config.endpoint("chembl_molecule", CHEMBL_BASE)),
            max_items: config.max_items,
        }
    }
}

pub(crate) fn parse_chembl(body: &Value) -> Vec<Record> {
    body.pointer("/molecules")
        .and_then(Value::as_array)
        .map(|molecules| {
            molecules
                .iter()
                .map(|m| {
                    record([
                        ("chembl_id", json!(text_at(m, "/molecule_chembl_id"))),
                        ("name", json!(text_at(m, "/pref_name"))),
                        (
                            "molecular_weight",
                            json!(number_at(m, "/molecule_properties/full_mwt")),
                        ),
                        ("alogp", json!(number_at(m, "/molecule_properties/alogp"))),
                        ("max_phase", json!(number_at(m, "/max_phase"))),
                    ])
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ToolAdapter for ChemblMolecule {
    fn name(&self) -> &str {
        "chembl_molecule"
    }

    fn description(&self) -> &str {
        "Search ChEMBL molecules with development phase and properties"
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let limit = self.max_items.to_string();
        let body = self
            .source
            .get_json(
                &["molecule", "search.json"],
                &[("q", query), ("limit", limit.as_str())],
            )
            .await?;
        Ok(parse_chembl(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_pubchem_quoted_weight() {
        let body = json!({"PropertyTable": {"Properties": [
            {"CID": 681, "Title": "Dopamine", "MolecularFormula": "C8H11NO2",
             "MolecularWeight": "153.18", "XLogP": -1}
        ]}});
        let records = parse_pubchem(&body);
        assert_eq!(records[0]["cid"], "681");
        assert_eq!(records[0]["name"], "Dopamine");
        assert_eq!(records[0]["molecular_weight"], 153.18);
    }

    #[test]
    fn test_parse_chembl_missing_name() {
        let body = json!({"molecules": [
            {"molecule_chembl_id": "CHEMBL59", "pref_name": null, "max_phase": "4.0",
             "molecule_properties": {"full_mwt": "153.18", "alogp": "-0.98"}}
        ]});
        let records = parse_chembl(&body);
        assert_eq!(records[0]["chembl_id"], "CHEMBL59");
        assert!(!records[0].contains_key("name"));
        assert_eq!(records[0]["max_phase"], 4.0);
    }

    #[tokio::test]
    async fn test_pubchem_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compound/name/dopamine/property/Title,MolecularFormula,MolecularWeight,XLogP/JSON"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "Fault": {"Code": "PUGREST.NotFound"}
            })))
            .mount(&server)
            .await;

        let mut config = ToolsConfig::default();
        config
            .endpoints
            .insert("pubchem_compound".to_string(), server.uri());
        let tool = PubChemCompound::new(Client::new(), &config);

        let records = tool.fetch("dopamine receptor signaling").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_chembl_server_error_is_err() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut config = ToolsConfig::default();
        config
            .endpoints
            .insert("chembl_molecule".to_string(), server.uri());
        let tool = ChemblMolecule::new(Client::new(), &config);

        assert!(tool.fetch("haloperidol").await.is_err());
    }
}
