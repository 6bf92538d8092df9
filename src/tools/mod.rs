//! Read-only Scientific Data Sources
//!
//! Every external source is wrapped in a [`ToolAdapter`](crate::tools::registry::ToolAdapter)
//! that normalizes its response into ordered records. The
//! [`ToolRegistry`](crate::tools::registry::ToolRegistry) is the only entry point the
//! agents use; it bounds each call with a timeout and folds every failure into a
//! [`ToolResult`](crate::types::ToolResult), so nothing crosses the adapter boundary as an error.
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - Adapter trait, registry and summary building
//! - [`http`](crate::tools::http) - Shared HTTP plumbing and JSON helpers
//! - [`literature`](crate::tools::literature) - PubMed, Europe PMC, OpenAlex
//! - [`chemistry`](crate::tools::chemistry) - PubChem, ChEMBL
//! - [`genomics`](crate::tools::genomics) - UniProt, NCBI Gene, STRING
//! - [`clinical`](crate::tools::clinical) - ClinicalTrials.gov, openFDA
//! - [`pathways`](crate::tools::pathways) - Reactome, Open Targets
//!
//! # Example
//!
//! ```ignore
//! let registry = ToolRegistry::with_default_tools(&config.tools);
//! let result = registry.run("europe_pmc", "dopamine receptor signaling").await;
//! println!("{}", result.summary);
//! ```

/// Compound databases.
pub mod chemistry;
/// Trial registries and drug labeling.
pub mod clinical;
/// Gene, protein and interaction databases.
pub mod genomics;
/// Shared HTTP client and response helpers.
pub mod http;
/// Bibliographic sources.
pub mod literature;
/// Pathway and target-association sources.
pub mod pathways;
/// Tool adapter trait and registry.
pub mod registry;

pub use registry::{ToolAdapter, ToolRegistry};

/// Every tool name the default registry provides.
pub const KNOWN_TOOLS: &[&str] = &[
    "pubmed_search",
    "europe_pmc",
    "openalex_works",
    "pubchem_compound",
    "chembl_molecule",
    "uniprot_search",
    "ncbi_gene",
    "string_interactions",
    "opentargets_search",
    "clinical_trials",
    "openfda_labels",
    "reactome_pathways",
];
