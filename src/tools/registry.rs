use crate::figures::ToolFamily;
use crate::tools::{chemistry, clinical, genomics, http, literature, pathways};
use crate::types::{Record, Result, ToolResult};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fields tried, in order, when naming a record in a summary.
const HEADLINE_FIELDS: &[&str] = &[
    "title", "name", "symbol", "brand_name", "accession", "nct_id", "pmid", "id",
];

/// Uniform wrapper around one read-only external source.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Query the source and return records in relevance order.
    async fn fetch(&self, query: &str) -> Result<Vec<Record>>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolAdapter>>,
    timeout: Duration,
    max_items: usize,
    summary_chars: usize,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(&ToolsConfig::default())
    }
}

impl ToolRegistry {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            tools: HashMap::new(),
            timeout: config.timeout(),
            max_items: config.max_items,
            summary_chars: config.summary_chars,
        }
    }

    /// Create a registry with every built-in data source
    pub fn with_default_tools(config: &ToolsConfig) -> Self {
        let mut registry = Self::new(config);
        let client = http::shared_client(config);

        registry.register(Arc::new(literature::PubMedSearch::new(client.clone(), config)));
        registry.register(Arc::new(literature::EuropePmc::new(client.clone(), config)));
        registry.register(Arc::new(literature::OpenAlexWorks::new(client.clone(), config)));
        registry.register(Arc::new(chemistry::PubChemCompound::new(client.clone(), config)));
        registry.register(Arc::new(chemistry::ChemblMolecule::new(client.clone(), config)));
        registry.register(Arc::new(genomics::UniProtSearch::new(client.clone(), config)));
        registry.register(Arc::new(genomics::NcbiGene::new(client.clone(), config)));
        registry.register(Arc::new(genomics::StringInteractions::new(client.clone(), config)));
        registry.register(Arc::new(pathways::OpenTargetsSearch::new(client.clone(), config)));
        registry.register(Arc::new(pathways::ReactomePathways::new(client.clone(), config)));
        registry.register(Arc::new(clinical::ClinicalTrials::new(client.clone(), config)));
        registry.register(Arc::new(clinical::OpenFdaLabels::new(client, config)));

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn ToolAdapter>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Run a tool by name. Never fails: unknown names, upstream errors, timeouts
    /// and adapter panics all come back as a `ToolResult`.
    pub async fn run(&self, name: &str, query: &str) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return ToolResult::unknown(name);
        };

        let started = Instant::now();
        let call = AssertUnwindSafe(tool.fetch(query)).catch_unwind();
        let outcome = tokio::time::timeout(self.timeout, call).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Err(_) => ToolResult::failure(
                name,
                format!("timed out after {}s", self.timeout.as_secs_f32()),
            ),
            Ok(Err(_)) => ToolResult::failure(name, "adapter panicked"),
            Ok(Ok(Err(e))) => ToolResult::failure(name, e.to_string()),
            Ok(Ok(Ok(mut items))) => {
                items.truncate(self.max_items);
                if items.is_empty() {
                    ToolResult::empty(name, format!("No results for '{}'", query))
                } else {
                    let summary = summarize(&items, self.summary_chars);
                    ToolResult::success(name, summary, items)
                }
            }
        };

        match &result.error {
            Some(error) => tracing::warn!(tool = name, elapsed_ms, %error, "Tool call failed"),
            None => tracing::debug!(
                tool = name,
                elapsed_ms,
                count = result.items.len(),
                "Tool call finished"
            ),
        }

        result
    }

    /// Get a list of all registered tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|tool| tool.description())
    }

    pub fn family_of(&self, name: &str) -> Option<ToolFamily> {
        ToolFamily::for_tool(name)
    }
}

/// Most salient field of a record, for summaries and justifications.
pub fn headline(record: &Record) -> Option<String> {
    HEADLINE_FIELDS.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `"<n> results: a; b; c"` truncated on a char boundary to `max_chars`.
pub fn summarize(items: &[Record], max_chars: usize) -> String {
    let names: Vec<String> = items.iter().filter_map(headline).collect();
    let summary = format!("{} results: {}", items.len(), names.join("; "));
    truncate_chars(&summary, max_chars)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
