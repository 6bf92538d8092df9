//! Tool selection: an optional reasoning service with a deterministic fallback.

use crate::llm::LLMClient;
use crate::research::domains::AgentDomainConfig;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Fewest valid names a reasoning-service answer may contain.
const MIN_SELECTED: usize = 2;

/// One way of choosing `n` tools from a domain's candidate pool.
#[async_trait]
pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn select(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        pool: &[String],
        n: usize,
    ) -> Result<Vec<String>>;
}

/// Asks the reasoning service, validating every returned name against the pool.
pub struct LlmSelection {
    llm: Arc<dyn LLMClient>,
    timeout: Duration,
}

impl LlmSelection {
    pub fn new(llm: Arc<dyn LLMClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl SelectionStrategy for LlmSelection {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn select(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        pool: &[String],
        n: usize,
    ) -> Result<Vec<String>> {
        let system = format!(
            "You plan tool use for a {} investigator focused on {}. \
             Answer with a JSON array of tool names and nothing else.",
            domain.domain, domain.focus
        );
        let prompt = format!(
            "Topic: {}\nAvailable tools: {}\nPick exactly {} tools, most useful first.",
            topic,
            pool.join(", "),
            n
        );

        let response = tokio::time::timeout(
            self.timeout,
            self.llm.generate_with_system(&system, &prompt),
        )
        .await
        .map_err(|_| AppError::Timeout(format!("tool selection after {:?}", self.timeout)))??;

        let picked = parse_tool_list(&response, pool, n);
        if picked.len() < MIN_SELECTED {
            return Err(AppError::LLM(format!(
                "only {} valid tool names in selection response",
                picked.len()
            )));
        }
        Ok(picked)
    }
}

/// First `n` entries of the pool in configured order.
pub struct PoolOrderSelection;

#[async_trait]
impl SelectionStrategy for PoolOrderSelection {
    fn name(&self) -> &'static str {
        "pool_order"
    }

    async fn select(
        &self,
        _domain: &AgentDomainConfig,
        _topic: &str,
        pool: &[String],
        n: usize,
    ) -> Result<Vec<String>> {
        Ok(pool.iter().take(n).cloned().collect())
    }
}

/// Pull tool names out of a free-form answer: a JSON array if one is present,
/// otherwise a comma or newline separated list. Names outside `pool` are dropped,
/// duplicates collapse, and at most `n` survive.
pub fn parse_tool_list(response: &str, pool: &[String], n: usize) -> Vec<String> {
    let candidates: Vec<String> = match (response.find('['), response.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Vec<String>>(&response[start..=end]).unwrap_or_default()
        }
        _ => Vec::new(),
    };
    let candidates = if candidates.is_empty() {
        response
            .split([',', '\n'])
            .map(|part| {
                part.trim()
                    .trim_start_matches(|c: char| c.is_ascii_digit() || "-*.) ".contains(c))
                    .trim_matches(|c: char| "\"'`[] ".contains(c))
                    .to_string()
            })
            .collect()
    } else {
        candidates
    };

    let mut picked: Vec<String> = Vec::new();
    for candidate in candidates {
        let Some(valid) = pool.iter().find(|tool| tool.eq_ignore_ascii_case(candidate.trim()))
        else {
            continue;
        };
        if !picked.contains(valid) {
            picked.push(valid.clone());
        }
        if picked.len() == n {
            break;
        }
    }
    picked
}

/// Total selector: tries the reasoning service when configured and falls back
/// to pool order on any failure.
pub struct ToolSelector {
    primary: Option<Arc<dyn SelectionStrategy>>,
    fallback: PoolOrderSelection,
}

impl ToolSelector {
    pub fn new(primary: Option<Arc<dyn SelectionStrategy>>) -> Self {
        Self {
            primary,
            fallback: PoolOrderSelection,
        }
    }

    pub fn deterministic() -> Self {
        Self::new(None)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map(|s| s.name())
            .unwrap_or(self.fallback.name())
    }

    pub async fn select(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        pool: &[String],
        n: usize,
    ) -> Vec<String> {
        if let Some(primary) = &self.primary {
            match primary.select(domain, topic, pool, n).await {
                Ok(tools) => return tools,
                Err(e) => tracing::info!(
                    agent = %domain.agent_name(),
                    strategy = primary.name(),
                    error = %e,
                    "Tool selection fell back to pool order"
                ),
            }
        }
        self.fallback
            .select(domain, topic, pool, n)
            .await
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::domains::domain;

    struct Scripted(&'static str);

    #[async_trait]
    impl LLMClient for Scripted {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct Hanging;

    #[async_trait]
    impl LLMClient for Hanging {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }

        fn model_name(&self) -> &str {
            "hanging"
        }
    }

    fn pool() -> Vec<String> {
        domain("bio").unwrap().candidate_pool()
    }

    #[test]
    fn test_parse_json_array_filters_and_dedupes() {
        let picked = parse_tool_list(
            r#"Sure: ["pubmed_search", "made_up", "pubmed_search", "UNIPROT_SEARCH"]"#,
            &pool(),
            3,
        );
        assert_eq!(picked, vec!["pubmed_search", "uniprot_search"]);
    }

    #[test]
    fn test_parse_plain_list() {
        let picked = parse_tool_list(
            "1. string_interactions\n2. reactome_pathways\n3. opentargets_search\n4. pubmed_search",
            &pool(),
            3,
        );
        assert_eq!(
            picked,
            vec!["string_interactions", "reactome_pathways", "opentargets_search"]
        );
    }

    #[tokio::test]
    async fn test_valid_llm_answer_is_used() {
        let llm = Arc::new(Scripted(r#"["opentargets_search", "pubmed_search", "uniprot_search"]"#));
        let selector = ToolSelector::new(Some(Arc::new(LlmSelection::new(
            llm,
            Duration::from_secs(6),
        ))));
        let tools = selector
            .select(domain("bio").unwrap(), "dopamine", &pool(), 3)
            .await;
        assert_eq!(
            tools,
            vec!["opentargets_search", "pubmed_search", "uniprot_search"]
        );
        assert_eq!(selector.strategy_name(), "llm");
    }

    #[tokio::test]
    async fn test_too_few_valid_names_falls_back() {
        let llm = Arc::new(Scripted(r#"["pubmed_search", "google", "bing"]"#));
        let selector = ToolSelector::new(Some(Arc::new(LlmSelection::new(
            llm,
            Duration::from_secs(6),
        ))));
        let tools = selector
            .select(domain("bio").unwrap(), "dopamine", &pool(), 3)
            .await;
        assert_eq!(
            tools,
            vec!["uniprot_search", "reactome_pathways", "string_interactions"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_llm_falls_back_after_selection_timeout() {
        let selector = ToolSelector::new(Some(Arc::new(LlmSelection::new(
            Arc::new(Hanging),
            Duration::from_secs(6),
        ))));
        let started = tokio::time::Instant::now();
        let tools = selector
            .select(domain("bio").unwrap(), "dopamine", &pool(), 3)
            .await;
        assert_eq!(
            tools,
            vec!["uniprot_search", "reactome_pathways", "string_interactions"]
        );
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(6) && waited < Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_fallback_takes_min_of_n_and_pool() {
        let selector = ToolSelector::deterministic();
        let lit = domain("lit").unwrap();
        let pool = lit.candidate_pool();
        let tools = selector.select(lit, "dopamine", &pool, 10).await;
        assert_eq!(tools, pool);
        assert_eq!(selector.strategy_name(), "pool_order");
    }
}
