//! Finding synthesis: reasoning-service summary with a rule-based fallback.

use crate::llm::LLMClient;
use crate::research::domains::AgentDomainConfig;
use crate::tools::registry::{headline, truncate_chars};
use crate::types::{AppError, Result, ToolResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait SynthesisStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn synthesize(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        results: &[ToolResult],
    ) -> Result<String>;
}

pub struct LlmSynthesis {
    llm: Arc<dyn LLMClient>,
    timeout: Duration,
    max_chars: usize,
}

impl LlmSynthesis {
    pub fn new(llm: Arc<dyn LLMClient>, timeout: Duration, max_chars: usize) -> Self {
        Self {
            llm,
            timeout,
            max_chars,
        }
    }
}

#[async_trait]
impl SynthesisStrategy for LlmSynthesis {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn synthesize(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        results: &[ToolResult],
    ) -> Result<String> {
        let system = format!(
            "You are the {} investigator ({}). Write a concise, evidence-grounded finding \
             in at most {} characters. Mention only what the tool summaries support.",
            domain.domain, domain.focus, self.max_chars
        );
        let evidence: Vec<String> = results
            .iter()
            .map(|r| format!("- {}: {}", r.tool, r.summary))
            .collect();
        let prompt = format!("Topic: {}\nTool summaries:\n{}", topic, evidence.join("\n"));

        let text = tokio::time::timeout(
            self.timeout,
            self.llm.generate_with_system(&system, &prompt),
        )
        .await
        .map_err(|_| AppError::Timeout(format!("synthesis after {:?}", self.timeout)))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::LLM("empty synthesis response".to_string()));
        }
        Ok(truncate_chars(text, self.max_chars))
    }
}

/// Template text built from tool names, counts and the domain's mechanism hint.
pub struct RuleBasedSynthesis;

#[async_trait]
impl SynthesisStrategy for RuleBasedSynthesis {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn synthesize(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        results: &[ToolResult],
    ) -> Result<String> {
        Ok(self.compose(domain, topic, results))
    }
}

fn outcome(result: &ToolResult) -> String {
    match (&result.error, result.items.len()) {
        (Some(_), _) => format!("{} (failed)", result.tool),
        (None, 0) => format!("{} (no results)", result.tool),
        (None, n) => format!("{} ({} results)", result.tool, n),
    }
}

impl RuleBasedSynthesis {
    pub fn compose(
        &self,
        domain: &AgentDomainConfig,
        topic: &str,
        results: &[ToolResult],
    ) -> String {
        let outcomes: Vec<String> = results.iter().map(outcome).collect();
        let outcomes = if outcomes.is_empty() {
            "no tools".to_string()
        } else {
            outcomes.join(", ")
        };

        if !results.iter().any(ToolResult::is_useful) {
            return format!(
                "{} investigation of '{}' yielded limited results: {}. \
                 Follow-up should look at {}.",
                domain.domain, topic, outcomes, domain.mechanism_hint
            );
        }

        let leads: Vec<String> = results
            .iter()
            .filter(|r| r.is_useful())
            .filter_map(|r| r.items.first().and_then(headline))
            .take(3)
            .collect();
        format!(
            "{} investigation of '{}' drew on {}. The evidence points to {}. Leading items: {}.",
            domain.domain,
            topic,
            outcomes,
            domain.mechanism_hint,
            leads.join("; ")
        )
    }
}

/// Share of tools that produced records, mapped into `[0.1, 0.85]`.
pub fn confidence(results: &[ToolResult]) -> f64 {
    let useful = results.iter().filter(|r| r.is_useful()).count();
    if useful == 0 || results.is_empty() {
        return 0.1;
    }
    let share = useful as f64 / results.len() as f64;
    ((0.25 + 0.6 * share) * 100.0).round() / 100.0
}

/// Total synthesizer. When no tool produced records the rule-based text is used
/// directly so the finding states that results were limited.
pub struct FindingSynthesizer {
    primary: Option<Arc<dyn SynthesisStrategy>>,
    fallback: RuleBasedSynthesis,
}

impl FindingSynthesizer {
    pub fn new(primary: Option<Arc<dyn SynthesisStrategy>>) -> Self {
        Self {
            primary,
            fallback: RuleBasedSynthesis,
        }
    }

    pub fn deterministic() -> Self {
        Self::new(None)
    }

    pub async fn synthesize(
        &self,
        agent: &str,
        domain: &AgentDomainConfig,
        topic: &str,
        results: &[ToolResult],
    ) -> String {
        let any_useful = results.iter().any(ToolResult::is_useful);
        if let Some(primary) = self.primary.as_ref().filter(|_| any_useful) {
            match primary.synthesize(domain, topic, results).await {
                Ok(text) => return text,
                Err(e) => tracing::info!(
                    agent,
                    strategy = primary.name(),
                    error = %e,
                    "Synthesis fell back to rule-based text"
                ),
            }
        }
        self.fallback.compose(domain, topic, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::domains::domain;
    use crate::tools::http::record;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLlm {
        calls: AtomicUsize,
        reply: Result<String>,
    }

    #[async_trait]
    impl LLMClient for CountingLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.generate_with_system("", prompt).await
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(AppError::LLM("service down".to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    struct SilentLlm;

    #[async_trait]
    impl LLMClient for SilentLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    fn useful(tool: &str) -> ToolResult {
        ToolResult::success(
            tool,
            "1 results: DRD2".to_string(),
            vec![record([("name", json!("DRD2"))])],
        )
    }

    fn synthesizer(llm: Arc<CountingLlm>) -> FindingSynthesizer {
        FindingSynthesizer::new(Some(Arc::new(LlmSynthesis::new(
            llm,
            Duration::from_secs(15),
            40,
        ))))
    }

    #[tokio::test]
    async fn test_all_failed_is_limited_and_skips_service() {
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            reply: Ok("unused".to_string()),
        });
        let results = vec![
            ToolResult::failure("uniprot_search", "connection refused"),
            ToolResult::empty("reactome_pathways", "No results for 'x'".to_string()),
        ];
        let text = synthesizer(llm.clone())
            .synthesize("bio-agent", domain("bio").unwrap(), "dopamine", &results)
            .await;
        assert!(text.contains("yielded limited results"));
        assert!(text.contains("uniprot_search (failed)"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_service_text_is_capped() {
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            reply: Ok("D2 receptors couple to Gi/o and are the main antipsychotic target.".to_string()),
        });
        let text = synthesizer(llm)
            .synthesize("bio-agent", domain("bio").unwrap(), "dopamine", &[useful("uniprot_search")])
            .await;
        assert_eq!(text.chars().count(), 40);
    }

    #[tokio::test]
    async fn test_service_failure_falls_back() {
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            reply: Err(AppError::LLM("down".to_string())),
        });
        let text = synthesizer(llm.clone())
            .synthesize("chem-agent", domain("chem").unwrap(), "haloperidol", &[useful("pubchem_compound")])
            .await;
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(text.contains("structure-activity"));
        assert!(text.contains("DRD2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_service_falls_back_after_synthesis_timeout() {
        let synthesizer = FindingSynthesizer::new(Some(Arc::new(LlmSynthesis::new(
            Arc::new(SilentLlm),
            Duration::from_secs(15),
            600,
        ))));
        let bio = domain("bio").unwrap();
        let results = vec![useful("uniprot_search")];

        let started = tokio::time::Instant::now();
        let text = synthesizer
            .synthesize("bio-agent", bio, "dopamine", &results)
            .await;
        let waited = started.elapsed();

        assert_eq!(text, RuleBasedSynthesis.compose(bio, "dopamine", &results));
        assert!(waited >= Duration::from_secs(15) && waited < Duration::from_secs(16));
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(confidence(&[]), 0.1);
        assert_eq!(confidence(&[ToolResult::failure("a", "x")]), 0.1);
        assert_eq!(confidence(&[useful("a"), useful("b")]), 0.85);
        assert_eq!(confidence(&[useful("a"), ToolResult::failure("b", "x")]), 0.55);
    }
}
