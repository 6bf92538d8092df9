//! Cross-domain reaction to peer findings.

use crate::research::domains::AgentDomainConfig;
use crate::tools::registry::headline;
use crate::types::ToolResult;
use crate::utils::toml_config::SessionConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::time::Duration;

/// Outcome of checking one peer finding against this domain's own evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub should_challenge: bool,
    pub justification: String,
    /// Trigger phrase that fired, if any.
    pub trigger: Option<&'static str>,
}

pub struct PeerAnalyzer;

impl PeerAnalyzer {
    /// Challenge when the peer's text uses one of this domain's trigger phrases,
    /// citing up to two of this domain's own results. Otherwise stay neutral and
    /// let the reaction policy decide about agreement.
    pub fn evaluate(
        domain: &AgentDomainConfig,
        own_results: &[ToolResult],
        peer_text: &str,
    ) -> Verdict {
        let lowered = peer_text.to_lowercase();
        let Some(trigger) = domain
            .triggers
            .iter()
            .copied()
            .find(|phrase| lowered.contains(phrase))
        else {
            return Verdict {
                should_challenge: false,
                justification: String::new(),
                trigger: None,
            };
        };

        let justification = format!(
            "{} view: the claim involving '{}' is not something our evidence settles. {}",
            domain.domain,
            trigger,
            cite_own_results(own_results)
        );
        Verdict {
            should_challenge: true,
            justification,
            trigger: Some(trigger),
        }
    }

    /// Agreement text naming terms shared between the peer and our own summaries.
    pub fn agreement(domain: &AgentDomainConfig, own_results: &[ToolResult], peer_text: &str) -> String {
        let peer_terms = terms(peer_text);
        let own_terms: BTreeSet<String> = own_results
            .iter()
            .flat_map(|r| terms(&r.summary))
            .collect();
        let shared: Vec<String> = peer_terms.intersection(&own_terms).take(3).cloned().collect();

        if shared.is_empty() {
            format!(
                "{} results are consistent with this finding.",
                domain.domain
            )
        } else {
            format!(
                "{} data corroborates the points on {}.",
                domain.domain,
                shared.join(", ")
            )
        }
    }
}

/// Best two own results, most records first, each named with an example item.
fn cite_own_results(results: &[ToolResult]) -> String {
    let mut ranked: Vec<&ToolResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.items.len().cmp(&a.items.len()));

    let cited: Vec<String> = ranked
        .iter()
        .take(2)
        .map(|r| match r.items.first().and_then(headline) {
            Some(example) if r.error.is_none() => {
                format!("{} returned {} records (e.g. {})", r.tool, r.items.len(), example)
            }
            _ => format!("{} returned no supporting records", r.tool),
        })
        .collect();

    if cited.is_empty() {
        "No tool results of our own bear on it.".to_string()
    } else {
        format!("Our {}.", cited.join("; "))
    }
}

/// Lowercase words of five or more letters.
fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 5)
        .map(str::to_lowercase)
        .collect()
}

/// How often a neutral verdict turns into an agreement, and where the dice come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionPolicy {
    pub agreement_probability: f64,
    pub seed: Option<u64>,
}

impl ReactionPolicy {
    pub fn new(agreement_probability: f64, seed: Option<u64>) -> Self {
        let agreement_probability = if agreement_probability.is_finite() {
            agreement_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            agreement_probability,
            seed,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.agreement_probability, config.reaction_seed)
    }

    /// Per-agent generator: `seed + index` when seeded, OS entropy otherwise.
    pub fn rng_for(&self, agent_index: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(agent_index as u64)),
            None => StdRng::from_os_rng(),
        }
    }

    pub fn roll_agreement(&self, rng: &mut StdRng) -> bool {
        rng.random_bool(self.agreement_probability)
    }
}

impl Default for ReactionPolicy {
    fn default() -> Self {
        Self::new(0.35, None)
    }
}

/// Inter-event delay during peer reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            Duration::from_millis(config.pacing_min_ms),
            Duration::from_millis(config.pacing_max_ms),
        )
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    pub fn draw(&self, rng: &mut StdRng) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    pub async fn pause(&self, rng: &mut StdRng) {
        if self.is_disabled() {
            return;
        }
        tokio::time::sleep(self.draw(rng)).await;
    }
}
