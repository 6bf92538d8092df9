//! Static investigator specializations and session roster resolution.

use crate::types::{DomainSummary, SessionMode};
use serde::Serialize;

/// One investigator specialization. Defined at process start, never mutated.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AgentDomainConfig {
    pub suffix: &'static str,
    pub domain: &'static str,
    pub focus: &'static str,
    pub tool_pool: &'static [&'static str],
    /// Ordered subset of `tool_pool` tried first.
    pub default_tools: &'static [&'static str],
    /// Lowercase phrases that make this domain challenge a peer's finding.
    #[serde(skip)]
    pub triggers: &'static [&'static str],
    #[serde(skip)]
    pub mechanism_hint: &'static str,
}

pub static DOMAINS: [AgentDomainConfig; 5] = [
    AgentDomainConfig {
        suffix: "bio",
        domain: "Biology",
        focus: "proteins, pathways, interaction networks",
        tool_pool: &[
            "uniprot_search",
            "reactome_pathways",
            "string_interactions",
            "opentargets_search",
            "pubmed_search",
        ],
        default_tools: &["uniprot_search", "reactome_pathways", "string_interactions"],
        triggers: &["compound", "ic50", "binding affinity", "molecular weight", "dosage", "logp"],
        mechanism_hint: "protein-level interactions and pathway membership",
    },
    AgentDomainConfig {
        suffix: "chem",
        domain: "Chemistry",
        focus: "compounds, physicochemical properties, bioactivity",
        tool_pool: &[
            "pubchem_compound",
            "chembl_molecule",
            "opentargets_search",
            "pubmed_search",
        ],
        default_tools: &["pubchem_compound", "chembl_molecule"],
        triggers: &["gene expression", "pathway", "protein interaction", "knockout", "in vivo"],
        mechanism_hint: "structure-activity relationships and physicochemical properties",
    },
    AgentDomainConfig {
        suffix: "gen",
        domain: "Genomics",
        focus: "genes, loci, sequence-level evidence",
        tool_pool: &[
            "ncbi_gene",
            "uniprot_search",
            "string_interactions",
            "europe_pmc",
        ],
        default_tools: &["ncbi_gene", "uniprot_search"],
        triggers: &["compound", "ic50", "dose", "patients", "efficacy"],
        mechanism_hint: "gene-level variation and locus context",
    },
    AgentDomainConfig {
        suffix: "clin",
        domain: "Clinical",
        focus: "human trials, approved-product labeling",
        tool_pool: &[
            "clinical_trials",
            "openfda_labels",
            "pubmed_search",
            "europe_pmc",
        ],
        default_tools: &["clinical_trials", "openfda_labels"],
        triggers: &["in vitro", "ic50", "cell line", "mouse", "murine", "binding"],
        mechanism_hint: "trial-stage evidence and approved labeling",
    },
    AgentDomainConfig {
        suffix: "lit",
        domain: "Literature",
        focus: "publication trends and citation weight",
        tool_pool: &["europe_pmc", "openalex_works", "pubmed_search"],
        default_tools: &["europe_pmc", "openalex_works"],
        triggers: &["novel", "breakthrough", "proves", "definitive", "first ever", "unprecedented"],
        mechanism_hint: "publication volume and citation trends",
    },
];

impl AgentDomainConfig {
    pub fn agent_name(&self) -> String {
        format!("{}-agent", self.suffix)
    }

    /// Defaults first, then the rest of the pool in table order.
    pub fn candidate_pool(&self) -> Vec<String> {
        let rest = self
            .tool_pool
            .iter()
            .filter(|tool| !self.default_tools.contains(*tool));
        self.default_tools
            .iter()
            .chain(rest)
            .map(|tool| tool.to_string())
            .collect()
    }

    pub fn summary(&self) -> DomainSummary {
        DomainSummary {
            agent: self.agent_name(),
            suffix: self.suffix.to_string(),
            domain: self.domain.to_string(),
            focus: self.focus.to_string(),
            tool_pool: self.tool_pool.iter().map(|t| t.to_string()).collect(),
            default_tools: self.default_tools.iter().map(|t| t.to_string()).collect(),
        }
    }
}

pub fn domain(suffix: &str) -> Option<&'static AgentDomainConfig> {
    DOMAINS.iter().find(|d| d.suffix == suffix)
}

fn mode_suffixes(mode: SessionMode) -> &'static [&'static str] {
    match mode {
        SessionMode::Broad => &["bio", "chem", "gen", "clin", "lit"],
        SessionMode::Molecular => &["bio", "chem", "gen"],
        SessionMode::Translational => &["clin", "chem", "bio"],
        SessionMode::Evidence => &["lit", "clin", "gen"],
    }
}

/// Participating domains for a mode. An override `k` takes the first `k` mode
/// domains and, past the mode's size, continues with the remaining domains in
/// table order. The count is clamped to `[1, max_participants]`.
pub fn resolve(
    mode: SessionMode,
    participants: Option<usize>,
    max_participants: usize,
) -> Vec<&'static AgentDomainConfig> {
    let preferred = mode_suffixes(mode);
    let ordered: Vec<&'static AgentDomainConfig> = preferred
        .iter()
        .filter_map(|suffix| domain(suffix))
        .chain(DOMAINS.iter().filter(|d| !preferred.contains(&d.suffix)))
        .collect();

    let cap = max_participants.max(1);
    let count = participants.unwrap_or(preferred.len()).clamp(1, cap);
    ordered.into_iter().take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_subset_of_pool() {
        for d in &DOMAINS {
            assert!(d.default_tools.len() >= 2, "{} needs two defaults", d.suffix);
            for tool in d.default_tools {
                assert!(d.tool_pool.contains(tool), "{} not in {} pool", tool, d.suffix);
            }
            for tool in d.tool_pool {
                assert!(crate::tools::KNOWN_TOOLS.contains(tool), "unknown tool {}", tool);
            }
        }
    }

    #[test]
    fn test_candidate_pool_order() {
        let bio = domain("bio").unwrap();
        assert_eq!(
            bio.candidate_pool(),
            vec![
                "uniprot_search",
                "reactome_pathways",
                "string_interactions",
                "opentargets_search",
                "pubmed_search",
            ]
        );
        assert_eq!(bio.agent_name(), "bio-agent");
    }

    #[rstest]
    #[case(SessionMode::Broad, None, vec!["bio", "chem", "gen", "clin", "lit"])]
    #[case(SessionMode::Molecular, None, vec!["bio", "chem", "gen"])]
    #[case(SessionMode::Translational, Some(2), vec!["clin", "chem"])]
    #[case(SessionMode::Evidence, Some(4), vec!["lit", "clin", "gen", "bio"])]
    #[case(SessionMode::Molecular, Some(0), vec!["bio"])]
    #[case(SessionMode::Broad, Some(50), vec!["bio", "chem", "gen", "clin", "lit"])]
    fn test_resolve(
        #[case] mode: SessionMode,
        #[case] participants: Option<usize>,
        #[case] expected: Vec<&str>,
    ) {
        let suffixes: Vec<&str> = resolve(mode, participants, 5)
            .iter()
            .map(|d| d.suffix)
            .collect();
        assert_eq!(suffixes, expected);
    }

    #[test]
    fn test_resolve_respects_max_participants() {
        assert_eq!(resolve(SessionMode::Broad, None, 2).len(), 2);
        assert_eq!(resolve(SessionMode::Broad, Some(3), 0).len(), 1);
    }
}
