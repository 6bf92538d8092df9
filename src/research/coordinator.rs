use crate::figures::Figure;
use crate::research::agent::{AgentOutcome, AgentTask, SessionContext};
use crate::research::domains::{self, AgentDomainConfig};
use crate::research::events::EventSink;
use crate::research::log::PeerFindingLog;
use crate::research::peer::{Pacing, ReactionPolicy};
use crate::research::selector::ToolSelector;
use crate::research::synthesis::FindingSynthesizer;
use crate::tools::ToolRegistry;
use crate::types::{AppError, CollabEvent, EventType, Finding, Result, SessionMode, StartSessionRequest};
use crate::utils::toml_config::SessionConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Name used on lifecycle events that no single agent owns.
pub const ORCHESTRATOR: &str = "orchestrator";

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub topic: String,
    pub mode: SessionMode,
    pub domains: Vec<&'static AgentDomainConfig>,
    pub started_at: DateTime<Utc>,
}

/// Everything a finished session produced, for hand-off to an archive.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session: Session,
    pub findings: Vec<Finding>,
    pub tools_used: Vec<String>,
    pub figures: Vec<Figure>,
}

pub struct SessionOrchestrator {
    registry: Arc<ToolRegistry>,
    selector: Arc<ToolSelector>,
    synthesizer: Arc<FindingSynthesizer>,
    policy: ReactionPolicy,
    pacing: Pacing,
    tools_per_agent: usize,
    max_participants: usize,
}

impl SessionOrchestrator {
    pub fn new(
        registry: Arc<ToolRegistry>,
        selector: Arc<ToolSelector>,
        synthesizer: Arc<FindingSynthesizer>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            registry,
            selector,
            synthesizer,
            policy: ReactionPolicy::from_config(config),
            pacing: Pacing::from_config(config),
            tools_per_agent: config.tools_per_agent,
            max_participants: config.max_participants,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_policy(mut self, policy: ReactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Validate a start request and fix the participant roster.
    pub fn plan(&self, request: &StartSessionRequest) -> Result<Session> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidInput("topic must not be empty".to_string()));
        }
        Ok(Session {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            mode: request.mode,
            domains: domains::resolve(request.mode, request.participants, self.max_participants),
            started_at: Utc::now(),
        })
    }

    /// Run every agent of the session concurrently and wait for all of them.
    ///
    /// Emits one `session_start` status before any agent starts and exactly one
    /// `session_done` after the last agent finishes.
    pub async fn run(&self, session: Session, sink: EventSink) -> SessionReport {
        let roster: Vec<_> = session
            .domains
            .iter()
            .map(|d| json!({ "agent": d.agent_name(), "domain": d.domain, "focus": d.focus }))
            .collect();
        sink.emit(
            CollabEvent::new(EventType::AgentStatus, ORCHESTRATOR).with_payload(json!({
                "status": "session_start",
                "session_id": session.id,
                "topic": session.topic,
                "mode": session.mode,
                "participants": roster,
            })),
        );
        tracing::info!(
            session_id = %session.id,
            topic = %session.topic,
            mode = session.mode.as_str(),
            participants = session.domains.len(),
            "Session started"
        );

        let log = Arc::new(PeerFindingLog::new());
        let ctx = Arc::new(SessionContext {
            registry: self.registry.clone(),
            selector: self.selector.clone(),
            synthesizer: self.synthesizer.clone(),
            log: log.clone(),
            sink: sink.clone(),
            policy: self.policy,
            pacing: self.pacing,
            tools_per_agent: self.tools_per_agent,
        });

        let mut set = JoinSet::new();
        for (index, domain) in session.domains.iter().copied().enumerate() {
            let task = AgentTask::new(domain, index, session.topic.clone(), ctx.clone());
            set.spawn(task.run());
        }

        let mut outcomes: Vec<AgentOutcome> = Vec::with_capacity(session.domains.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(session_id = %session.id, error = %e, "Agent task aborted"),
            }
        }

        let findings = log.snapshot().to_vec();
        sink.emit(
            CollabEvent::new(EventType::SessionDone, ORCHESTRATOR).with_payload(json!({
                "session_id": session.id,
                "finding_count": findings.len(),
            })),
        );
        tracing::info!(
            session_id = %session.id,
            findings = findings.len(),
            elapsed_ms = (Utc::now() - session.started_at).num_milliseconds(),
            "Session finished"
        );

        // Stable report order regardless of completion order.
        outcomes.sort_by_key(|o| {
            session
                .domains
                .iter()
                .position(|d| d.agent_name() == o.agent)
                .unwrap_or(usize::MAX)
        });
        let mut tools_used: Vec<String> = Vec::new();
        let mut figures = Vec::new();
        for outcome in outcomes {
            for tool in outcome.tools_used {
                if !tools_used.contains(&tool) {
                    tools_used.push(tool);
                }
            }
            figures.extend(outcome.figures);
        }

        SessionReport {
            session,
            findings,
            tools_used,
            figures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::ToolsConfig;

    fn orchestrator() -> SessionOrchestrator {
        SessionOrchestrator::new(
            Arc::new(ToolRegistry::new(&ToolsConfig::default())),
            Arc::new(ToolSelector::deterministic()),
            Arc::new(FindingSynthesizer::deterministic()),
            &SessionConfig::default(),
        )
        .with_pacing(Pacing::none())
    }

    #[test]
    fn test_plan_rejects_blank_topic() {
        let request = StartSessionRequest {
            topic: "   ".to_string(),
            mode: SessionMode::Broad,
            participants: None,
        };
        assert!(matches!(
            orchestrator().plan(&request),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plan_resolves_roster() {
        let request = StartSessionRequest {
            topic: " dopamine ".to_string(),
            mode: SessionMode::Molecular,
            participants: Some(2),
        };
        let session = orchestrator().plan(&request).unwrap();
        assert_eq!(session.topic, "dopamine");
        let suffixes: Vec<&str> = session.domains.iter().map(|d| d.suffix).collect();
        assert_eq!(suffixes, vec!["bio", "chem"]);
    }

    #[tokio::test]
    async fn test_empty_registry_still_completes() {
        let orchestrator = orchestrator();
        let session = orchestrator
            .plan(&StartSessionRequest {
                topic: "dopamine".to_string(),
                mode: SessionMode::Evidence,
                participants: None,
            })
            .unwrap();
        let (sink, mut rx) = EventSink::channel();

        let report = orchestrator.run(session, sink).await;
        assert_eq!(report.findings.len(), 3);
        assert!(report.figures.is_empty());

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first().unwrap().payload_str("status"), Some("session_start"));
        assert_eq!(events.last().unwrap().event_type, EventType::SessionDone);
        assert_eq!(events.last().unwrap().payload["finding_count"], 3);
    }
}
