//! Per-agent control flow for one session.

use crate::figures::{self, Figure};
use crate::research::domains::AgentDomainConfig;
use crate::research::events::EventSink;
use crate::research::log::PeerFindingLog;
use crate::research::peer::{Pacing, PeerAnalyzer, ReactionPolicy};
use crate::research::selector::ToolSelector;
use crate::research::synthesis::{FindingSynthesizer, confidence};
use crate::tools::ToolRegistry;
use crate::types::{CollabEvent, EventType, Finding, ToolResult};
use rand::rngs::StdRng;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Planning,
    Running,
    Reacting,
    Synthesizing,
    Done,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Planning => "planning",
            AgentState::Running => "running",
            AgentState::Reacting => "reacting",
            AgentState::Synthesizing => "synthesizing",
            AgentState::Done => "done",
        }
    }
}

/// Everything the agents of one session share.
pub struct SessionContext {
    pub registry: Arc<ToolRegistry>,
    pub selector: Arc<ToolSelector>,
    pub synthesizer: Arc<FindingSynthesizer>,
    pub log: Arc<PeerFindingLog>,
    pub sink: EventSink,
    pub policy: ReactionPolicy,
    pub pacing: Pacing,
    pub tools_per_agent: usize,
}

/// What an agent leaves behind once it reaches `Done`.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub agent: String,
    pub finding: Finding,
    pub tools_used: Vec<String>,
    pub figures: Vec<Figure>,
}

pub struct AgentTask {
    name: String,
    domain: &'static AgentDomainConfig,
    topic: String,
    ctx: Arc<SessionContext>,
    rng: StdRng,
    state: AgentState,
}

impl AgentTask {
    pub fn new(
        domain: &'static AgentDomainConfig,
        index: usize,
        topic: impl Into<String>,
        ctx: Arc<SessionContext>,
    ) -> Self {
        let rng = ctx.policy.rng_for(index);
        Self {
            name: domain.agent_name(),
            domain,
            topic: topic.into(),
            ctx,
            rng,
            state: AgentState::Planning,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    fn event(&self, event_type: EventType) -> CollabEvent {
        CollabEvent::new(event_type, &self.name)
    }

    fn enter(&mut self, state: AgentState) {
        self.state = state;
        tracing::debug!(agent = %self.name, state = state.as_str(), "Agent state change");
        self.ctx.sink.emit(
            self.event(EventType::AgentStatus)
                .with_payload(json!({ "status": state.as_str(), "domain": self.domain.domain })),
        );
    }

    /// Drive the agent from `Planning` to `Done`. Tool, selection and synthesis
    /// failures only thin out the content; the agent always finishes.
    pub async fn run(mut self) -> AgentOutcome {
        self.enter(AgentState::Planning);
        let pool = self.domain.candidate_pool();
        let tools = self
            .ctx
            .selector
            .select(self.domain, &self.topic, &pool, self.ctx.tools_per_agent)
            .await;
        self.ctx.sink.emit(
            self.event(EventType::Thought)
                .with_payload(json!({ "text": format!("Plan: {}", tools.join(", ")), "tools": tools })),
        );

        self.enter(AgentState::Running);
        let mut results = Vec::with_capacity(tools.len());
        let mut figures = Vec::new();
        for tool in &tools {
            let (result, figure) = self.run_tool(tool).await;
            figures.extend(figure);
            results.push(result);
        }

        self.enter(AgentState::Reacting);
        self.react_to_peers(&results).await;

        self.enter(AgentState::Synthesizing);
        let text = self
            .ctx
            .synthesizer
            .synthesize(&self.name, self.domain, &self.topic, &results)
            .await;
        let finding = Finding {
            agent: self.name.clone(),
            text,
            confidence: confidence(&results),
            sources: results
                .iter()
                .filter(|r| r.is_useful())
                .map(|r| r.tool.clone())
                .collect(),
        };
        self.ctx.log.append(finding.clone());
        self.ctx.sink.emit(self.event(EventType::Finding).with_payload(json!({
            "text": finding.text,
            "confidence": finding.confidence,
            "sources": finding.sources,
        })));

        self.enter(AgentState::Done);
        tracing::info!(
            agent = %self.name,
            tools = tools.len(),
            figures = figures.len(),
            confidence = finding.confidence,
            "Agent finished"
        );

        AgentOutcome {
            agent: self.name,
            finding,
            tools_used: tools,
            figures,
        }
    }

    async fn run_tool(&self, tool: &str) -> (ToolResult, Option<Figure>) {
        self.ctx.sink.emit(
            self.event(EventType::ToolStarted)
                .with_payload(json!({ "tool": tool, "query": self.topic })),
        );
        let result = self.ctx.registry.run(tool, &self.topic).await;
        self.ctx.sink.emit(self.event(EventType::ToolResult).with_payload(json!({
            "tool": tool,
            "summary": result.summary,
            "count": result.items.len(),
            "error": result.error,
        })));

        let figure = figures::render(tool, &result.items);
        if let Some(figure) = &figure
            && let Ok(payload) = serde_json::to_value(figure)
        {
            self.ctx
                .sink
                .emit(self.event(EventType::Figure).with_payload(payload));
        }

        self.ctx.sink.emit(
            self.event(EventType::Thought)
                .with_payload(json!({ "tool": tool, "text": thought(&result) })),
        );
        (result, figure)
    }

    /// React once to each distinct peer finding present at the moment this
    /// phase starts. Findings appended afterwards are not seen.
    async fn react_to_peers(&mut self, results: &[ToolResult]) {
        let snapshot = self.ctx.log.snapshot();
        let mut seen: HashSet<&str> = HashSet::new();

        for peer in snapshot.iter().filter(|f| f.agent != self.name) {
            if !seen.insert(peer.text.as_str()) {
                continue;
            }
            self.ctx.pacing.pause(&mut self.rng).await;

            let verdict = PeerAnalyzer::evaluate(self.domain, results, &peer.text);
            if verdict.should_challenge {
                self.ctx.sink.emit(
                    self.event(EventType::Challenge)
                        .with_payload(json!({
                            "text": verdict.justification,
                            "trigger": verdict.trigger,
                        }))
                        .with_ref(&peer.agent),
                );
            } else if self.ctx.policy.roll_agreement(&mut self.rng) {
                let text = PeerAnalyzer::agreement(self.domain, results, &peer.text);
                self.ctx.sink.emit(
                    self.event(EventType::Agreement)
                        .with_payload(json!({ "text": text }))
                        .with_ref(&peer.agent),
                );
            }
        }
    }
}

fn thought(result: &ToolResult) -> String {
    match (&result.error, result.items.len()) {
        (Some(error), _) => format!("{} was unavailable ({}); moving on.", result.tool, error),
        (None, 0) => format!("{} had nothing on this topic.", result.tool),
        (None, n) => format!("{} gave {} records. {}", result.tool, n, result.summary),
    }
}
