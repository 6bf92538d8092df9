//! Fakes shared by the integration tests.
//!
//! Scripted reasoning clients, tool adapters with controlled behaviour, and
//! helpers for building orchestrators and draining event channels.

#![allow(dead_code)]

use async_trait::async_trait;
use convene::llm::LLMClient;
use convene::research::peer::{Pacing, ReactionPolicy};
use convene::research::selector::ToolSelector;
use convene::research::synthesis::FindingSynthesizer;
use convene::research::SessionOrchestrator;
use convene::tools::{ToolAdapter, ToolRegistry};
use convene::types::{AppError, CollabEvent, EventType, Record, Result};
use convene::utils::toml_config::{SessionConfig, ToolsConfig};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

// ============= Reasoning clients =============

/// Replies with queued responses in order, repeating the last one.
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    should_fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedLLM {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            last: Mutex::new(None),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new(&[])
        }
    }

    fn next(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        let mut last = self.last.lock();
        if let Some(response) = self.responses.lock().pop_front() {
            *last = Some(response);
        }
        last.clone()
            .ok_or_else(|| AppError::LLM("no scripted response".to_string()))
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.next()
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.next()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ============= Tool adapters =============

/// Returns the same records for every query.
pub struct StaticAdapter {
    name: String,
    items: Vec<Record>,
    delay: Duration,
}

impl StaticAdapter {
    pub fn new(name: &str, items: Vec<Record>) -> Self {
        Self {
            name: name.to_string(),
            items,
            delay: Duration::ZERO,
        }
    }

    /// Answer only after `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ToolAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "static test records"
    }

    async fn fetch(&self, _query: &str) -> Result<Vec<Record>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.items.clone())
    }
}

/// Always fails the way an unreachable upstream does.
pub struct FailingAdapter {
    name: String,
}

impl FailingAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ToolAdapter for FailingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn fetch(&self, _query: &str) -> Result<Vec<Record>> {
        Err(AppError::Tool(format!("{}: connection refused", self.name)))
    }
}

/// Never answers; only a timeout gets the caller out.
pub struct HangingAdapter {
    name: String,
}

impl HangingAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ToolAdapter for HangingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "never returns"
    }

    async fn fetch(&self, _query: &str) -> Result<Vec<Record>> {
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

// ============= Builders =============

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record() needs a JSON object, got {}", other),
    }
}

pub fn registry_with(timeout_secs: u64, tools: Vec<Arc<dyn ToolAdapter>>) -> ToolRegistry {
    let config = ToolsConfig {
        timeout_secs,
        ..ToolsConfig::default()
    };
    let mut registry = ToolRegistry::new(&config);
    for tool in tools {
        registry.register(tool);
    }
    registry
}

/// Deterministic orchestrator: no pacing, seeded reactions, fallback strategies.
pub fn orchestrator(registry: ToolRegistry, agreement_probability: f64) -> SessionOrchestrator {
    SessionOrchestrator::new(
        Arc::new(registry),
        Arc::new(ToolSelector::deterministic()),
        Arc::new(FindingSynthesizer::deterministic()),
        &SessionConfig::default(),
    )
    .with_pacing(Pacing::none())
    .with_policy(ReactionPolicy::new(agreement_probability, Some(7)))
}

// ============= Event collection =============

/// Everything already sitting in the channel.
pub fn drain(rx: &mut UnboundedReceiver<CollabEvent>) -> Vec<CollabEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn of_type(events: &[CollabEvent], event_type: EventType) -> Vec<&CollabEvent> {
    events.iter().filter(|e| e.event_type == event_type).collect()
}
