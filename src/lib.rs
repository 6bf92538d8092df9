//! # Convene - concurrent multi-domain investigation server
//!
//! Convene puts a small panel of domain-specialized agents (biology, chemistry,
//! genomics, clinical, literature) on one research topic at the same time.
//! Each agent queries public scientific data sources, renders simple figures
//! from what comes back, reacts to its peers' findings, and publishes one
//! finding of its own. The whole session is streamed live as typed events.
//!
//! ## Overview
//!
//! Convene can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `convene-server` binary
//! 2. **As a library** - Drive [`research::SessionOrchestrator`] directly
//!
//! ### Running a session in-process
//!
//! ```rust,ignore
//! use convene::{AppState, ConfigManager};
//! use convene::types::StartSessionRequest;
//! use futures::StreamExt;
//!
//! let state = AppState::from_config(ConfigManager::new("convene.toml")?).await?;
//! let request = StartSessionRequest {
//!     topic: "dopamine receptor signaling".to_string(),
//!     mode: Default::default(),
//!     participants: None,
//! };
//! let (session_id, frames) = state.start_session(&request)?;
//! futures::pin_mut!(frames);
//! while let Some(frame) = frames.next().await {
//!     println!("{session_id}: {frame:?}");
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama reasoning provider (default) |
//! | `openai` | OpenAI-compatible reasoning provider |
//! | `swagger-ui` | Interactive API documentation at `/swagger-ui/` |
//!
//! Without a `[reasoning]` section every agent uses its deterministic tool
//! selection and rule-based synthesis. Sessions have the same shape either way.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Family-specific figure rendering for tool results.
pub mod figures;
/// Reasoning provider clients.
pub mod llm;
/// Session orchestration, agents and the event feed.
pub mod research;
/// Scientific data source adapters.
pub mod tools;
/// Core types (requests, events, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use research::{SessionArchive, SessionOrchestrator};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, ConveneConfig};

use crate::research::selector::{LlmSelection, SelectionStrategy, ToolSelector};
use crate::research::synthesis::{FindingSynthesizer, LlmSynthesis, SynthesisStrategy};
use crate::research::archive::hand_off;
use crate::research::{EventSink, EventTransport, Frame, LogArchive};
use crate::types::StartSessionRequest;
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with reload support
    pub config_manager: Arc<ConfigManager>,
    /// Registered data sources
    pub registry: Arc<ToolRegistry>,
    /// Runs sessions; shared by every request
    pub orchestrator: Arc<SessionOrchestrator>,
    /// Receives each finished session
    pub archive: Arc<dyn SessionArchive>,
}

impl AppState {
    /// Wire the registry, reasoning strategies and orchestrator from the current config.
    pub async fn from_config(config_manager: ConfigManager) -> Result<Self> {
        let config = config_manager.config();
        let registry = Arc::new(ToolRegistry::with_default_tools(&config.tools));

        let (selector, synthesizer) = match (&config.reasoning, LLMClientFactory::from_config(&config)?) {
            (Some(reasoning), Some(factory)) => {
                let llm: Arc<dyn LLMClient> = Arc::from(factory.create_default().await?);
                tracing::info!(
                    provider = factory.default_provider().name(),
                    model = %llm.model_name(),
                    "Reasoning provider enabled"
                );
                let selection: Arc<dyn SelectionStrategy> = Arc::new(LlmSelection::new(
                    llm.clone(),
                    Duration::from_secs(reasoning.selection_timeout_secs),
                ));
                let synthesis: Arc<dyn SynthesisStrategy> = Arc::new(LlmSynthesis::new(
                    llm,
                    Duration::from_secs(reasoning.synthesis_timeout_secs),
                    reasoning.synthesis_max_chars,
                ));
                (
                    ToolSelector::new(Some(selection)),
                    FindingSynthesizer::new(Some(synthesis)),
                )
            }
            _ => {
                tracing::info!("No reasoning provider configured; using deterministic strategies");
                (ToolSelector::deterministic(), FindingSynthesizer::deterministic())
            }
        };

        let orchestrator = SessionOrchestrator::new(
            registry.clone(),
            Arc::new(selector),
            Arc::new(synthesizer),
            &config.session,
        );

        Ok(Self {
            config_manager: Arc::new(config_manager),
            registry,
            orchestrator: Arc::new(orchestrator),
            archive: Arc::new(LogArchive),
        })
    }

    /// Swap the archive that receives finished sessions.
    pub fn with_archive(mut self, archive: Arc<dyn SessionArchive>) -> Self {
        self.archive = archive;
        self
    }

    /// Plan a session, run it in the background and return its id and frame feed.
    ///
    /// The session keeps running if the feed is dropped; only forwarding stops.
    /// Its report goes to the archive once every agent is done.
    pub fn start_session(
        &self,
        request: &StartSessionRequest,
    ) -> Result<(Uuid, impl Stream<Item = Frame> + Send + 'static + use<>)> {
        let session = self.orchestrator.plan(request)?;
        let id = session.id;
        let config = self.config_manager.config();

        let (sink, rx) = EventSink::channel();
        let orchestrator = self.orchestrator.clone();
        let archive = self.archive.clone();
        tokio::spawn(async move {
            let report = orchestrator.run(session, sink).await;
            hand_off(archive.as_ref(), &report).await;
        });

        let frames = EventTransport::frames(
            rx,
            config.session.duration_ceiling(),
            config.session.heartbeat(),
        );
        Ok((id, frames))
    }

    /// Replace the orchestrator, e.g. with one using custom tools or pacing.
    pub fn with_orchestrator(mut self, orchestrator: SessionOrchestrator) -> Self {
        self.registry = orchestrator.registry().clone();
        self.orchestrator = Arc::new(orchestrator);
        self
    }
}
