//! Multi-Agent Investigation Sessions
//!
//! A session puts several domain-specialized agents on one topic at once.
//! Each agent picks tools, runs them in sequence, reacts to whatever peer
//! findings exist when it gets there, and publishes a single finding. All of
//! it is reported as a live event feed.
//!
//! # Architecture
//!
//! - [`coordinator::SessionOrchestrator`] - Fans out one [`agent::AgentTask`] per domain
//! - [`selector::ToolSelector`] / [`synthesis::FindingSynthesizer`] - Reasoning
//!   service strategies with deterministic fallbacks
//! - [`peer::PeerAnalyzer`] - Cross-domain challenge/agreement decisions
//! - [`log::PeerFindingLog`] - Append-only shared findings with snapshot reads
//! - [`transport::EventTransport`] - Heartbeats and the session duration ceiling
//!
//! # Usage
//!
//! ```ignore
//! let session = orchestrator.plan(&request)?;
//! let (sink, rx) = EventSink::channel();
//! tokio::spawn(async move { orchestrator.run(session, sink).await });
//! let frames = EventTransport::frames(rx, ceiling, heartbeat);
//! ```

pub mod agent;
pub mod archive;
/// Session fan-out and lifecycle events.
pub mod coordinator;
pub mod domains;
pub mod events;
pub mod log;
pub mod peer;
pub mod selector;
pub mod synthesis;
pub mod transport;

pub use archive::{LogArchive, SessionArchive};
pub use coordinator::{Session, SessionOrchestrator, SessionReport};
pub use events::EventSink;
pub use transport::{EventTransport, Frame};
