use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Ingress payload that starts a collaborative session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    pub topic: String,
    #[serde(default)]
    pub mode: SessionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DomainSummary {
    pub agent: String,
    pub suffix: String,
    pub domain: String,
    pub focus: String,
    pub tool_pool: Vec<String>,
    pub default_tools: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolSummary {
    pub name: String,
    pub family: Option<String>,
}

// ============= Session Types =============

/// Which domains participate in a session.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Broad,
    Molecular,
    Translational,
    Evidence,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Broad => "broad",
            SessionMode::Molecular => "molecular",
            SessionMode::Translational => "translational",
            SessionMode::Evidence => "evidence",
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broad" => Ok(SessionMode::Broad),
            "molecular" => Ok(SessionMode::Molecular),
            "translational" => Ok(SessionMode::Translational),
            "evidence" => Ok(SessionMode::Evidence),
            other => Err(AppError::InvalidInput(format!("Unknown mode: {}", other))),
        }
    }
}

// ============= Tool Types =============

/// One structured record returned by a tool; key order is insertion order.
pub type Record = Map<String, Value>;

/// Normalized outcome of a single tool call. Failures are data, never panics or `Err`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool: String,
    pub summary: String,
    pub items: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(tool: &str, summary: String, items: Vec<Record>) -> Self {
        Self {
            tool: tool.to_string(),
            summary,
            items,
            error: None,
        }
    }

    pub fn empty(tool: &str, summary: String) -> Self {
        Self::success(tool, summary, Vec::new())
    }

    pub fn failure(tool: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            tool: tool.to_string(),
            summary: format!("{} failed: {}", tool, error),
            items: Vec::new(),
            error: Some(error),
        }
    }

    pub fn unknown(tool: &str) -> Self {
        Self::empty(tool, format!("Unknown tool: {}", tool))
    }

    /// True when the call produced at least one record without error.
    pub fn is_useful(&self) -> bool {
        self.error.is_none() && !self.items.is_empty()
    }
}

// ============= Event Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AgentStatus,
    ToolStarted,
    ToolResult,
    Figure,
    Thought,
    Finding,
    Challenge,
    Agreement,
    SessionDone,
    Timeout,
}

impl EventType {
    /// Wire name, also used as the SSE `event:` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::AgentStatus => "agent_status",
            EventType::ToolStarted => "tool_started",
            EventType::ToolResult => "tool_result",
            EventType::Figure => "figure",
            EventType::Thought => "thought",
            EventType::Finding => "finding",
            EventType::Challenge => "challenge",
            EventType::Agreement => "agreement",
            EventType::SessionDone => "session_done",
            EventType::Timeout => "timeout",
        }
    }
}

/// A single record on the live event feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CollabEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub agent: String,
    #[schema(value_type = Object)]
    pub payload: Map<String, Value>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_agent: Option<String>,
}

impl CollabEvent {
    pub fn new(event_type: EventType, agent: &str) -> Self {
        Self {
            event_type,
            agent: agent.to_string(),
            payload: Map::new(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ref_agent: None,
        }
    }

    /// Merge the fields of a JSON object into the payload. Non-objects are stored under `value`.
    pub fn with_payload(mut self, payload: Value) -> Self {
        match payload {
            Value::Object(map) => self.payload.extend(map),
            other => {
                self.payload.insert("value".to_string(), other);
            }
        }
        self
    }

    pub fn with_ref(mut self, agent: &str) -> Self {
        self.ref_agent = Some(agent.to_string());
        self
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

// ============= Finding Types =============

/// An agent's final conclusion. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Finding {
    pub agent: String,
    pub text: String,
    pub confidence: f64,
    pub sources: Vec<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Tool(err.to_string())
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Config(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::LLM(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::Tool(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Timeout(msg) => (axum::http::StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
