use crate::research::coordinator::SessionReport;
use crate::types::Result;
use async_trait::async_trait;

/// Receives the finished-session payload. Persistence lives outside this crate;
/// implementors decide where reports go.
#[async_trait]
pub trait SessionArchive: Send + Sync {
    async fn archive(&self, report: &SessionReport) -> Result<()>;
}

/// Records a structured summary of each finished session through `tracing`.
pub struct LogArchive;

#[async_trait]
impl SessionArchive for LogArchive {
    async fn archive(&self, report: &SessionReport) -> Result<()> {
        let agents: Vec<&str> = report.findings.iter().map(|f| f.agent.as_str()).collect();
        let mean_confidence = if report.findings.is_empty() {
            0.0
        } else {
            report.findings.iter().map(|f| f.confidence).sum::<f64>() / report.findings.len() as f64
        };
        tracing::info!(
            session_id = %report.session.id,
            topic = %report.session.topic,
            findings = report.findings.len(),
            agents = ?agents,
            tools_used = ?report.tools_used,
            figures = report.figures.len(),
            mean_confidence,
            "Session archived"
        );
        Ok(())
    }
}

/// Hand a report to the archive; failures are logged and go no further.
pub async fn hand_off(archive: &dyn SessionArchive, report: &SessionReport) {
    if let Err(e) = archive.archive(report).await {
        tracing::warn!(session_id = %report.session.id, error = %e, "Session archive failed");
    }
}
