use crate::types::Finding;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Append-only record of the findings published during one session.
///
/// Writers serialize on a mutex; readers take a lock-free [`snapshot`](Self::snapshot)
/// that never observes later appends. An agent that reacts early therefore only
/// sees the peers that finished before it.
#[derive(Default)]
pub struct PeerFindingLog {
    entries: ArcSwap<Vec<Finding>>,
    writer: Mutex<()>,
}

impl PeerFindingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, finding: Finding) {
        let _guard = self.writer.lock();
        let mut next = Vec::clone(&self.entries.load());
        next.push(finding);
        self.entries.store(Arc::new(next));
    }

    pub fn snapshot(&self) -> Arc<Vec<Finding>> {
        self.entries.load_full()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(agent: &str) -> Finding {
        Finding {
            agent: agent.to_string(),
            text: format!("{} text", agent),
            confidence: 0.5,
            sources: vec![],
        }
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let log = PeerFindingLog::new();
        log.append(finding("bio-agent"));
        let early = log.snapshot();
        log.append(finding("chem-agent"));

        assert_eq!(early.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
        assert_eq!(log.snapshot()[1].agent, "chem-agent");
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let log = Arc::new(PeerFindingLog::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(finding(&format!("agent-{}", i)));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(log.len(), 32);
        assert!(!log.is_empty());
    }
}
