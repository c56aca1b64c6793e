use log::info;
use meridian_ports::{AuditEntry, AuditError, AuditSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Writes audit entries to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        info!(
            "[AUDIT] {} {} {} {}",
            entry.category, entry.user_id, entry.action, entry.details
        );
        Ok(())
    }
}

/// Keeps audit entries in memory
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.action.clone()).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries.lock().push(entry);
        Ok(())
    }
}
