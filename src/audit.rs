use std::{collections::VecDeque, sync::Mutex};

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Register,
    LoginSucceeded,
    LoginFailed,
    ProfileUpdated,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub action: AuditAction,
    pub email: String,
}

/// Bounded in-memory log of recent auth events; the oldest entry is dropped when full.
pub struct AuditLog {
    capacity: usize,
    events: Mutex<VecDeque<AuditEvent>>,
}

impl AuditLog {
    pub const DEFAULT_CAPACITY: usize = 200;
    /// Longest email kept per event; failed logins record caller input verbatim.
    pub const MAX_EMAIL_CHARS: usize = 254;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn record(&self, action: AuditAction, email: &str) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(AuditEvent {
            at: OffsetDateTime::now_utc(),
            action,
            email: email.chars().take(Self::MAX_EMAIL_CHARS).collect(),
        });
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<AuditEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.iter().cloned().collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
