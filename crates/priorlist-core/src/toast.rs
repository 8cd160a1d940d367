use chrono::{DateTime, Duration, Utc};

/// How long a toast stays up unless dismissed first.
const TOAST_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub expires_at: DateTime<Utc>,
}

/// Bounded-lifetime notification queue. Expiry is clock-driven: each toast
/// carries its own deadline and `sweep_expired` drops the due ones, so a
/// manual dismissal simply makes the later sweep a no-op for that id.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, now: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            message: message.into(),
            severity,
            expires_at: now + Duration::seconds(TOAST_TTL_SECS),
        });
        id
    }

    /// Removes by id. Idempotent: dismissing an already-gone toast does nothing.
    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Drops every toast whose display window has elapsed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    /// Removes and returns everything currently queued.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}
