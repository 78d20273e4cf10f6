//! Transient notification area.
//!
//! Read actions that fail post a notice here instead of returning an error. Notices expire
//! after a fixed duration and the area keeps at most `max_notices` of them, dropping the
//! oldest first. Renderers either poll [`Notifications::active`] or listen on
//! [`Notifications::subscribe`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Default number of notices kept.
pub const DEFAULT_MAX_NOTICES: usize = 5;

/// Default notice lifetime.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(4);

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One transient message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration: DEFAULT_NOTICE_DURATION,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Error)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Warning)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success)
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

struct Area {
    notices: VecDeque<Notice>,
    max_notices: usize,
}

/// Shared handle to the notification area.
#[derive(Clone)]
pub struct Notifications {
    area: Arc<Mutex<Area>>,
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_NOTICES)
    }

    /// Area that keeps at most `max_notices` notices.
    #[must_use]
    pub fn with_capacity(max_notices: usize) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            area: Arc::new(Mutex::new(Area {
                notices: VecDeque::new(),
                max_notices: max_notices.max(1),
            })),
            tx,
        }
    }

    /// Post a notice.
    pub fn push(&self, notice: Notice) {
        {
            let mut area = self.area.lock().unwrap_or_else(PoisonError::into_inner);
            area.notices.push_back(notice.clone());
            while area.notices.len() > area.max_notices {
                area.notices.pop_front();
            }
        }
        // No receivers is fine
        let _ = self.tx.send(notice);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Notice::error(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(Notice::warning(message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Notice::success(message));
    }

    /// Notices that have not expired yet, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notice> {
        let mut area = self.area.lock().unwrap_or_else(PoisonError::into_inner);
        area.notices.retain(|n| !n.is_expired());
        area.notices.iter().cloned().collect()
    }

    /// Stream of notices posted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn clear(&self) {
        self.area
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .notices
            .clear();
    }
}
