// ── Notification bus ──
//
// Ordered queue of short-lived, user-facing messages. Producers push and
// move on; the UI (here: the CLI) reads a snapshot or follows the queue
// through a watch channel. Expiry timers run on the ambient tokio runtime.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::config::NotificationDefaults;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

/// One queued message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Monotonic, unique per bus.
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    /// Zero persists until dismissed.
    #[serde(rename = "timeout_ms", serialize_with = "as_millis")]
    pub timeout: Duration,
    pub created_at: DateTime<Utc>,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

type Queue = Arc<Vec<Notification>>;

/// Injectable notification queue. Cloning yields another handle to the
/// same queue.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    next_id: AtomicU64,
    defaults: NotificationDefaults,
    queue: watch::Sender<Queue>,
}

impl NotificationBus {
    pub fn new(defaults: NotificationDefaults) -> Self {
        let (queue, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                defaults,
                queue,
            }),
        }
    }

    pub fn defaults(&self) -> &NotificationDefaults {
        &self.inner.defaults
    }

    // ── Producers ────────────────────────────────────────────────────

    /// Queue a message with the default lifetime for its kind.
    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let timeout = self.inner.defaults.timeout_for(kind);
        self.notify_with_timeout(kind, message, timeout)
    }

    /// Queue a message with an explicit lifetime.
    pub fn notify_with_timeout(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        timeout: Duration,
    ) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            kind,
            message: message.into(),
            timeout,
            created_at: Utc::now(),
        };

        match kind {
            NotificationKind::Error | NotificationKind::Warning => {
                warn!(id, %kind, message = %notification.message, "notification");
            }
            NotificationKind::Success | NotificationKind::Info => {
                info!(id, %kind, message = %notification.message, "notification");
            }
        }

        self.inner.queue.send_modify(|queue| {
            Arc::make_mut(queue).push(notification);
        });

        if !timeout.is_zero() {
            self.schedule_expiry(id, timeout);
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Warning, message)
    }

    // ── Removal ──────────────────────────────────────────────────────

    /// Remove a notification. Unknown ids are ignored.
    pub fn dismiss(&self, id: u64) {
        self.inner.dismiss(id);
    }

    /// Remove every notification.
    pub fn clear(&self) {
        self.inner.queue.send_if_modified(|queue| {
            if queue.is_empty() {
                return false;
            }
            *queue = Arc::new(Vec::new());
            true
        });
    }

    // ── Readers ──────────────────────────────────────────────────────

    /// Current queue, oldest first.
    pub fn snapshot(&self) -> Queue {
        self.inner.queue.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.queue.borrow().is_empty()
    }

    pub fn subscribe(&self) -> NotificationStream {
        NotificationStream::new(self.inner.queue.subscribe())
    }

    fn schedule_expiry(&self, id: u64, timeout: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(id, "no runtime; notification persists until dismissed");
            return;
        };
        let weak: Weak<BusInner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.dismiss(id);
            }
        });
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(NotificationDefaults::default())
    }
}

impl BusInner {
    fn dismiss(&self, id: u64) {
        self.queue.send_if_modified(|queue| {
            let Some(pos) = queue.iter().position(|n| n.id == id) else {
                return false;
            };
            Arc::make_mut(queue).remove(pos);
            true
        });
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// Live view of the queue.
pub struct NotificationStream {
    current: Queue,
    receiver: watch::Receiver<Queue>,
}

impl NotificationStream {
    fn new(receiver: watch::Receiver<Queue>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Queue {
        &self.current
    }

    /// Wait for the next change. `None` once every bus handle is gone.
    pub async fn changed(&mut self) -> Option<Queue> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> NotificationWatchStream {
        NotificationWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a queue snapshot per change.
pub struct NotificationWatchStream {
    inner: WatchStream<Queue>,
}

impl Stream for NotificationWatchStream {
    type Item = Queue;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
