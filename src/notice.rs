//! User-facing notifications emitted by the feed client and the session.
//!
//! Consumers subscribe to a `tokio::sync::broadcast` channel; sending never
//! fails the sender, a notice with no subscribers is simply dropped.

use tokio::sync::broadcast;

// ---

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    // ---
    /// A refresh replaced the held readings.
    Updated { count: usize },

    /// The feed answered but had no readings.
    NoData,

    /// The feed answered 400; synthetic readings are being shown.
    UsingFallback { count: usize },

    /// The feed call failed; the caller got no readings.
    FeedUnavailable { reason: String },

    /// A session refresh cycle failed.
    RefreshFailed { reason: String },
}

pub type NoticeSender = broadcast::Sender<Notice>;

/// Create a notice channel.
pub fn channel() -> NoticeSender {
    let (tx, _) = broadcast::channel(32);
    tx
}

/// Send without caring whether anybody listens.
pub(crate) fn emit(tx: &NoticeSender, notice: Notice) {
    let _ = tx.send(notice);
}
