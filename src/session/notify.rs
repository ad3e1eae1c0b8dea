use super::PendingConnection;
use tracing::{error, info, warn};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// The UI collaborator the editing session talks to.
///
/// Rejections, repairs and I/O failures are expected outcomes surfaced as
/// transient notices, so the session reports them through this seam rather
/// than bubbling everything up as errors. The default hook implementations
/// do nothing; embedders override what their surface can show.
pub trait Notifier {
    /// Shows a transient, non-blocking notice to the flow author.
    fn notify(&mut self, level: NoticeLevel, message: &str);

    /// Asks the author for the free-text condition label of an AI-sourced
    /// connection. The session holds the connection as pending until
    /// [`confirm_pending`](crate::session::FlowSession::confirm_pending)
    /// or [`cancel_pending`](crate::session::FlowSession::cancel_pending)
    /// is called.
    fn condition_prompt(&mut self, pending: &PendingConnection) {
        let _ = pending;
    }

    /// Invoked when a load failed so badly there is nothing safe to show
    /// and the author should be taken back to the flow list.
    fn redirect_to_flows(&mut self) {}
}

/// A [`Notifier`] that forwards notices to the `tracing` subscriber.
/// Useful for headless embeddings and tools without a notification surface.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!("{message}"),
            NoticeLevel::Warning => warn!("{message}"),
            NoticeLevel::Error => error!("{message}"),
        }
    }
}
