//! User-visible outcome notifications.
//!
//! Every persisted editor operation sends exactly one [`Notification`],
//! success or failure, on an unbounded channel drained by the UI layer.
//! Local-only steps (typing, drag-over) send nothing.

use tokio::sync::mpsc;

use crate::error::{EditorError, EditorResult, ErrorClass};

/// The operation a notification reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadSection,
    SaveSettings,
    DiscardChanges,
    AddGroup,
    RemoveGroup,
    LoadGallery,
    UploadImages,
    DeleteImage,
    SetPrimary,
    Reorder,
    AssignCategory,
    LoadCategories,
    AddCategory,
    RenameCategory,
    RemoveCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error(ErrorClass),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub operation: Operation,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error(_))
    }
}

/// Sending half of the notification channel, shared by all editors.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    /// A notifier together with the receiver the UI should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn success(&self, operation: Operation, message: impl Into<String>) {
        self.send(Notification {
            operation,
            kind: NoticeKind::Success,
            message: message.into(),
        });
    }

    pub fn failure(&self, operation: Operation, err: &EditorError) {
        tracing::warn!(?operation, class = ?err.class(), error = %err, "Editor operation failed");
        self.send(Notification {
            operation,
            kind: NoticeKind::Error(err.class()),
            message: err.to_string(),
        });
    }

    /// Send the notification for `result` and hand the result back.
    pub fn report<T>(
        &self,
        operation: Operation,
        result: EditorResult<T>,
        on_success: impl FnOnce(&T) -> String,
    ) -> EditorResult<T> {
        match &result {
            Ok(value) => self.success(operation, on_success(value)),
            Err(err) => self.failure(operation, err),
        }
        result
    }

    /// Like [`report`](Self::report), but only failures are announced.
    pub fn report_failure<T>(&self, operation: Operation, result: EditorResult<T>) -> EditorResult<T> {
        if let Err(err) = &result {
            self.failure(operation, err);
        }
        result
    }

    fn send(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}
