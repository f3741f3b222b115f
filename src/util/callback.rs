//! User-facing notification callbacks.

use parking_lot::Mutex;
use std::{fmt, sync::Arc};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short, non-fatal message for the user, such as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub(crate) type OnNoticeInner = Box<dyn FnMut(Notice) + Send>;

/// The callback executed whenever the editor has something to tell the user.
///
/// # Usage
/// ```
/// use sketch_memo::callback::OnNotice;
///
/// let on_notice = OnNotice::from(|notice| {
///     // Show a toast
/// });
/// ```
#[derive(Clone)]
pub struct OnNotice(pub(crate) Arc<Mutex<OnNoticeInner>>);

impl OnNotice {
    pub(crate) fn call(&self, notice: Notice) {
        (self.0.lock())(notice);
    }
}

impl<F> From<F> for OnNotice
where
    F: FnMut(Notice) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnNotice(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl fmt::Debug for OnNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnNotice(..)")
    }
}
