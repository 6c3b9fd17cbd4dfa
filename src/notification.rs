use std::cell::RefCell;

const APP_NAME: &str = "OverLaid";
const ERROR_SUMMARY: &str = "OverLaid Error";

/// Where user-facing failures go. The host decides how blocking that is.
pub trait ErrorReporter {
    fn report(&self, message: &str);
}

/// Desktop notification through the session notification daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl ErrorReporter for DesktopNotifier {
    fn report(&self, message: &str) {
        send(ERROR_SUMMARY, message);
    }
}

/// Keeps reported messages in memory, for headless runs and tests.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: RefCell<Vec<String>>,
}

impl CollectingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn take(&self) -> Vec<String> {
        self.messages.take()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, message: &str) {
        tracing::warn!(message, "error reported");
        self.messages.borrow_mut().push(message.to_string());
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for &T {
    fn report(&self, message: &str) {
        (**self).report(message)
    }
}

pub fn send(summary: &str, body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname(APP_NAME)
        .summary(summary)
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}
