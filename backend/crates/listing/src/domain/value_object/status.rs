//! Status Reporting
//!
//! Progress text for a single analysis request goes to exactly one
//! consumer: the sending half of an unbounded channel owned by the caller.

use tokio::sync::mpsc;

/// Single-subscriber status sink
#[derive(Debug, Clone, Default)]
pub struct StatusReporter {
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl StatusReporter {
    /// Reporter that drops every message
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Reporter plus the receiving end for the caller
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Forward `text` verbatim; a dropped receiver is ignored
    pub fn report(&self, text: impl Into<String>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(text.into());
        }
    }
}
