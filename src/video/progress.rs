//! Progress notification sinks.
//!
//! The orchestrator reports human-readable status lines through a
//! [`ProgressSink`]. Sinks are observers only: they return nothing and have
//! no way to fail the operation that notifies them.

use tokio::sync::mpsc::UnboundedSender;

pub trait ProgressSink: Send + Sync {
    fn notify(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Forwards messages to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn notify(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Sends messages over an unbounded tokio channel.
///
/// A closed receiver is ignored, so a caller that stops listening never
/// affects the operation in flight.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: UnboundedSender<String>,
}

impl ChannelProgress {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgress {
    fn notify(&self, message: &str) {
        let _ = self.tx.send(message.to_string());
    }
}

/// Prefixes every message before handing it to an inner sink.
pub struct PrefixedProgress<'a> {
    prefix: String,
    inner: &'a dyn ProgressSink,
}

impl<'a> PrefixedProgress<'a> {
    pub fn new(prefix: impl Into<String>, inner: &'a dyn ProgressSink) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl ProgressSink for PrefixedProgress<'_> {
    fn notify(&self, message: &str) {
        self.inner.notify(&format!("{}{}", self.prefix, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_messages() {
        let seen = Mutex::new(Vec::new());
        let sink = |m: &str| seen.lock().unwrap().push(m.to_string());
        sink.notify("one");
        sink.notify("two");
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_log_sink_is_usable_as_trait_object() {
        let sink: &dyn ProgressSink = &LogProgress;
        sink.notify("logged, not returned");
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelProgress::new(tx);
        drop(rx);
        sink.notify("nobody listening");
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelProgress::new(tx);
        sink.notify("a");
        sink.notify("b");
        assert_eq!(rx.try_recv().unwrap(), "a");
        assert_eq!(rx.try_recv().unwrap(), "b");
    }

    #[test]
    fn test_prefixed_sink() {
        let seen = Mutex::new(Vec::new());
        let inner = |m: &str| seen.lock().unwrap().push(m.to_string());
        let sink = PrefixedProgress::new("Scene 2: ", &inner);
        sink.notify("rendering");
        assert_eq!(*seen.lock().unwrap(), vec!["Scene 2: rendering"]);
    }
}
