//! Host message channel.
//!
//! Every failure, degradation and informational note from a load flows
//! through one [`MessageSink`], tagged with the host's id for the format.

/// Identifier the host assigned to a registered format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatId(pub i32);

/// Receives load messages.
pub trait MessageSink {
    fn message(&self, format: FormatId, text: &str);
}

/// Default sink: forwards messages to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn message(&self, format: FormatId, text: &str) {
        log::warn!(target: "zenheif", "[format {}] {text}", format.0);
    }
}

/// A sink bound to the format id of the current load.
#[derive(Clone, Copy)]
pub(crate) struct Messages<'a> {
    sink: &'a dyn MessageSink,
    format: FormatId,
}

impl<'a> Messages<'a> {
    pub(crate) fn new(sink: &'a dyn MessageSink, format: FormatId) -> Self {
        Self { sink, format }
    }

    pub(crate) fn emit(&self, text: &str) {
        self.sink.message(self.format, text);
    }
}
