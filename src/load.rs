//! The load pipeline.
//!
//! sniff → reader adapter + engine context → primary handle → "read
//! complete" progress → materialize → metadata → thumbnail.
//!
//! Every fatal error is both returned and forwarded to the message sink.
//! A panic raised inside the engine is caught at this boundary and turned
//! into [`HeifError::Panicked`]; the process is never aborted. Work already
//! committed to the bitmap (profile, metadata) is kept when a later
//! optional step degrades.

use std::panic::{self, AssertUnwindSafe};

use enough::{Stop, StopReason};

use crate::bitmap::Bitmap;
use crate::decode::Materializer;
use crate::engine::{Engine, EngineContext, ImageHandle};
use crate::error::HeifError;
use crate::flags::LoadFlags;
use crate::limits::Limits;
use crate::message::{FormatId, LogSink, MessageSink, Messages};
use crate::metadata;
use crate::options::DecodeConfig;
use crate::progress::{
    DECODE_END_PROGRESS, NoProgress, ProgressBridge, ProgressRange, ProgressSink,
    READ_END_PROGRESS,
};
use crate::reader::{ByteStream, ReaderAdapter};
use crate::sniff::{Sniff, sniff_stream};
use crate::thumbnail;

/// Format ids the host assigned at registration time.
///
/// Passed into every load so messages can be tagged without any global
/// state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    pub heif: FormatId,
    pub avif: FormatId,
}

impl Registration {
    /// Id to tag messages with: HEIF for the generic family, AVIF otherwise.
    pub fn format_for(&self, sniff: Sniff) -> FormatId {
        match sniff {
            Sniff::GenericFamily => self.heif,
            Sniff::SpecificBrand | Sniff::NoMatch => self.avif,
        }
    }
}

/// One load call and its configuration.
///
/// ```no_run
/// # fn demo<E: zenheif::Engine>(engine: &E, mut file: std::fs::File) -> Result<(), zenheif::HeifError> {
/// use zenheif::{FormatId, LoadRequest, Registration, Unstoppable};
///
/// let registration = Registration { heif: FormatId(40), avif: FormatId(41) };
/// let bitmap = LoadRequest::new(engine, registration)
///     .with_flags(0x100) // force SDR
///     .load(&mut file, Unstoppable)?;
/// println!("{}x{}", bitmap.width(), bitmap.height());
/// # Ok(())
/// # }
/// ```
pub struct LoadRequest<'a, E: Engine> {
    engine: &'a E,
    registration: Registration,
    flags: u32,
    config: DecodeConfig,
    limits: Option<Limits>,
    progress: Option<&'a dyn ProgressSink>,
    messages: &'a dyn MessageSink,
}

impl<'a, E: Engine> LoadRequest<'a, E> {
    pub fn new(engine: &'a E, registration: Registration) -> Self {
        Self {
            engine,
            registration,
            flags: 0,
            config: DecodeConfig::default(),
            limits: None,
            progress: None,
            messages: &LogSink,
        }
    }

    /// Host flag word (see [`crate::flags`]).
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_messages(mut self, messages: &'a dyn MessageSink) -> Self {
        self.messages = messages;
        self
    }

    /// Load the image starting at the stream's current position.
    pub fn load(&self, stream: &mut dyn ByteStream, stop: impl Stop) -> Result<Bitmap, HeifError> {
        self.load_with(stream, &stop)
    }

    pub(crate) fn load_with(
        &self,
        stream: &mut dyn ByteStream,
        stop: &dyn Stop,
    ) -> Result<Bitmap, HeifError> {
        let sniffed = sniff_stream(stream).unwrap_or(Sniff::NoMatch);
        let messages = Messages::new(self.messages, self.registration.format_for(sniffed));

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run(stream, stop, messages)))
            .unwrap_or_else(|payload| Err(HeifError::Panicked(panic_message(payload.as_ref()))));

        match &result {
            Ok(bitmap) => log::debug!("loaded {}x{} bitmap", bitmap.width(), bitmap.height()),
            Err(HeifError::Cancelled(reason)) => log::debug!("load cancelled: {reason:?}"),
            Err(e) => messages.emit(&e.to_string()),
        }
        result
    }

    fn run(
        &self,
        stream: &mut dyn ByteStream,
        stop: &dyn Stop,
        messages: Messages<'_>,
    ) -> Result<Bitmap, HeifError> {
        stop.check()?;
        let flags = LoadFlags::parse(self.flags, self.config.flag_layout);
        let sink = self.progress.unwrap_or(&NoProgress);

        let mut reader = ReaderAdapter::new(stream)?;
        log::debug!("reading container of {} bytes", reader.len());
        let context = self.engine.read_from_reader(&mut reader)?;
        let handle = context.primary_image_handle()?;

        report(sink, READ_END_PROGRESS)?;
        stop.check()?;

        let materializer = Materializer {
            config: &self.config,
            limits: self.limits.as_ref(),
            messages,
        };
        let bridge = self.progress.map(|progress| {
            ProgressBridge::new(
                progress,
                ProgressRange::new(READ_END_PROGRESS, DECODE_END_PROGRESS),
            )
        });
        let mut bitmap = materializer.materialize(&handle, flags, bridge.as_ref())?;

        metadata::extract(&handle, &mut bitmap, messages);

        if !handle.thumbnail_ids().is_empty() {
            report(sink, DECODE_END_PROGRESS)?;
            stop.check()?;
            let range = ProgressRange::new(DECODE_END_PROGRESS, 1.0);
            thumbnail::extract(
                &handle,
                &mut bitmap,
                flags,
                &materializer,
                self.progress.map(|progress| (progress, range)),
            )?;
        }

        Ok(bitmap)
    }
}

fn report(sink: &dyn ProgressSink, fraction: f64) -> Result<(), HeifError> {
    if sink.report(fraction) {
        Ok(())
    } else {
        Err(HeifError::Cancelled(StopReason::Cancelled))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
