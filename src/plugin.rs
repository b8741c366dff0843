//! Per-format registration surface.
//!
//! HEIF and AVIF share one engine and one load pipeline. A [`HeifPlugin`]
//! is configured with the [`ContainerFormat`] it registers as; the format
//! decides the identity strings and which byte signatures it claims.

use std::io;

use enough::Stop;

use crate::bitmap::Bitmap;
use crate::engine::Engine;
use crate::error::HeifError;
use crate::flags::LOAD_NO_PIXELS;
use crate::limits::Limits;
use crate::load::{LoadRequest, Registration};
use crate::message::{LogSink, MessageSink};
use crate::options::DecodeConfig;
use crate::progress::ProgressSink;
use crate::reader::ByteStream;
use crate::sniff::{Sniff, sniff_stream};

/// Strings a host shows for a registered format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatIdentity {
    pub name: &'static str,
    pub description: &'static str,
    /// Comma-separated, without dots.
    pub extensions: &'static str,
    pub mime_type: &'static str,
}

static HEIF_IDENTITY: FormatIdentity = FormatIdentity {
    name: "HEIF",
    description: "High Efficiency Image File Format (HEIF)",
    extensions: "heic,heics,heif,heifs",
    mime_type: "image/heif",
};

static AVIF_IDENTITY: FormatIdentity = FormatIdentity {
    name: "AVIF",
    description: "AV1 Image File Format (AVIF)",
    extensions: "avif,avifs",
    mime_type: "image/avif",
};

/// The two sibling formats served by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Any HEIF brand except the AVIF ones.
    Heif,
    /// `avif` / `avis` brands.
    Avif,
}

impl ContainerFormat {
    pub fn identity(self) -> &'static FormatIdentity {
        match self {
            Self::Heif => &HEIF_IDENTITY,
            Self::Avif => &AVIF_IDENTITY,
        }
    }

    /// Whether a sniff result belongs to this format.
    pub fn claims(self, sniff: Sniff) -> bool {
        matches!(
            (self, sniff),
            (Self::Heif, Sniff::GenericFamily) | (Self::Avif, Sniff::SpecificBrand)
        )
    }
}

/// What a host needs from a registered image format.
pub trait FormatCodec {
    fn identity(&self) -> &'static FormatIdentity;

    fn supports_icc_profiles(&self) -> bool {
        true
    }

    fn supports_no_pixels(&self) -> bool {
        true
    }

    /// Whether the stream holds this format. The cursor is left unchanged.
    fn probe(&self, stream: &mut dyn ByteStream) -> io::Result<bool>;

    /// Dimensions, color profile, metadata and thumbnail without pixels.
    fn decode_header(
        &self,
        stream: &mut dyn ByteStream,
        flags: u32,
        progress: Option<&dyn ProgressSink>,
        stop: &dyn Stop,
    ) -> Result<Bitmap, HeifError> {
        self.decode(stream, flags | LOAD_NO_PIXELS, progress, stop)
    }

    /// Full load honoring every bit of `flags`.
    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        flags: u32,
        progress: Option<&dyn ProgressSink>,
        stop: &dyn Stop,
    ) -> Result<Bitmap, HeifError>;
}

/// A [`FormatCodec`] backed by a decoding engine.
pub struct HeifPlugin<'a, E: Engine> {
    engine: &'a E,
    format: ContainerFormat,
    registration: Registration,
    config: DecodeConfig,
    limits: Option<Limits>,
    messages: &'a dyn MessageSink,
}

impl<'a, E: Engine> HeifPlugin<'a, E> {
    pub fn new(engine: &'a E, format: ContainerFormat, registration: Registration) -> Self {
        Self {
            engine,
            format,
            registration,
            config: DecodeConfig::default(),
            limits: None,
            messages: &LogSink,
        }
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_messages(mut self, messages: &'a dyn MessageSink) -> Self {
        self.messages = messages;
        self
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }
}

impl<E: Engine> FormatCodec for HeifPlugin<'_, E> {
    fn identity(&self) -> &'static FormatIdentity {
        self.format.identity()
    }

    fn probe(&self, stream: &mut dyn ByteStream) -> io::Result<bool> {
        Ok(self.format.claims(sniff_stream(stream)?))
    }

    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        flags: u32,
        progress: Option<&dyn ProgressSink>,
        stop: &dyn Stop,
    ) -> Result<Bitmap, HeifError> {
        let mut request = LoadRequest::new(self.engine, self.registration)
            .with_flags(flags)
            .with_config(self.config)
            .with_messages(self.messages);
        if let Some(limits) = &self.limits {
            request = request.with_limits(limits.clone());
        }
        if let Some(progress) = progress {
            request = request.with_progress(progress);
        }
        request.load_with(stream, stop)
    }
}
