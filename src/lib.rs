//! # zenheif
//!
//! HEIF and AVIF still-image loading backend for image-processing hosts.
//!
//! The host supplies a seekable stream and receives a [`Bitmap`]: 8-bit
//! RGB(A) pixels stored bottom-up, an ICC profile, EXIF/XMP records and at
//! most one thumbnail. Bitstream decoding itself is delegated to an
//! [`Engine`] implementation.
//!
//! ## What this crate does
//!
//! - Sniffs the `ftyp` brand so HEIF and AVIF can be registered as two
//!   formats with disjoint signatures ([`sniff`], [`ContainerFormat`])
//! - Adapts a `Read + Seek` stream to the engine's pull reader ([`ReaderAdapter`])
//! - Packs per-call options into one flag word ([`flags`])
//! - Remaps decoded planes into the destination layout
//! - Attaches embedded ICC profiles, or synthesizes one from NCLX
//!   primaries and transfer curves (`lcms` feature)
//! - Corrects HEIF's EXIF framing and extracts XMP packets
//! - Decodes the first thumbnail
//! - Bridges tile-decode progress into one cancellable fraction
//!
//! ## Non-Goals
//!
//! - Pixel values above 8 bits per channel: HDR images are refused for
//!   full decode unless the force-SDR flag asks the engine to convert
//! - Thumbnails beyond the first, auxiliary images, encoding
//!
//! ## Usage
//!
//! ```no_run
//! # fn demo<E: zenheif::Engine>(engine: &E) -> Result<(), zenheif::HeifError> {
//! use zenheif::{ContainerFormat, FormatCodec, FormatId, HeifPlugin, Registration, Unstoppable};
//!
//! let registration = Registration { heif: FormatId(1), avif: FormatId(2) };
//! let avif = HeifPlugin::new(engine, ContainerFormat::Avif, registration);
//!
//! let mut file = std::fs::File::open("photo.avif")?;
//! if avif.probe(&mut file)? {
//!     let bitmap = avif.decode(&mut file, 0, None, &Unstoppable)?;
//!     println!("{}x{}, icc: {}", bitmap.width(), bitmap.height(), bitmap.icc_profile().is_some());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod bitmap;
pub mod color;
mod decode;
pub mod engine;
mod error;
pub mod flags;
mod limits;
mod load;
pub mod metadata;
mod message;
mod options;
mod pixel;
mod plugin;
pub mod progress;
mod reader;
pub mod sniff;
mod thumbnail;

// Re-exports
pub use bitmap::{Bitmap, MetadataModel, MetadataTag, TagType};
pub use color::{ColorProfile, SynthesizedProfile, ToneCurve};
pub use engine::{
    Chroma, ColorProfileType, DecodedImage, DecodingOptions, Engine, EngineContext, EngineError,
    EngineProgress, EngineReader, GrowStatus, ImageHandle, ItemId, NclxProfile, ProgressStep,
};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::HeifError;
pub use flags::{DecodeFlags, FlagLayout, LOAD_NO_PIXELS, LoadFlags};
pub use limits::Limits;
pub use load::{LoadRequest, Registration};
pub use message::{FormatId, LogSink, MessageSink};
pub use options::DecodeConfig;
pub use pixel::PixelLayout;
pub use plugin::{ContainerFormat, FormatCodec, FormatIdentity, HeifPlugin};
pub use progress::{NoProgress, ProgressBridge, ProgressRange, ProgressSink};
pub use reader::{ByteStream, ReaderAdapter};
pub use sniff::{Sniff, sniff};
