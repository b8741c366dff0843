//! The decoding engine seam.
//!
//! Bitstream parsing and entropy decoding live outside this crate. An
//! engine reads the container through an [`EngineReader`], hands out
//! [`ImageHandle`]s for the primary image and its thumbnails, and decodes a
//! handle into an interleaved [`DecodedImage`].
//!
//! Ownership mirrors the engine's own teardown order: a decoded image is
//! dropped before the handle it came from, and every handle before the
//! context. Implementations release native resources in `Drop`.

use std::io;

/// Identifier of an item (metadata block, thumbnail) inside a container.
pub type ItemId = u32;

/// Error reported by the engine. The message is forwarded to the host verbatim.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Answer to [`EngineReader::wait_for_file_size`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowStatus {
    /// The source holds at least the requested number of bytes.
    SizeReached,
    /// The requested size lies past the end of the source.
    SizeBeyondEof,
}

/// Pull-style I/O the engine uses to read the container.
pub trait EngineReader {
    /// Current absolute offset.
    fn position(&mut self) -> io::Result<u64>;

    /// Fill `buf` completely. A short read is an error.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Move to absolute offset `position`.
    fn seek(&mut self, position: u64) -> io::Result<()>;

    /// Whether the source can be read up to `target_size` bytes.
    fn wait_for_file_size(&mut self, target_size: u64) -> GrowStatus;
}

/// Decode phase reported to [`EngineProgress`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressStep {
    Total,
    LoadTile,
}

/// Progress callbacks installed into a decode call.
///
/// Engines may invoke these from their worker threads. Returning `false`
/// asks the engine to stop before starting further work.
pub trait EngineProgress: Sync {
    fn start(&self, step: ProgressStep, max_progress: u32) -> bool;
    fn on_progress(&self, step: ProgressStep, progress: u32) -> bool;
}

/// Interleaved output layout requested from the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chroma {
    InterleavedRgb,
    InterleavedRgba,
    InterleavedRrggbbBe,
    InterleavedRrggbbLe,
    InterleavedRrggbbaaBe,
    InterleavedRrggbbaaLe,
}

impl Chroma {
    /// Layout for an image given its alpha, its high-bit-depth output and
    /// the platform byte order.
    pub fn target(has_alpha: bool, high_bit_depth: bool) -> Self {
        match (high_bit_depth, has_alpha, cfg!(target_endian = "big")) {
            (false, false, _) => Self::InterleavedRgb,
            (false, true, _) => Self::InterleavedRgba,
            (true, false, true) => Self::InterleavedRrggbbBe,
            (true, false, false) => Self::InterleavedRrggbbLe,
            (true, true, true) => Self::InterleavedRrggbbaaBe,
            (true, true, false) => Self::InterleavedRrggbbaaLe,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(
            self,
            Self::InterleavedRgba | Self::InterleavedRrggbbaaBe | Self::InterleavedRrggbbaaLe
        )
    }
}

/// Per-call decode configuration handed to [`ImageHandle::decode`].
#[derive(Clone, Copy)]
pub struct DecodingOptions<'a> {
    /// Upper bound on worker threads the engine may use for tiles.
    pub max_threads: u32,
    pub convert_hdr_to_8bit: bool,
    pub ignore_transformations: bool,
    pub progress: Option<&'a dyn EngineProgress>,
}

impl core::fmt::Debug for DecodingOptions<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecodingOptions")
            .field("max_threads", &self.max_threads)
            .field("convert_hdr_to_8bit", &self.convert_hdr_to_8bit)
            .field("ignore_transformations", &self.ignore_transformations)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// A decoded interleaved plane.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Bytes between the starts of consecutive rows.
    pub stride: usize,
    pub bits_per_pixel: u32,
    pub data: Vec<u8>,
}

/// Kind of color profile embedded in an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorProfileType {
    NotPresent,
    Nclx,
    /// Restricted ICC (`rICC`).
    RestrictedIcc,
    /// Unrestricted ICC (`prof`).
    Icc,
}

/// ITU-T H.273 colour primaries code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorPrimaries(pub u16);

impl ColorPrimaries {
    pub const BT709: Self = Self(1);
    pub const UNSPECIFIED: Self = Self(2);
    pub const BT470M: Self = Self(4);
    pub const BT470BG: Self = Self(5);
    pub const BT601: Self = Self(6);
    pub const SMPTE240: Self = Self(7);
    pub const GENERIC_FILM: Self = Self(8);
    pub const BT2020: Self = Self(9);
    pub const XYZ: Self = Self(10);
    pub const SMPTE431: Self = Self(11);
    pub const SMPTE432: Self = Self(12);
    pub const EBU3213: Self = Self(22);
}

/// ITU-T H.273 transfer characteristics code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransferCharacteristics(pub u16);

impl TransferCharacteristics {
    pub const BT709: Self = Self(1);
    pub const UNSPECIFIED: Self = Self(2);
    /// BT.470-6 System M, display gamma 2.2.
    pub const BT470M: Self = Self(4);
    /// BT.470-6 System B/G, display gamma 2.8.
    pub const BT470BG: Self = Self(5);
    pub const BT601: Self = Self(6);
    pub const SMPTE240: Self = Self(7);
    pub const LINEAR: Self = Self(8);
    /// IEC 61966-2-1, the sRGB curve.
    pub const SRGB: Self = Self(13);
    pub const BT2020_10BIT: Self = Self(14);
    pub const BT2020_12BIT: Self = Self(15);
    pub const PQ: Self = Self(16);
    pub const HLG: Self = Self(18);
}

/// A CIE 1931 xy chromaticity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Chromaticity {
    pub x: f32,
    pub y: f32,
}

/// NCLX color description with the chromaticities the engine derived from
/// its primaries code.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NclxProfile {
    pub color_primaries: ColorPrimaries,
    pub transfer_characteristics: TransferCharacteristics,
    pub red: Chromaticity,
    pub green: Chromaticity,
    pub blue: Chromaticity,
    pub white: Chromaticity,
}

/// One decodable unit: the primary image or a thumbnail.
pub trait ImageHandle: Sized {
    fn has_alpha_channel(&self) -> bool;
    fn luma_bits_per_pixel(&self) -> u8;
    fn chroma_bits_per_pixel(&self) -> u8;

    /// Width after geometric transforms.
    fn width(&self) -> u32;
    /// Height after geometric transforms.
    fn height(&self) -> u32;
    /// Stored (untransformed) width.
    fn ispe_width(&self) -> u32;
    /// Stored (untransformed) height.
    fn ispe_height(&self) -> u32;

    fn decode(
        &self,
        chroma: Chroma,
        options: &DecodingOptions<'_>,
    ) -> Result<DecodedImage, EngineError>;

    fn color_profile_type(&self) -> ColorProfileType;
    fn raw_color_profile(&self) -> Result<Vec<u8>, EngineError>;
    fn nclx_color_profile(&self) -> Result<NclxProfile, EngineError>;

    /// Metadata block ids, optionally restricted to one block type.
    fn metadata_block_ids(&self, type_filter: Option<&str>) -> Vec<ItemId>;
    /// Block type, e.g. `"Exif"` or `"mime"`.
    fn metadata_type(&self, id: ItemId) -> String;
    /// Declared content type; empty when the block has none.
    fn metadata_content_type(&self, id: ItemId) -> String;
    fn metadata(&self, id: ItemId) -> Result<Vec<u8>, EngineError>;

    fn thumbnail_ids(&self) -> Vec<ItemId>;
    fn thumbnail(&self, id: ItemId) -> Result<Self, EngineError>;
}

/// A container opened by the engine.
pub trait EngineContext {
    type Handle: ImageHandle;

    fn primary_image_handle(&self) -> Result<Self::Handle, EngineError>;
}

/// Entry point of a decoding engine.
pub trait Engine {
    type Context<'r>: EngineContext
    where
        Self: 'r;

    /// Parse the container structure. The context may keep reading through
    /// `reader` until it is dropped.
    fn read_from_reader<'r>(
        &'r self,
        reader: &'r mut dyn EngineReader,
    ) -> Result<Self::Context<'r>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_target_follows_alpha_and_depth() {
        assert_eq!(Chroma::target(false, false), Chroma::InterleavedRgb);
        assert_eq!(Chroma::target(true, false), Chroma::InterleavedRgba);
        let deep = Chroma::target(true, true);
        assert!(deep.has_alpha());
        if cfg!(target_endian = "little") {
            assert_eq!(deep, Chroma::InterleavedRrggbbaaLe);
            assert_eq!(Chroma::target(false, true), Chroma::InterleavedRrggbbLe);
        }
    }
}
