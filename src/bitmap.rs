use crate::error::HeifError;
use crate::limits::Limits;
use crate::pixel::PixelLayout;

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

/// Metadata model a tag is attached under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataModel {
    /// Raw EXIF block, `Exif\0\0` signature followed by the TIFF payload.
    ExifRaw,
    /// XMP packet.
    Xmp,
}

/// Storage type of a tag value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagType {
    Byte,
    Ascii,
}

/// A metadata record attached to a [`Bitmap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataTag {
    pub model: MetadataModel,
    pub key: &'static str,
    pub tag_type: TagType,
    pub value: Vec<u8>,
}

impl MetadataTag {
    pub(crate) fn exif_raw(value: Vec<u8>) -> Self {
        Self {
            model: MetadataModel::ExifRaw,
            key: "ExifRaw",
            tag_type: TagType::Byte,
            value,
        }
    }

    pub(crate) fn xmp(value: Vec<u8>) -> Self {
        Self {
            model: MetadataModel::Xmp,
            key: "XMLPacket",
            tag_type: TagType::Ascii,
            value,
        }
    }
}

/// Destination bitmap produced by a load.
///
/// Pixel rows are stored bottom-up: scanline 0 is the bottom row of the
/// image. Each row is padded to a 4-byte boundary (see [`Bitmap::pitch`]).
/// A header-only bitmap carries dimensions, profile and metadata but no
/// pixel storage.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    layout: PixelLayout,
    pixels: Option<Vec<u8>>,
    icc_profile: Option<Vec<u8>>,
    metadata: Vec<MetadataTag>,
    thumbnail: Option<Box<Bitmap>>,
}

impl Bitmap {
    fn buffer_len(width: u32, height: u32, layout: PixelLayout) -> Result<usize, HeifError> {
        layout
            .pitch(width)
            .and_then(|pitch| pitch.checked_mul(height as usize))
            .ok_or(HeifError::DimensionsTooLarge { width, height })
    }

    /// Allocate a zeroed bitmap with pixel storage.
    pub(crate) fn allocate(
        width: u32,
        height: u32,
        layout: PixelLayout,
        limits: Option<&Limits>,
    ) -> Result<Self, HeifError> {
        if width == 0 || height == 0 {
            return Err(HeifError::AllocationFailed);
        }
        let len = Self::buffer_len(width, height, layout)?;
        if let Some(limits) = limits {
            limits.check_bitmap(width, height, len)?;
        }
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);
        Ok(Self::with_pixels(width, height, layout, Some(pixels)))
    }

    /// Allocate a dimensioned bitmap without pixel storage.
    pub(crate) fn allocate_header(
        width: u32,
        height: u32,
        layout: PixelLayout,
        limits: Option<&Limits>,
    ) -> Result<Self, HeifError> {
        if let Some(limits) = limits {
            limits.check_bitmap(width, height, 0)?;
        }
        Ok(Self::with_pixels(width, height, layout, None))
    }

    fn with_pixels(width: u32, height: u32, layout: PixelLayout, pixels: Option<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            layout,
            pixels,
            icc_profile: None,
            metadata: Vec::new(),
            thumbnail: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.layout.bits_per_pixel()
    }

    /// Bytes per row, including padding.
    pub fn pitch(&self) -> usize {
        Self::buffer_len(self.width, 1, self.layout).unwrap_or(0)
    }

    /// Whether the bitmap carries pixel storage (false for header-only loads).
    pub fn has_pixels(&self) -> bool {
        self.pixels.is_some()
    }

    /// Whole pixel buffer, bottom row first.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    pub(crate) fn pixels_mut(&mut self) -> Option<&mut [u8]> {
        self.pixels.as_deref_mut()
    }

    /// Scanline `y`, counted from the bottom, without row padding.
    pub fn scanline(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let pitch = self.pitch();
        let row_bytes = self.width as usize * self.layout.bytes_per_pixel();
        let start = pitch * y as usize;
        self.pixels()?.get(start..start + row_bytes)
    }

    /// Embedded or synthesized ICC profile.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    pub(crate) fn set_icc_profile(&mut self, profile: Vec<u8>) {
        self.icc_profile = Some(profile);
    }

    /// Metadata records in attachment order.
    pub fn metadata(&self) -> &[MetadataTag] {
        &self.metadata
    }

    /// First record for `model`, if any.
    pub fn metadata_for(&self, model: MetadataModel) -> Option<&MetadataTag> {
        self.metadata.iter().find(|tag| tag.model == model)
    }

    pub(crate) fn add_metadata(&mut self, tag: MetadataTag) {
        self.metadata.push(tag);
    }

    pub fn thumbnail(&self) -> Option<&Bitmap> {
        self.thumbnail.as_deref()
    }

    pub(crate) fn set_thumbnail(&mut self, thumbnail: Bitmap) {
        self.thumbnail = Some(Box::new(thumbnail));
    }

    /// Top-down RGBA copy of the pixels. Opaque layouts get alpha 255.
    #[cfg(feature = "rgb")]
    pub fn to_rgba8_top_down(&self) -> Option<Vec<rgb::RGBA8>> {
        self.pixels.as_ref()?;
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in (0..self.height).rev() {
            let row = self.scanline(y)?;
            match self.layout {
                PixelLayout::Rgb8 => {
                    let px: &[rgb::RGB8] = row.as_pixels();
                    out.extend(px.iter().map(|p| rgb::RGBA8::new(p.r, p.g, p.b, 255)));
                }
                PixelLayout::Rgba8 => {
                    let px: &[rgb::RGBA8] = row.as_pixels();
                    out.extend_from_slice(px);
                }
            }
        }
        Some(out)
    }

    /// Top-down [`imgref::ImgVec`] copy of the pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec(&self) -> Option<imgref::ImgVec<rgb::RGBA8>> {
        let pixels = self.to_rgba8_top_down()?;
        Some(imgref::ImgVec::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }
}
