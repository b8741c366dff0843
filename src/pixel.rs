/// Pixel memory layout of a destination bitmap.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// 3 channels, 8-bit, R,G,B byte order (24 bpp).
    Rgb8,
    /// 4 channels, 8-bit, R,G,B,A byte order (32 bpp).
    Rgba8,
}

impl PixelLayout {
    /// Destination layout for an image with or without alpha.
    pub(crate) fn for_alpha(has_alpha: bool) -> Self {
        if has_alpha { Self::Rgba8 } else { Self::Rgb8 }
    }

    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }

    /// Bits per pixel, as reported to hosts that think in bpp.
    pub fn bits_per_pixel(&self) -> u32 {
        self.bytes_per_pixel() as u32 * 8
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.bytes_per_pixel()
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba8)
    }

    /// Row pitch in bytes: rows are padded to a 4-byte boundary.
    pub fn pitch(&self, width: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(self.bits_per_pixel() as usize)?
            .checked_add(31)
            .map(|bits| bits / 32 * 4)
    }
}
