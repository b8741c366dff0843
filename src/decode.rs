//! Image materialization: one image handle to one destination bitmap.

use enough::StopReason;

use crate::bitmap::Bitmap;
use crate::color;
use crate::engine::{Chroma, DecodedImage, EngineProgress, ImageHandle};
use crate::error::HeifError;
use crate::flags::LoadFlags;
use crate::limits::Limits;
use crate::message::Messages;
use crate::options::DecodeConfig;
use crate::pixel::PixelLayout;
use crate::progress::ProgressBridge;

/// State shared by every materialization of one load call.
#[derive(Clone, Copy)]
pub(crate) struct Materializer<'a> {
    pub config: &'a DecodeConfig,
    pub limits: Option<&'a Limits>,
    pub messages: Messages<'a>,
}

impl Materializer<'_> {
    /// Decode `handle` (or only size it, for header-only loads) and attach
    /// its color profile.
    pub(crate) fn materialize<H: ImageHandle>(
        &self,
        handle: &H,
        flags: LoadFlags,
        progress: Option<&ProgressBridge<'_>>,
    ) -> Result<Bitmap, HeifError> {
        let has_alpha = handle.has_alpha_channel();
        let is_hdr = handle.luma_bits_per_pixel() > 8 || handle.chroma_bits_per_pixel() > 8;
        let load_as_hdr = is_hdr && !flags.decode.force_sdr;

        if load_as_hdr && !flags.header_only {
            return Err(HeifError::HdrNotImplemented);
        }

        let chroma = Chroma::target(has_alpha, load_as_hdr);
        let options = self.config.decoding_options(
            &flags.decode,
            progress.map(|bridge| bridge as &dyn EngineProgress),
        );
        let layout = PixelLayout::for_alpha(has_alpha);

        let mut bitmap = if flags.header_only {
            let (width, height) = if options.ignore_transformations {
                (handle.ispe_width(), handle.ispe_height())
            } else {
                (handle.width(), handle.height())
            };
            log::debug!("header-only load: {width}x{height}");
            Bitmap::allocate_header(width, height, layout, self.limits)?
        } else {
            let decoded = handle.decode(chroma, &options);
            if progress.is_some_and(ProgressBridge::is_cancelled) {
                return Err(HeifError::Cancelled(StopReason::Cancelled));
            }
            let image = decoded?;
            log::debug!(
                "decoded {}x{} plane, {} bpp, {:?}",
                image.width,
                image.height,
                image.bits_per_pixel,
                chroma
            );
            let mut bitmap = Bitmap::allocate(image.width, image.height, layout, self.limits)?;
            copy_pixels(&image, &mut bitmap)?;
            bitmap
        };

        let profile = color::resolve(handle, flags.decode.convert_to_icc, self.messages);
        color::attach(&mut bitmap, profile, self.messages);

        Ok(bitmap)
    }
}

/// Copy an interleaved RGB(A) plane into `bitmap`.
///
/// Source row 0 lands in the last destination scanline, and each pixel is
/// written as R, G, B[, A] whatever padding the source carries.
fn copy_pixels(image: &DecodedImage, bitmap: &mut Bitmap) -> Result<(), HeifError> {
    let dst_bpp = bitmap.layout().bytes_per_pixel();
    let src_bpp = (image.bits_per_pixel / 8) as usize;
    if src_bpp < dst_bpp {
        return Err(HeifError::InvalidData(format!(
            "{} bpp plane cannot fill a {}-channel bitmap",
            image.bits_per_pixel, dst_bpp
        )));
    }

    let width = image.width as usize;
    let height = image.height as usize;
    let src_row_bytes = width * src_bpp;
    let needed = image
        .stride
        .checked_mul(height.saturating_sub(1))
        .and_then(|n| n.checked_add(src_row_bytes));
    if image.stride < src_row_bytes || needed.is_none_or(|n| image.data.len() < n) {
        return Err(HeifError::InvalidData(format!(
            "plane of {} bytes with stride {} is too small for {}x{}",
            image.data.len(),
            image.stride,
            image.width,
            image.height
        )));
    }

    let pitch = bitmap.pitch();
    let dst_row_bytes = width * dst_bpp;
    let Some(dst) = bitmap.pixels_mut() else {
        return Ok(());
    };

    for (dst_row, src_row) in dst
        .rchunks_exact_mut(pitch)
        .zip(image.data.chunks(image.stride))
    {
        for (d, s) in dst_row[..dst_row_bytes]
            .chunks_exact_mut(dst_bpp)
            .zip(src_row[..src_row_bytes].chunks_exact(src_bpp))
        {
            d.copy_from_slice(&s[..dst_bpp]);
        }
    }
    Ok(())
}
