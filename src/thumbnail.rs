use crate::bitmap::Bitmap;
use crate::decode::Materializer;
use crate::engine::ImageHandle;
use crate::error::HeifError;
use crate::flags::LoadFlags;
use crate::progress::{ProgressBridge, ProgressRange, ProgressSink};

/// Decode the first thumbnail of `handle` and attach it to `bitmap`.
///
/// Thumbnails are always fully decoded, even for header-only loads. A
/// failure leaves `bitmap` without a thumbnail; only cancellation is
/// returned as an error.
pub(crate) fn extract<H: ImageHandle>(
    handle: &H,
    bitmap: &mut Bitmap,
    flags: LoadFlags,
    materializer: &Materializer<'_>,
    progress: Option<(&dyn ProgressSink, ProgressRange)>,
) -> Result<(), HeifError> {
    let ids = handle.thumbnail_ids();
    let Some(&first) = ids.first() else {
        return Ok(());
    };
    if ids.len() > 1 {
        materializer
            .messages
            .emit("Warning: Thumbs beyond the first are ignored.");
    }

    let thumb = match handle.thumbnail(first) {
        Ok(thumb) => thumb,
        Err(e) => {
            materializer.messages.emit(&e.message);
            return Ok(());
        }
    };

    let bridge = progress.map(|(sink, range)| ProgressBridge::new(sink, range));
    match materializer.materialize(&thumb, flags.with_pixels(), bridge.as_ref()) {
        Ok(decoded) => {
            log::debug!("attached {}x{} thumbnail", decoded.width(), decoded.height());
            bitmap.set_thumbnail(decoded);
        }
        Err(e @ HeifError::Cancelled(_)) => return Err(e),
        Err(e) => {
            log::warn!("thumbnail decode failed: {e}");
            materializer.messages.emit(&e.to_string());
        }
    }
    Ok(())
}
