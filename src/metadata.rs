//! EXIF and XMP extraction.
//!
//! HEIF stores an EXIF item as a 4-byte offset header followed by the
//! payload. The offset points at the TIFF header, past any `Exif\0\0`
//! signature. Corrected blocks drop the offset header and start with a
//! fresh signature.
//! See <https://github.com/strukturag/libheif/issues/269#issuecomment-667149770>.

use crate::bitmap::{Bitmap, MetadataTag};
use crate::engine::{ImageHandle, ItemId};
use crate::error::HeifError;
use crate::message::Messages;

/// Signature prepended to corrected EXIF blocks.
pub const EXIF_SIGNATURE: &[u8; 6] = b"Exif\0\0";

const XMP_CONTENT_TYPE: &str = "application/rdf+xml";

/// Payload offset encoded in the first four bytes of a HEIF EXIF block,
/// packed as `(b0 << 4) | (b1 << 3) | (b2 << 2) | b3`.
fn exif_offset(header: [u8; 4]) -> usize {
    let [b0, b1, b2, b3] = header.map(usize::from);
    (b0 << 4) | (b1 << 3) | (b2 << 2) | b3
}

/// Rewrite a raw HEIF EXIF block as `Exif\0\0` + TIFF payload.
///
/// Returns `Ok(None)` for a malformed block: four bytes or fewer, or an
/// offset that leaves no payload.
pub fn correct_exif(block: &[u8]) -> Result<Option<Vec<u8>>, HeifError> {
    let Some((header, rest)) = block.split_first_chunk::<4>() else {
        return Ok(None);
    };
    let offset = exif_offset(*header);
    let Some(payload) = rest.get(offset..).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let mut corrected = Vec::new();
    corrected.try_reserve_exact(EXIF_SIGNATURE.len() + payload.len())?;
    corrected.extend_from_slice(EXIF_SIGNATURE);
    corrected.extend_from_slice(payload);
    Ok(Some(corrected))
}

/// Attach every supported metadata block of `handle` to `bitmap`, in
/// enumeration order. Failures skip the affected block only.
pub(crate) fn extract<H: ImageHandle>(handle: &H, bitmap: &mut Bitmap, messages: Messages<'_>) {
    for id in handle.metadata_block_ids(None) {
        let kind = handle.metadata_type(id);
        match kind.as_str() {
            "Exif" => {
                let Some(block) = fetch(handle, id, &kind, messages) else {
                    continue;
                };
                match correct_exif(&block) {
                    Ok(Some(corrected)) => bitmap.add_metadata(MetadataTag::exif_raw(corrected)),
                    Ok(None) => log::debug!("dropping malformed EXIF block {id} ({} bytes)", block.len()),
                    Err(_) => messages.emit(&format!("Out of memory for {kind} block")),
                }
            }
            "mime" if handle.metadata_content_type(id) == XMP_CONTENT_TYPE => {
                if let Some(block) = fetch(handle, id, "XMP", messages) {
                    bitmap.add_metadata(MetadataTag::xmp(block));
                }
            }
            _ => messages.emit(&format!("metadata of type {kind} not implemented")),
        }
    }
}

fn fetch<H: ImageHandle>(handle: &H, id: ItemId, what: &str, messages: Messages<'_>) -> Option<Vec<u8>> {
    match handle.metadata(id) {
        Ok(block) => Some(block),
        Err(e) => {
            messages.emit(&format!("Failed to read {what} block: {e}"));
            None
        }
    }
}
