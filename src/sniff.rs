//! Brand sniffing from the first 12 bytes of a container.
//!
//! Both siblings share the ISO-BMFF `ftyp` box. The main brand at bytes
//! 8..12 separates AVIF (`avif`, `avis`) from every other HEIF dialect, so
//! two independently registered formats can share one engine while
//! claiming disjoint signatures.

use std::io::{self, Read, SeekFrom};

use crate::reader::ByteStream;

/// Bytes examined by [`sniff`].
pub const SNIFF_LEN: usize = 12;

/// Main brands reserved for AVIF: still image and image sequence.
pub const AVIF_BRANDS: [[u8; 4]; 2] = [*b"avif", *b"avis"];

/// Classification of a byte prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sniff {
    NoMatch,
    /// A HEIF container with a brand other than the AVIF ones.
    GenericFamily,
    /// A HEIF container whose main brand is `avif` or `avis`.
    SpecificBrand,
}

/// Container file-type check: an `ftyp` box type at offset 4.
fn is_heif_filetype(sample: &[u8]) -> bool {
    sample.len() >= SNIFF_LEN && &sample[4..8] == b"ftyp"
}

/// The `ftyp` main brand, when the sample is long enough to hold one.
pub fn main_brand(sample: &[u8]) -> Option<[u8; 4]> {
    sample.get(8..12)?.try_into().ok()
}

/// Classify a byte prefix.
pub fn sniff(sample: &[u8]) -> Sniff {
    if !is_heif_filetype(sample) {
        return Sniff::NoMatch;
    }
    match main_brand(sample) {
        Some(brand) if AVIF_BRANDS.contains(&brand) => Sniff::SpecificBrand,
        _ => Sniff::GenericFamily,
    }
}

/// Classify the next [`SNIFF_LEN`] bytes of `stream`, restoring its cursor.
pub fn sniff_stream(stream: &mut dyn ByteStream) -> io::Result<Sniff> {
    let start = stream.stream_position()?;
    let mut sample = Vec::with_capacity(SNIFF_LEN);
    let read = (&mut *stream)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut sample);
    stream.seek(SeekFrom::Start(start))?;
    read?;
    Ok(sniff(&sample))
}
