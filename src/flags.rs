//! Load flag word packing.
//!
//! A host passes a single integer to every load call. The low `K` bits
//! carry a thread limit, the next three bits carry boolean options, and
//! bit 15 belongs to the host: it requests a header-only load.
//!
//! ```text
//!  15        K+3    K+2        K+1        K         0
//! [NOPIXELS] [....] [TRANSFORM][NCLX2ICC] [SDR] [threads...]
//! ```

use crate::error::HeifError;

/// Host-owned bit requesting a header-only load (dimensions, profile and
/// metadata, no pixels).
pub const LOAD_NO_PIXELS: u32 = 1 << 15;

/// Thread count used when the flag word carries a limit of 0.
pub const DEFAULT_MAX_THREADS: u32 = 4;

/// Default width of the thread-limit field, in bits.
pub const DEFAULT_THREAD_BITS: u32 = 8;

/// Largest `K` that keeps all three option bits below [`LOAD_NO_PIXELS`].
const MAX_THREAD_BITS: u32 = 15 - 3;

/// Options decoded from a flag word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeFlags {
    /// Maximum decoding threads; 0 selects the configured default.
    pub thread_limit: u32,
    /// Convert HDR content to 8 bits per channel instead of refusing it.
    pub force_sdr: bool,
    /// Synthesize an ICC profile from an NCLX color description.
    pub convert_to_icc: bool,
    /// Apply geometric transforms (rotation, mirroring, crop).
    pub apply_transform: bool,
}

/// Bit layout of the flag word: where the thread-limit field ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagLayout {
    thread_bits: u32,
}

impl Default for FlagLayout {
    fn default() -> Self {
        Self {
            thread_bits: DEFAULT_THREAD_BITS,
        }
    }
}

impl FlagLayout {
    /// Layout with a `thread_bits`-wide thread-limit field.
    pub fn new(thread_bits: u32) -> Result<Self, HeifError> {
        if thread_bits == 0 || thread_bits > MAX_THREAD_BITS {
            return Err(HeifError::InvalidFlagLayout(thread_bits));
        }
        Ok(Self { thread_bits })
    }

    pub fn thread_bits(&self) -> u32 {
        self.thread_bits
    }

    /// Largest thread limit the field can hold, `2^K - 1`.
    pub fn max_thread_limit(&self) -> u32 {
        (1 << self.thread_bits) - 1
    }

    pub fn force_sdr_bit(&self) -> u32 {
        1 << self.thread_bits
    }

    pub fn convert_to_icc_bit(&self) -> u32 {
        1 << (self.thread_bits + 1)
    }

    pub fn apply_transform_bit(&self) -> u32 {
        1 << (self.thread_bits + 2)
    }

    /// Unpack the option fields of `word`. Bits outside the field are ignored.
    pub fn decode(&self, word: u32) -> DecodeFlags {
        DecodeFlags {
            thread_limit: word & self.max_thread_limit(),
            force_sdr: word & self.force_sdr_bit() != 0,
            convert_to_icc: word & self.convert_to_icc_bit() != 0,
            apply_transform: word & self.apply_transform_bit() != 0,
        }
    }

    /// Pack `flags` into a word. A thread limit above `2^K - 1` saturates.
    pub fn encode(&self, flags: &DecodeFlags) -> u32 {
        let mut word = flags.thread_limit.min(self.max_thread_limit());
        if flags.force_sdr {
            word |= self.force_sdr_bit();
        }
        if flags.convert_to_icc {
            word |= self.convert_to_icc_bit();
        }
        if flags.apply_transform {
            word |= self.apply_transform_bit();
        }
        word
    }
}

/// Everything a single load call reads from its flag word. Parsed once at
/// call entry and never mutated afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadFlags {
    pub decode: DecodeFlags,
    pub header_only: bool,
}

impl LoadFlags {
    pub fn parse(word: u32, layout: FlagLayout) -> Self {
        Self {
            decode: layout.decode(word),
            header_only: word & LOAD_NO_PIXELS != 0,
        }
    }

    /// The same flags with pixel decoding requested.
    pub(crate) fn with_pixels(self) -> Self {
        Self {
            header_only: false,
            ..self
        }
    }
}
