use crate::engine::{DecodingOptions, EngineProgress};
use crate::flags::{DEFAULT_MAX_THREADS, DecodeFlags, FlagLayout};

/// Per-host decode configuration that does not travel in the flag word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Thread cap used when the flag word carries a limit of 0.
    pub default_threads: u32,
    /// Width of the thread-limit field in the flag word.
    pub flag_layout: FlagLayout,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            default_threads: DEFAULT_MAX_THREADS,
            flag_layout: FlagLayout::default(),
        }
    }
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_threads(mut self, threads: u32) -> Self {
        self.default_threads = threads;
        self
    }

    pub fn flag_layout(mut self, layout: FlagLayout) -> Self {
        self.flag_layout = layout;
        self
    }

    /// Engine options for one decode call.
    pub fn decoding_options<'a>(
        &self,
        flags: &DecodeFlags,
        progress: Option<&'a dyn EngineProgress>,
    ) -> DecodingOptions<'a> {
        let max_threads = match flags.thread_limit {
            0 => self.default_threads,
            n => n,
        };
        DecodingOptions {
            max_threads,
            convert_hdr_to_8bit: flags.force_sdr,
            ignore_transformations: !flags.apply_transform,
            progress,
        }
    }
}
