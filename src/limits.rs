use crate::error::HeifError;

/// Resource limits applied before any destination bitmap is allocated.
///
/// All fields default to `None` (no limit). Header-only loads are checked
/// against the dimension limits but allocate no pixel memory.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for one pixel buffer, row padding included.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check a `width` x `height` destination needing `bytes` of pixel storage.
    pub(crate) fn check_bitmap(&self, width: u32, height: u32, bytes: usize) -> Result<(), HeifError> {
        let exceeded = |what: String| Err(HeifError::LimitExceeded(what));

        if let Some(max_w) = self.max_width.filter(|&m| u64::from(width) > m) {
            return exceeded(format!("width {width} exceeds limit {max_w}"));
        }
        if let Some(max_h) = self.max_height.filter(|&m| u64::from(height) > m) {
            return exceeded(format!("height {height} exceeds limit {max_h}"));
        }
        let pixels = u64::from(width) * u64::from(height);
        if let Some(max_px) = self.max_pixels.filter(|&m| pixels > m) {
            return exceeded(format!("pixel count {pixels} exceeds limit {max_px}"));
        }
        if let Some(max_mem) = self.max_memory_bytes.filter(|&m| bytes as u64 > m) {
            return exceeded(format!(
                "allocation {bytes} bytes exceeds memory limit {max_mem}"
            ));
        }
        Ok(())
    }
}
