//! Destination color profile resolution.
//!
//! Profiles are read from the image handle, never from the decoded plane,
//! so header-only loads attach the same profile as full ones.

pub mod icc;

use crate::bitmap::Bitmap;
use crate::engine::{
    Chromaticity, ColorPrimaries, ColorProfileType, ImageHandle, NclxProfile,
    TransferCharacteristics,
};
use crate::message::Messages;

const NCLX_IGNORED: &str = "NCLX color profile ignored.";

/// Tone curve of a synthesized profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneCurve {
    /// Pure power curve.
    Gamma(f64),
    /// ICC parametric curve type 4: `[gamma, a, b, c, d]`.
    Parametric([f64; 5]),
}

impl ToneCurve {
    /// BT.709 / BT.601 curve.
    pub const BT709: Self = Self::Parametric([2.2, 1.0 / 1.099, 0.099 / 1.099, 1.0 / 4.5, 0.081]);
    /// IEC 61966-2-1 (sRGB) curve.
    pub const SRGB: Self = Self::Parametric([2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045]);

    /// Curve for an NCLX transfer characteristics code. Codes without a
    /// dedicated curve fall back to sRGB.
    pub fn for_transfer(transfer: TransferCharacteristics) -> Self {
        match transfer {
            TransferCharacteristics::BT709 => Self::BT709,
            TransferCharacteristics::BT470M => Self::Gamma(2.2),
            TransferCharacteristics::BT470BG => Self::Gamma(2.8),
            TransferCharacteristics::LINEAR => Self::Gamma(1.0),
            _ => Self::SRGB,
        }
    }
}

/// RGB profile parameters derived from an NCLX description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthesizedProfile {
    pub red: Chromaticity,
    pub green: Chromaticity,
    pub blue: Chromaticity,
    pub white: Chromaticity,
    pub curve: ToneCurve,
}

impl SynthesizedProfile {
    /// Profile for `nclx`, or `None` when the description is equivalent to
    /// sRGB or carries no usable primaries.
    ///
    /// Unspecified primaries, and BT.709 primaries with either the sRGB or
    /// the linear transfer, attach no profile. This matches the heuristic
    /// GIMP's HEIF plug-in applies.
    pub fn from_nclx(nclx: &NclxProfile) -> Option<Self> {
        let srgb_like = nclx.color_primaries == ColorPrimaries::BT709
            && matches!(
                nclx.transfer_characteristics,
                TransferCharacteristics::SRGB | TransferCharacteristics::LINEAR
            );
        if nclx.color_primaries == ColorPrimaries::UNSPECIFIED || srgb_like {
            return None;
        }
        Some(Self {
            red: nclx.red,
            green: nclx.green,
            blue: nclx.blue,
            white: nclx.white,
            curve: ToneCurve::for_transfer(nclx.transfer_characteristics),
        })
    }
}

/// Profile to attach to a decoded image.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorProfile {
    None,
    RawIcc(Vec<u8>),
    Synthesized(SynthesizedProfile),
}

/// Inspect the profile embedded in `handle`.
pub(crate) fn resolve<H: ImageHandle>(
    handle: &H,
    convert_to_icc: bool,
    messages: Messages<'_>,
) -> ColorProfile {
    match handle.color_profile_type() {
        ColorProfileType::NotPresent => ColorProfile::None,
        ColorProfileType::RestrictedIcc | ColorProfileType::Icc => {
            match handle.raw_color_profile() {
                Ok(bytes) => ColorProfile::RawIcc(bytes),
                Err(e) => {
                    messages.emit(&format!("Failed to read color profile: {e}"));
                    ColorProfile::None
                }
            }
        }
        ColorProfileType::Nclx => {
            if !(convert_to_icc && icc::AVAILABLE) {
                messages.emit(NCLX_IGNORED);
                return ColorProfile::None;
            }
            match handle.nclx_color_profile() {
                Ok(nclx) => SynthesizedProfile::from_nclx(&nclx)
                    .map_or(ColorProfile::None, ColorProfile::Synthesized),
                Err(e) => {
                    messages.emit(&format!("Failed to get NCLX color profile: {e}"));
                    ColorProfile::None
                }
            }
        }
    }
}

/// Attach `profile` to `bitmap`. Serialization failures are reported and
/// leave the bitmap without a profile. Builds without `lcms` cannot
/// serialize a synthesized profile and report it as ignored.
pub(crate) fn attach(bitmap: &mut Bitmap, profile: ColorProfile, messages: Messages<'_>) {
    match profile {
        ColorProfile::None => {}
        ColorProfile::RawIcc(bytes) => bitmap.set_icc_profile(bytes),
        #[cfg(feature = "lcms")]
        ColorProfile::Synthesized(synth) => match icc::serialize(&synth) {
            Ok(bytes) => bitmap.set_icc_profile(bytes),
            Err(e) => {
                log::warn!("ICC synthesis failed: {e}");
                messages.emit(&e.to_string());
            }
        },
        #[cfg(not(feature = "lcms"))]
        ColorProfile::Synthesized(_) => messages.emit(NCLX_IGNORED),
    }
}
