//! ICC serialization of synthesized profiles (lcms2).

#[cfg(feature = "lcms")]
use super::SynthesizedProfile;

/// Description tag written into synthesized profiles.
pub const DESCRIPTION: &str = "Created from NCLX";

/// Whether this build can synthesize ICC profiles.
pub const AVAILABLE: bool = cfg!(feature = "lcms");

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IccError {
    #[error("Out of memory for color profile")]
    Allocation,

    #[error("Failed to save ICC profile")]
    Serialize,
}

#[cfg(feature = "lcms")]
pub fn serialize(profile: &SynthesizedProfile) -> Result<Vec<u8>, IccError> {
    use super::ToneCurve;
    use crate::engine::Chromaticity;
    use lcms2::{CIExyY, CIExyYTRIPLE, Locale, MLU, Profile, Tag, TagSignature};

    let xyy = |c: Chromaticity| CIExyY {
        x: f64::from(c.x),
        y: f64::from(c.y),
        Y: 1.0,
    };

    let curve = match profile.curve {
        ToneCurve::Gamma(gamma) => lcms2::ToneCurve::new(gamma),
        ToneCurve::Parametric(params) => {
            lcms2::ToneCurve::new_parametric(4, &params).map_err(|_| IccError::Allocation)?
        }
    };

    let primaries = CIExyYTRIPLE {
        Red: xyy(profile.red),
        Green: xyy(profile.green),
        Blue: xyy(profile.blue),
    };
    let mut icc = Profile::new_rgb(&xyy(profile.white), &primaries, &[&curve, &curve, &curve])
        .map_err(|_| IccError::Allocation)?;

    let mut description = MLU::new(1);
    description.set_text_ascii(DESCRIPTION, Locale::new("en_US"));
    icc.write_tag(TagSignature::ProfileDescriptionTag, Tag::MLU(&description));

    icc.icc().map_err(|_| IccError::Serialize)
}
