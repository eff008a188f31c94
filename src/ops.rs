// src/ops.rs
//
// Processing parameters.
// These are cheap to create and copy - the expensive work happens in engine::process().

use crate::engine::Limits;
use crate::error::UpscaleError;
use std::borrow::Cow;

/// Lobe count used when `"lanczos"` is requested without an explicit count.
pub const DEFAULT_LANCZOS_LOBES: u32 = 3;

/// Resampling algorithm used to compute the output grid.
///
/// Unknown names parse to [`Algorithm::Bilinear`], matching the default
/// used when no algorithm is specified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Copy the closest source pixel
    NearestNeighbor,
    /// Weighted average of the 2x2 neighborhood
    #[default]
    Bilinear,
    /// Catmull-Rom cubic convolution over a 4x4 neighborhood
    Bicubic,
    /// Windowed sinc over a (2*lobes)x(2*lobes) neighborhood
    Lanczos { lobes: u32 },
}

impl Algorithm {
    pub fn lanczos() -> Self {
        Self::Lanczos {
            lobes: DEFAULT_LANCZOS_LOBES,
        }
    }

    /// Parse an algorithm name. Accepts `nearest`, `bilinear`, `bicubic`,
    /// `lanczos` and `lanczosN` (e.g. `lanczos2`). Anything else is Bilinear.
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "nearest" | "nearest-neighbor" | "nearestneighbor" => Self::NearestNeighbor,
            "bilinear" => Self::Bilinear,
            "bicubic" => Self::Bicubic,
            "lanczos" => Self::lanczos(),
            other => other
                .strip_prefix("lanczos")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|&lobes| lobes >= 1)
                .map(|lobes| Self::Lanczos { lobes })
                .unwrap_or_default(),
        }
    }

    /// Canonical name. `parse(as_str())` round-trips.
    pub fn as_str(&self) -> Cow<'static, str> {
        match self {
            Self::NearestNeighbor => Cow::Borrowed("nearest"),
            Self::Bilinear => Cow::Borrowed("bilinear"),
            Self::Bicubic => Cow::Borrowed("bicubic"),
            Self::Lanczos { lobes } if *lobes == DEFAULT_LANCZOS_LOBES => Cow::Borrowed("lanczos"),
            Self::Lanczos { lobes } => Cow::Owned(format!("lanczos{lobes}")),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Parameters for one upscale pass (and for every task of a batch run).
#[derive(Clone, Debug, PartialEq)]
pub struct UpscaleOptions {
    /// Uniform scale applied to both axes. Must be finite and > 0.
    pub scale_factor: f64,
    pub algorithm: Algorithm,
    /// Sharpening amount in 0..=100. 0 skips the sharpen pass entirely.
    pub sharpness: f64,
    /// Output size guard applied before the output buffer is allocated
    pub limits: Limits,
}

impl Default for UpscaleOptions {
    fn default() -> Self {
        Self {
            scale_factor: 2.0,
            algorithm: Algorithm::default(),
            sharpness: 0.0,
            limits: Limits::default(),
        }
    }
}

impl UpscaleOptions {
    pub fn new(scale_factor: f64, algorithm: Algorithm, sharpness: f64) -> Self {
        Self {
            scale_factor,
            algorithm,
            sharpness,
            limits: Limits::default(),
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_sharpness(mut self, sharpness: f64) -> Self {
        self.sharpness = sharpness;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Validate parameters that do not depend on the source image.
    pub fn validate(&self) -> Result<(), UpscaleError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(UpscaleError::invalid_scale_factor(self.scale_factor));
        }
        if !(0.0..=100.0).contains(&self.sharpness) {
            // NaN also lands here
            return Err(UpscaleError::invalid_argument(
                "sharpness",
                self.sharpness.to_string(),
                "must be within 0..=100",
            ));
        }
        Ok(())
    }

    /// Sharpen strength in (0, 1], or None when sharpening is disabled.
    pub fn sharpen_strength(&self) -> Option<f64> {
        (self.sharpness > 0.0).then(|| self.sharpness / 100.0)
    }
}

/// Output format for encoding a finished buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
}

impl OutputFormat {
    pub fn from_str(format: &str, quality: Option<u8>) -> Result<Self, UpscaleError> {
        let q = quality.unwrap_or(80).clamp(1, 100);
        match format.to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg { quality: q }),
            other => Err(UpscaleError::unsupported_format(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpeg",
        }
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod algorithm_tests {
        use super::*;

        #[test]
        fn parses_known_names() {
            assert_eq!(Algorithm::parse("nearest"), Algorithm::NearestNeighbor);
            assert_eq!(Algorithm::parse("bilinear"), Algorithm::Bilinear);
            assert_eq!(Algorithm::parse("BICUBIC"), Algorithm::Bicubic);
            assert_eq!(Algorithm::parse("lanczos"), Algorithm::Lanczos { lobes: 3 });
            assert_eq!(Algorithm::parse("lanczos2"), Algorithm::Lanczos { lobes: 2 });
        }

        #[test]
        fn unknown_names_fall_back_to_bilinear() {
            assert_eq!(Algorithm::parse(""), Algorithm::Bilinear);
            assert_eq!(Algorithm::parse("super-resolution"), Algorithm::Bilinear);
            assert_eq!(Algorithm::parse("lanczos0"), Algorithm::Bilinear);
            assert_eq!(Algorithm::parse("lanczosx"), Algorithm::Bilinear);
        }

        #[test]
        fn name_round_trips() {
            for algo in [
                Algorithm::NearestNeighbor,
                Algorithm::Bilinear,
                Algorithm::Bicubic,
                Algorithm::lanczos(),
                Algorithm::Lanczos { lobes: 5 },
            ] {
                assert_eq!(Algorithm::parse(&algo.as_str()), algo);
            }
        }

        #[test]
        fn fixed_names_do_not_allocate() {
            assert!(matches!(Algorithm::Bicubic.as_str(), Cow::Borrowed("bicubic")));
            assert!(matches!(Algorithm::lanczos().as_str(), Cow::Borrowed("lanczos")));
            assert_eq!(Algorithm::Lanczos { lobes: 2 }.as_str(), "lanczos2");
            assert_eq!(Algorithm::Lanczos { lobes: 2 }.to_string(), "lanczos2");
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn defaults_match_reference_tool() {
            let opts = UpscaleOptions::default();
            assert_eq!(opts.scale_factor, 2.0);
            assert_eq!(opts.algorithm, Algorithm::Bilinear);
            assert_eq!(opts.sharpness, 0.0);
            assert!(opts.validate().is_ok());
            assert_eq!(opts.sharpen_strength(), None);
        }

        #[test]
        fn rejects_bad_scale_factor() {
            for scale in [0.0, -2.0, f64::NAN, f64::INFINITY] {
                let err = UpscaleOptions::default()
                    .with_scale_factor(scale)
                    .validate()
                    .unwrap_err();
                assert!(matches!(err, UpscaleError::InvalidScaleFactor { .. }));
            }
        }

        #[test]
        fn rejects_sharpness_out_of_range() {
            for sharpness in [-1.0, 100.5, f64::NAN] {
                let err = UpscaleOptions::default()
                    .with_sharpness(sharpness)
                    .validate()
                    .unwrap_err();
                assert!(matches!(err, UpscaleError::InvalidArgument { .. }));
            }
        }

        #[test]
        fn sharpness_maps_to_strength() {
            let opts = UpscaleOptions::default().with_sharpness(50.0);
            assert_eq!(opts.sharpen_strength(), Some(0.5));
        }
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str("PNG", None).unwrap(), OutputFormat::Png);
        assert_eq!(
            OutputFormat::from_str("jpg", None).unwrap(),
            OutputFormat::Jpeg { quality: 80 }
        );
        assert_eq!(OutputFormat::Jpeg { quality: 90 }.extension(), "jpg");
        assert!(matches!(
            OutputFormat::from_str("tga", None),
            Err(UpscaleError::UnsupportedFormat { .. })
        ));
    }
}
