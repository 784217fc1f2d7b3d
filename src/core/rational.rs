//! Rational numbers as reported by containers and codecs, plus the
//! normalization rules applied to raw stream metadata before it is trusted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `num/den` fraction (time bases, frame rates, sample aspect ratios).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Value as a float, `None` when the denominator is zero
    pub fn to_f64(self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }

    pub fn reciprocal(self) -> Self {
        Self::new(self.den, self.num)
    }

    /// Cross-compare against another fraction's reciprocal, term by term.
    /// `1/25` is the reciprocal of `25/1`; `2/50` is not.
    pub fn is_reciprocal_of(self, other: Rational) -> bool {
        self.den == other.num && self.num == other.den
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Some encoders write a per-mille codec time base as `N/1` with `N > 1000`.
/// Such time bases get a denominator of 1000.
pub fn fix_codec_time_base(time_base: Rational) -> Rational {
    if time_base.num > 1000 && time_base.den == 1 {
        Rational::new(time_base.num, 1000)
    } else {
        time_base
    }
}

/// Frames per second for a stream.
///
/// The average frame rate is used whenever it is not the exact reciprocal of
/// the stream time base. Otherwise (or when the average rate is unset) the
/// time base reciprocal is used. Returns 0.0 when neither yields a usable rate.
pub fn frame_rate(stream_time_base: Rational, avg_frame_rate: Rational) -> f64 {
    if !stream_time_base.is_reciprocal_of(avg_frame_rate) {
        if let Some(fps) = avg_frame_rate.to_f64().filter(|fps| usable(*fps)) {
            return fps;
        }
    }

    stream_time_base
        .reciprocal()
        .to_f64()
        .filter(|fps| usable(*fps))
        .unwrap_or(0.0)
}

/// Pixel aspect ratio from a codec's sample aspect ratio; 1.0 when unset.
pub fn pixel_aspect_ratio(sample_aspect_ratio: Rational) -> f64 {
    sample_aspect_ratio
        .to_f64()
        .filter(|par| usable(*par))
        .unwrap_or(1.0)
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_from_time_base_when_avg_rate_is_its_reciprocal() {
        let fps = frame_rate(Rational::new(1, 25), Rational::new(25, 1));
        assert_eq!(fps, 25.0);
    }

    #[test]
    fn test_fps_from_avg_rate_when_it_differs_from_time_base() {
        let fps = frame_rate(Rational::new(1, 90000), Rational::new(30000, 1001));
        assert!((fps - 29.97).abs() < 0.001);
    }

    #[test]
    fn test_fps_cross_comparison_is_term_by_term() {
        // 2/50 and 25/1 describe the same rate but are not term-wise reciprocals,
        // so the average rate branch is taken.
        let fps = frame_rate(Rational::new(2, 50), Rational::new(24, 1));
        assert_eq!(fps, 24.0);
    }

    #[test]
    fn test_fps_unset_avg_rate_falls_back_to_time_base() {
        assert_eq!(frame_rate(Rational::new(1, 30), Rational::new(0, 0)), 30.0);
        assert_eq!(frame_rate(Rational::new(1, 30), Rational::new(0, 1)), 30.0);
    }

    #[test]
    fn test_fps_nothing_usable() {
        assert_eq!(frame_rate(Rational::new(0, 0), Rational::new(0, 0)), 0.0);
    }

    #[test]
    fn test_codec_time_base_fix() {
        assert_eq!(fix_codec_time_base(Rational::new(1001, 1)), Rational::new(1001, 1000));
        assert_eq!(fix_codec_time_base(Rational::new(1000, 1)), Rational::new(1000, 1));
        assert_eq!(fix_codec_time_base(Rational::new(1001, 2)), Rational::new(1001, 2));
        assert_eq!(fix_codec_time_base(Rational::new(1, 25)), Rational::new(1, 25));
    }

    #[test]
    fn test_pixel_aspect_ratio_defaults() {
        assert_eq!(pixel_aspect_ratio(Rational::new(0, 1)), 1.0);
        assert_eq!(pixel_aspect_ratio(Rational::new(0, 0)), 1.0);
        assert_eq!(pixel_aspect_ratio(Rational::new(-4, 3)), 1.0);
        assert_eq!(pixel_aspect_ratio(Rational::new(2, 1)), 2.0);
        assert!((pixel_aspect_ratio(Rational::new(16, 15)) - 1.0667).abs() < 0.001);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rational::new(30000, 1001).to_string(), "30000/1001");
    }
}
