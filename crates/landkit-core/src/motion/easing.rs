//! Pure easing functions for tweens and smooth scrolling
//!
//! Provides mathematical easing functions that map input [0, 1] to output [0, 1]
//! with various acceleration curves. Names follow GSAP (`expo.out`,
//! `power2.out`) and CSS (`ease-out`, `cubic-bezier(...)`) so configuration
//! can be copied from either world.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Easing curve applied to animation progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EasingType {
    /// Jump to the end value when the animation completes
    None,
    Linear,
    /// 1 - (1-t)³, GSAP `power2.out`
    #[default]
    Cubic,
    /// 1 - (1-t)⁵, GSAP `power4.out`
    Quintic,
    /// 1 - 2^(-10t), GSAP `expo.out`
    ExpoOut,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier(f64, f64, f64, f64),
}

impl EasingType {
    /// Apply the easing function to a progress value
    ///
    /// # Arguments
    /// * `t` - Progress value in range [0, 1]
    ///
    /// # Returns
    /// Eased value in range [0, 1] (bezier curves may overshoot)
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            EasingType::None => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            EasingType::Linear => t,
            EasingType::Cubic => cubic_ease_out(t),
            EasingType::Quintic => quintic_ease_out(t),
            EasingType::ExpoOut => exponential_ease_out(t),
            EasingType::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

/// Cubic ease-out: f(t) = 1 - (1-t)³
#[inline]
fn cubic_ease_out(t: f64) -> f64 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Quintic ease-out: f(t) = 1 - (1-t)⁵
#[inline]
fn quintic_ease_out(t: f64) -> f64 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv * inv * inv
}

/// Exponential ease-out: f(t) = 1 - 2^(-10t)
#[inline]
fn exponential_ease_out(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f64.powf(-10.0 * t)
    }
}

/// Evaluate a CSS cubic-bezier timing function at `x`
///
/// Solves for the curve parameter with Newton's method and falls back to
/// bisection when the slope is too flat.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        return x;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |t: f64| ((ax * t + bx) * t + cx) * t;
    let sample_y = |t: f64| ((ay * t + by) * t + cy) * t;
    let slope_x = |t: f64| (3.0 * ax * t + 2.0 * bx) * t + cx;

    const EPSILON: f64 = 1e-7;

    let mut t = x;
    for _ in 0..8 {
        let err = sample_x(t) - x;
        if err.abs() < EPSILON {
            return sample_y(t);
        }
        let slope = slope_x(t);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    while hi - lo > EPSILON {
        let value = sample_x(t);
        if (value - x).abs() < EPSILON {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    sample_y(t)
}

fn parse_bezier(args: &str) -> Option<EasingType> {
    let values: Vec<f64> = args
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        // x coordinates must stay inside [0, 1] for the curve to be a function
        [x1, y1, x2, y2] if (0.0..=1.0).contains(x1) && (0.0..=1.0).contains(x2) => {
            Some(EasingType::CubicBezier(*x1, *y1, *x2, *y2))
        }
        _ => None,
    }
}

impl FromStr for EasingType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let easing = match name.as_str() {
            "instant" | "step-end" => Some(EasingType::None),
            "none" | "linear" => Some(EasingType::Linear),
            "cubic" | "power2.out" => Some(EasingType::Cubic),
            "quintic" | "power4.out" => Some(EasingType::Quintic),
            "expo.out" | "exponential" => Some(EasingType::ExpoOut),
            "ease" => Some(EasingType::CubicBezier(0.25, 0.1, 0.25, 1.0)),
            "ease-in" => Some(EasingType::CubicBezier(0.42, 0.0, 1.0, 1.0)),
            "ease-out" => Some(EasingType::CubicBezier(0.0, 0.0, 0.58, 1.0)),
            "ease-in-out" => Some(EasingType::CubicBezier(0.42, 0.0, 0.58, 1.0)),
            other => other
                .strip_prefix("cubic-bezier(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(parse_bezier),
        };
        easing.ok_or_else(|| crate::Error::Config(format!("unknown easing '{}'", s)))
    }
}

impl fmt::Display for EasingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EasingType::None => f.write_str("instant"),
            EasingType::Linear => f.write_str("linear"),
            EasingType::Cubic => f.write_str("power2.out"),
            EasingType::Quintic => f.write_str("power4.out"),
            EasingType::ExpoOut => f.write_str("expo.out"),
            EasingType::CubicBezier(x1, y1, x2, y2) => {
                write!(f, "cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        }
    }
}

impl Serialize for EasingType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

// Accept GSAP or CSS easing names
impl<'de> Deserialize<'de> for EasingType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct EasingVisitor;

        impl<'de> Visitor<'de> for EasingVisitor {
            type Value = EasingType;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an easing name such as \"expo.out\" or \"cubic-bezier(0.23, 1, 0.32, 1)\"")
            }

            fn visit_str<E>(self, value: &str) -> Result<EasingType, E>
            where
                E: de::Error,
            {
                value.parse().map_err(|e: crate::Error| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(EasingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAROUSEL_CURVE: EasingType = EasingType::CubicBezier(0.23, 1.0, 0.32, 1.0);

    #[test]
    fn test_easing_boundaries() {
        for easing in [
            EasingType::None,
            EasingType::Linear,
            EasingType::Cubic,
            EasingType::Quintic,
            EasingType::ExpoOut,
            CAROUSEL_CURVE,
        ] {
            // t=0 should give 0 (except None which jumps)
            if easing != EasingType::None {
                assert!((easing.apply(0.0) - 0.0).abs() < 0.001, "{:?} at t=0", easing);
            }
            // t=1 should give 1
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{:?} at t=1", easing);
        }
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in [
            EasingType::Linear,
            EasingType::Cubic,
            EasingType::Quintic,
            EasingType::ExpoOut,
            CAROUSEL_CURVE,
        ] {
            let mut prev = 0.0;
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let v = easing.apply(t);
                assert!(v >= prev - 1e-9, "{:?} not monotonic at t={}", easing, t);
                prev = v;
            }
        }
    }

    #[test]
    fn test_linear_bezier_is_identity() {
        let linear = EasingType::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 1..10 {
            let t = i as f64 / 10.0;
            assert!((linear.apply(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ease_out_front_loads_progress() {
        assert!(EasingType::ExpoOut.apply(0.2) > 0.7);
        assert!(CAROUSEL_CURVE.apply(0.3) > 0.7);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("expo.out".parse::<EasingType>().unwrap(), EasingType::ExpoOut);
        assert_eq!("none".parse::<EasingType>().unwrap(), EasingType::Linear);
        assert_eq!(
            "cubic-bezier(0.23, 1, 0.32, 1)".parse::<EasingType>().unwrap(),
            CAROUSEL_CURVE
        );
        assert!("cubic-bezier(1.5, 0, 0, 1)".parse::<EasingType>().is_err());
        assert!("wobble".parse::<EasingType>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for easing in [EasingType::Quintic, EasingType::ExpoOut, CAROUSEL_CURVE] {
            assert_eq!(easing.to_string().parse::<EasingType>().unwrap(), easing);
        }
    }
}
