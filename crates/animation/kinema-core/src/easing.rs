//! Easing functions: pure maps from normalized time `t` in [0, 1] to eased
//! progress, exact at both endpoints.
//!
//! Variants can be constructed directly or looked up by the names the
//! authoring layer uses (`"power2.out"`, `"back.out(1.7)"`,
//! `"elastic.out(1, 0.5)"`, ...). Unknown names fail with
//! [`AnimationError::UnknownEasing`].

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

pub const DEFAULT_BACK_OVERSHOOT: f32 = 1.70158;
pub const DEFAULT_ELASTIC_AMPLITUDE: f32 = 1.0;
pub const DEFAULT_ELASTIC_PERIOD: f32 = 0.3;

/// Easing function selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    /// Quadratic ease-out (`power1.out`).
    QuadOut,
    /// Cubic ease-out (`power2.out`).
    CubicOut,
    /// Quartic ease-out (`power3.out`).
    QuartOut,
    /// Sinusoidal ease-in-out (`sine.inOut`), used for ambient loops.
    SineInOut,
    /// Overshooting ease-out (`back.out`), used for entrance "pop" effects.
    BackOut { overshoot: f32 },
    /// Elastic ease-out (`elastic.out`).
    ElasticOut { amplitude: f32, period: f32 },
    /// CSS-style cubic bezier timing with control points (x1, y1, x2, y2).
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Easing {
    /// Overshooting ease-out with the conventional overshoot constant.
    pub fn back_out() -> Self {
        Easing::BackOut {
            overshoot: DEFAULT_BACK_OVERSHOOT,
        }
    }

    /// Elastic ease-out with the conventional amplitude/period.
    pub fn elastic_out() -> Self {
        Easing::ElasticOut {
            amplitude: DEFAULT_ELASTIC_AMPLITUDE,
            period: DEFAULT_ELASTIC_PERIOD,
        }
    }

    /// Apply the easing to a progress value. `t` is clamped to [0, 1] and the
    /// endpoints are always exact: `apply(0) == 0` and `apply(1) == 1`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::QuartOut => 1.0 - (1.0 - t).powi(4),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::BackOut { overshoot } => {
                let c1 = overshoot;
                let c3 = c1 + 1.0;
                let u = t - 1.0;
                1.0 + c3 * u * u * u + c1 * u * u
            }
            Easing::ElasticOut { amplitude, period } => {
                elastic_out(t, amplitude.max(1.0), period.max(1e-4))
            }
            Easing::CubicBezier { x1, y1, x2, y2 } => bezier_ease(t, x1, y1, x2, y2),
        }
    }

    /// Look up an easing by the authoring-layer name, e.g. `"power2.out"`,
    /// `"sine.inOut"`, `"back.out(1.7)"`, `"elastic.out(1, 0.5)"` or
    /// `"cubic-bezier(0.25, 0.1, 0.25, 1)"`.
    pub fn from_name(name: &str) -> Result<Self, AnimationError> {
        let unknown = || AnimationError::UnknownEasing {
            name: name.to_string(),
        };
        let trimmed = name.trim();
        let (base, args) = split_args(trimmed).ok_or_else(unknown)?;
        let arg = |i: usize, default: f32| args.get(i).copied().unwrap_or(default);
        match base {
            "none" | "linear" => Ok(Easing::Linear),
            "power1.out" | "quad.out" => Ok(Easing::QuadOut),
            "power2.out" | "cubic.out" => Ok(Easing::CubicOut),
            "power3.out" | "quart.out" => Ok(Easing::QuartOut),
            "sine.inOut" => Ok(Easing::SineInOut),
            "back.out" => Ok(Easing::BackOut {
                overshoot: arg(0, DEFAULT_BACK_OVERSHOOT),
            }),
            "elastic.out" => Ok(Easing::ElasticOut {
                amplitude: arg(0, DEFAULT_ELASTIC_AMPLITUDE),
                period: arg(1, DEFAULT_ELASTIC_PERIOD),
            }),
            "cubic-bezier" => {
                if args.len() != 4 {
                    return Err(unknown());
                }
                Ok(Easing::CubicBezier {
                    x1: args[0],
                    y1: args[1],
                    x2: args[2],
                    y2: args[3],
                })
            }
            _ => Err(unknown()),
        }
    }
}

/// Split `"base(a, b)"` into the base name and parsed numeric arguments.
/// A bare name yields an empty argument list.
fn split_args(name: &str) -> Option<(&str, Vec<f32>)> {
    match name.split_once('(') {
        None => Some((name, Vec::new())),
        Some((base, rest)) => {
            let inner = rest.strip_suffix(')')?;
            let mut args = Vec::new();
            for part in inner.split(',') {
                args.push(part.trim().parse::<f32>().ok()?);
            }
            Some((base, args))
        }
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    let two_pi = 2.0 * PI;
    let s = period / two_pi * (1.0 / amplitude).asin();
    amplitude * 2f32.powf(-10.0 * t) * ((t - s) * two_pi / period).sin() + 1.0
}

/// CSS cubic-bezier timing: invert the x bezier by binary search, then
/// evaluate y at the found parameter. Assumes monotonic x for x1/x2 in [0,1].
fn bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(x1, x2, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(y1, y2, mid)
}

/// Cubic bezier with implicit endpoints 0 and 1, in Horner form.
#[inline]
fn cubic_bezier(p1: f32, p2: f32, t: f32) -> f32 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Easing] = &[
        Easing::Linear,
        Easing::QuadOut,
        Easing::CubicOut,
        Easing::QuartOut,
        Easing::SineInOut,
        Easing::BackOut { overshoot: 1.70158 },
        Easing::ElasticOut {
            amplitude: 1.0,
            period: 0.5,
        },
        Easing::CubicBezier {
            x1: 0.25,
            y1: 0.1,
            x2: 0.25,
            y2: 1.0,
        },
    ];

    #[test]
    fn endpoints_exact_for_all_variants() {
        for e in ALL {
            assert_eq!(e.apply(0.0), 0.0, "{e:?} at 0");
            assert_eq!(e.apply(1.0), 1.0, "{e:?} at 1");
            // Out-of-range inputs clamp.
            assert_eq!(e.apply(-0.5), 0.0, "{e:?} below 0");
            assert_eq!(e.apply(2.0), 1.0, "{e:?} above 1");
        }
    }

    #[test]
    fn back_out_overshoots_then_settles() {
        let e = Easing::back_out();
        let near_end = e.apply(0.8);
        assert!(near_end > 1.0, "back.out should overshoot, got {near_end}");
        assert_eq!(e.apply(1.0), 1.0);
    }

    #[test]
    fn quad_out_is_monotone() {
        let e = Easing::QuadOut;
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = e.apply(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn from_name_parses_plain_and_parameterized() {
        assert_eq!(Easing::from_name("linear").unwrap(), Easing::Linear);
        assert_eq!(Easing::from_name("power2.out").unwrap(), Easing::CubicOut);
        assert_eq!(Easing::from_name("sine.inOut").unwrap(), Easing::SineInOut);
        assert_eq!(
            Easing::from_name("back.out(1.7)").unwrap(),
            Easing::BackOut { overshoot: 1.7 }
        );
        assert_eq!(
            Easing::from_name("elastic.out(1, 0.5)").unwrap(),
            Easing::ElasticOut {
                amplitude: 1.0,
                period: 0.5
            }
        );
        assert_eq!(
            Easing::from_name("cubic-bezier(0.25, 0.1, 0.25, 1)").unwrap(),
            Easing::CubicBezier {
                x1: 0.25,
                y1: 0.1,
                x2: 0.25,
                y2: 1.0
            }
        );
    }

    #[test]
    fn from_name_rejects_unknown() {
        let err = Easing::from_name("bounce.inOut").unwrap_err();
        assert_eq!(
            err,
            AnimationError::UnknownEasing {
                name: "bounce.inOut".to_string()
            }
        );
        assert!(Easing::from_name("back.out(nope)").is_err());
        assert!(Easing::from_name("cubic-bezier(0.1, 0.2)").is_err());
    }
}
