use crate::types::CrossfadeCurve;

impl CrossfadeCurve {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            CrossfadeCurve::Linear => clamped,
            CrossfadeCurve::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            CrossfadeCurve::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
        }
    }
}

/// One object's progress towards the assembled pose for a global `mix`.
///
/// An object with `phase` p starts moving once the mix passes `p * stagger`
/// and arrives when the remaining `1 - stagger` has elapsed, so every object
/// sits exactly on a formation at mix 0 and mix 1.
pub(crate) fn staggered_progress(curve: CrossfadeCurve, mix: f32, phase: f32, stagger: f32) -> f32 {
    let stagger = stagger.clamp(0.0, 0.95);
    let start = phase.clamp(0.0, 1.0) * stagger;
    let local = (mix - start) / (1.0 - stagger);
    curve.sample(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_increases_monotonically() {
        let curve = CrossfadeCurve::Linear;
        let mut last = 0.0;
        for step in 0..=10 {
            let sample = curve.sample(step as f32 / 10.0);
            assert!(sample >= last - f32::EPSILON);
            last = sample;
        }
    }

    #[test]
    fn smoothstep_matches_expected_values() {
        let curve = CrossfadeCurve::Smoothstep;
        assert!((curve.sample(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-6);
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_accelerates_then_decelerates() {
        let curve = CrossfadeCurve::EaseInOut;
        let first = curve.sample(0.25);
        let mid = curve.sample(0.5);
        let last = curve.sample(0.75);
        assert!(first < mid);
        assert!(last > mid);
    }

    #[test]
    fn staggered_progress_pins_the_endpoints() {
        for phase in [0.0, 0.3, 0.99] {
            for curve in [CrossfadeCurve::Linear, CrossfadeCurve::Smoothstep] {
                assert_eq!(staggered_progress(curve, 0.0, phase, 0.35), 0.0);
                assert_eq!(staggered_progress(curve, 1.0, phase, 0.35), 1.0);
            }
        }
    }

    #[test]
    fn later_phases_lag_behind() {
        let early = staggered_progress(CrossfadeCurve::Linear, 0.4, 0.0, 0.35);
        let late = staggered_progress(CrossfadeCurve::Linear, 0.4, 1.0, 0.35);
        assert!(early > late);
    }

    #[test]
    fn zero_stagger_follows_the_mix() {
        let progress = staggered_progress(CrossfadeCurve::Linear, 0.42, 0.8, 0.0);
        assert!((progress - 0.42).abs() < 1e-6);
    }
}
