use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Distance under which the current mix snaps onto its target.
const SNAP_EPSILON: f32 = 1e-4;

/// Discrete formation the scene is heading towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixTarget {
    /// Objects scattered through space (mix 0).
    Dispersed,
    /// Objects assembled into the tree (mix 1).
    Assembled,
}

impl MixTarget {
    pub fn value(self) -> f32 {
        match self {
            Self::Dispersed => 0.0,
            Self::Assembled => 1.0,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Dispersed => 0,
            Self::Assembled => 1,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Dispersed => Self::Assembled,
            Self::Assembled => Self::Dispersed,
        }
    }
}

impl TryFrom<u8> for MixTarget {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Dispersed),
            1 => Ok(Self::Assembled),
            other => Err(format!("mix target must be 0 or 1, got {other}")),
        }
    }
}

impl Serialize for MixTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Which input asked for a target change; only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Ui,
    Gesture,
    Upload,
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ui => f.write_str("ui"),
            Self::Gesture => f.write_str("gesture"),
            Self::Upload => f.write_str("upload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixState {
    pub target: MixTarget,
    pub current: f32,
}

/// Owns the discrete target and the eased value the renderer consumes.
///
/// Any number of inputs may write the target; there is exactly one easing
/// process, advanced by [`MixController::tick`].
#[derive(Debug, Clone)]
pub struct MixController {
    state: MixState,
    easing_rate: f32,
    max_step: Duration,
}

impl MixController {
    pub fn new(initial: MixTarget, easing_rate: f32, max_step: Duration) -> Self {
        Self {
            state: MixState {
                target: initial,
                current: initial.value(),
            },
            easing_rate,
            max_step,
        }
    }

    pub fn state(&self) -> MixState {
        self.state
    }

    pub fn target(&self) -> MixTarget {
        self.state.target
    }

    pub fn current(&self) -> f32 {
        self.state.current
    }

    /// Returns `true` when the target actually changed.
    pub fn set_target(&mut self, value: MixTarget, source: TargetSource) -> bool {
        if self.state.target == value {
            return false;
        }
        tracing::debug!(
            %source,
            from = self.state.target.as_u8(),
            to = value.as_u8(),
            current = self.state.current,
            "mix target changed"
        );
        self.state.target = value;
        true
    }

    pub fn toggle_target(&mut self, source: TargetSource) -> MixTarget {
        let next = self.state.target.flipped();
        self.set_target(next, source);
        next
    }

    /// Advances the eased value by one frame and returns it.
    pub fn tick(&mut self, dt: Duration) -> f32 {
        let goal = self.state.target.value();
        let gap = goal - self.state.current;
        if gap.abs() <= SNAP_EPSILON {
            self.state.current = goal;
            return goal;
        }
        let dt = dt.min(self.max_step).as_secs_f32();
        let alpha = 1.0 - (-self.easing_rate * dt).exp();
        self.state.current = (self.state.current + gap * alpha).clamp(0.0, 1.0);
        self.state.current
    }

    /// Jumps both values to `target`.
    pub fn reset(&mut self, target: MixTarget) {
        self.state = MixState {
            target,
            current: target.value(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn controller() -> MixController {
        MixController::new(MixTarget::Assembled, 4.0, Duration::from_millis(100))
    }

    #[test]
    fn starts_assembled_and_settled() {
        let mix = controller();
        assert_eq!(mix.target(), MixTarget::Assembled);
        assert_eq!(mix.current(), 1.0);
    }

    #[test]
    fn set_target_is_idempotent() {
        let mut mix = controller();
        assert!(mix.set_target(MixTarget::Dispersed, TargetSource::Ui));
        mix.tick(FRAME);
        let mut twin = mix.clone();
        assert!(!mix.set_target(MixTarget::Dispersed, TargetSource::Gesture));
        for _ in 0..10 {
            assert_eq!(mix.tick(FRAME), twin.tick(FRAME));
        }
    }

    #[test]
    fn toggle_flips_between_formations() {
        let mut mix = controller();
        assert_eq!(mix.toggle_target(TargetSource::Ui), MixTarget::Dispersed);
        assert_eq!(mix.toggle_target(TargetSource::Ui), MixTarget::Assembled);
    }

    #[test]
    fn converges_and_snaps_onto_target() {
        let mut mix = controller();
        mix.set_target(MixTarget::Dispersed, TargetSource::Ui);
        for _ in 0..600 {
            mix.tick(FRAME);
        }
        assert_eq!(mix.current(), 0.0);
    }

    #[test]
    fn long_stall_is_clamped_to_max_step() {
        let mut stalled = controller();
        let mut capped = controller();
        stalled.set_target(MixTarget::Dispersed, TargetSource::Ui);
        capped.set_target(MixTarget::Dispersed, TargetSource::Ui);
        stalled.tick(Duration::from_secs(5));
        capped.tick(Duration::from_millis(100));
        assert_eq!(stalled.current(), capped.current());
        assert!(stalled.current() > 0.5);
    }

    #[test]
    fn zero_dt_leaves_value_untouched() {
        let mut mix = controller();
        mix.set_target(MixTarget::Dispersed, TargetSource::Ui);
        assert_eq!(mix.tick(Duration::ZERO), 1.0);
    }

    #[test]
    fn reset_jumps_both_values() {
        let mut mix = controller();
        mix.reset(MixTarget::Dispersed);
        assert_eq!(mix.state(), MixState { target: MixTarget::Dispersed, current: 0.0 });
    }

    #[test]
    fn target_serializes_as_number() {
        let json = serde_json::to_string(&MixTarget::Assembled).unwrap();
        assert_eq!(json, "1");
        assert!(MixTarget::try_from(2).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(bool),
        Toggle,
        Tick(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Set),
            Just(Op::Toggle),
            (0u64..250).prop_map(Op::Tick),
        ]
    }

    proptest! {
        #[test]
        fn current_stays_in_unit_interval_and_moves_towards_target(ops in prop::collection::vec(op(), 0..200)) {
            let mut mix = controller();
            for op in ops {
                match op {
                    Op::Set(assembled) => {
                        let target = if assembled { MixTarget::Assembled } else { MixTarget::Dispersed };
                        mix.set_target(target, TargetSource::Ui);
                    }
                    Op::Toggle => {
                        mix.toggle_target(TargetSource::Ui);
                    }
                    Op::Tick(ms) => {
                        let before = mix.current();
                        let goal = mix.target().value();
                        let after = mix.tick(Duration::from_millis(ms));
                        prop_assert!((0.0..=1.0).contains(&after));
                        prop_assert!((goal - after).abs() <= (goal - before).abs() + f32::EPSILON);
                    }
                }
                prop_assert!(matches!(mix.target(), MixTarget::Assembled | MixTarget::Dispersed));
            }
        }
    }
}
