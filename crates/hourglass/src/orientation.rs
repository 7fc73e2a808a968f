//! Which way up the hourglass is. Owned by the host widget, read once per frame.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Orientation {
    #[default]
    Upright,
    Inverted,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upright => write!(f, "Upright"),
            Self::Inverted => write!(f, "Inverted"),
        }
    }
}

impl Orientation {
    /// Row step toward the gravity target: `+1` pulls toward increasing `y`.
    #[must_use]
    pub fn gravity(self) -> i32 {
        match self {
            Self::Upright => 1,
            Self::Inverted => -1,
        }
    }

    #[must_use]
    pub fn from_upright(upright: bool) -> Self {
        if upright {
            Self::Upright
        } else {
            Self::Inverted
        }
    }

    /// Bucket a dial angle into half-turns. The widget snaps in 180° steps,
    /// so an angle rounds to the nearest half-turn and its parity decides.
    /// Ties round toward +∞, so -90° lands on 0 like a browser `Math.round`.
    #[must_use]
    pub fn from_rotation_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self::Upright;
        }
        let half_turns = (degrees / 180.0 + 0.5).floor();
        if half_turns.rem_euclid(2.0) == 0.0 {
            Self::Upright
        } else {
            Self::Inverted
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Upright => Self::Inverted,
            Self::Inverted => Self::Upright,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn gravity_signs() {
        assert_eq!(Orientation::Upright.gravity(), 1);
        assert_eq!(Orientation::Inverted.gravity(), -1);
    }

    #[test]
    fn rotation_half_turns() {
        assert_eq!(Orientation::from_rotation_degrees(0.0), Orientation::Upright);
        assert_eq!(Orientation::from_rotation_degrees(180.0), Orientation::Inverted);
        assert_eq!(Orientation::from_rotation_degrees(360.0), Orientation::Upright);
        assert_eq!(Orientation::from_rotation_degrees(-180.0), Orientation::Inverted);
        assert_eq!(Orientation::from_rotation_degrees(85.0), Orientation::Upright);
        assert_eq!(Orientation::from_rotation_degrees(95.0), Orientation::Inverted);
        assert_eq!(Orientation::from_rotation_degrees(-95.0), Orientation::Inverted);
        // Ties go up: 90 -> 1, -90 -> 0, -450 -> -2.
        assert_eq!(Orientation::from_rotation_degrees(90.0), Orientation::Inverted);
        assert_eq!(Orientation::from_rotation_degrees(-90.0), Orientation::Upright);
        assert_eq!(Orientation::from_rotation_degrees(-270.0), Orientation::Inverted);
        assert_eq!(Orientation::from_rotation_degrees(-450.0), Orientation::Upright);
    }

    #[test]
    fn non_finite_rotation_is_upright() {
        assert_eq!(Orientation::from_rotation_degrees(f64::NAN), Orientation::Upright);
        assert_eq!(Orientation::from_rotation_degrees(f64::INFINITY), Orientation::Upright);
    }

    #[test]
    fn toggle_and_display() {
        assert_eq!(Orientation::Upright.toggled(), Orientation::Inverted);
        assert_eq!(Orientation::Inverted.toggled().toggled(), Orientation::Inverted);
        assert_eq!(format!("{}", Orientation::Inverted), "Inverted");
        assert_eq!(Orientation::from_upright(false), Orientation::Inverted);
    }

    proptest! {
        #[test]
        fn prop_extra_full_turn_keeps_orientation(half_turns in -1000i32..1000) {
            let deg = f64::from(half_turns) * 180.0;
            let a = Orientation::from_rotation_degrees(deg);
            let b = Orientation::from_rotation_degrees(deg + 360.0);
            prop_assert_eq!(a, b);
            let c = Orientation::from_rotation_degrees(deg + 180.0);
            prop_assert_eq!(c, a.toggled());
        }
    }
}
