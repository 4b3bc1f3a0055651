use alab_gantry_core::{Axis, MachineProfile, MotionError, Position};
use proptest::prelude::*;

proptest! {
    #[test]
    fn in_range_targets_are_accepted(
        x in 0.0f64..=235.0,
        y in 0.0f64..=235.0,
        z in 0.0f64..=150.0,
    ) {
        let profile = MachineProfile::ender3();
        prop_assert!(profile.check_within_limits(&Position::new(x, y, z)).is_ok());
    }

    #[test]
    fn negative_component_is_rejected(
        axis_idx in 0usize..3,
        bad in -1000.0f64..-1e-9,
    ) {
        let profile = MachineProfile::ender3();
        let axis = Axis::ALL[axis_idx];
        let target = Position::new(10.0, 10.0, 10.0).with(axis, bad);
        let err = profile.check_within_limits(&target).unwrap_err();
        prop_assert_eq!(err, MotionError::OutOfRange { axis, value: bad, limit: profile.limit(axis) });
    }

    #[test]
    fn component_above_limit_is_rejected(
        axis_idx in 0usize..3,
        excess in 1e-9f64..1000.0,
    ) {
        let profile = MachineProfile::ender3();
        let axis = Axis::ALL[axis_idx];
        let bad = profile.limit(axis) + excess;
        let target = Position::new(10.0, 10.0, 10.0).with(axis, bad);
        let is_out_of_range = matches!(
            profile.check_within_limits(&target),
            Err(MotionError::OutOfRange { axis: a, .. }) if a == axis
        );
        prop_assert!(is_out_of_range);
    }
}
