//! Z-hop move planning
//!
//! Turns a validated target into the legs the controller confirms one by
//! one. A hop lifts to a ceiling above both endpoints, travels laterally at
//! that height and then descends, so fixtures between the endpoints are
//! cleared.

use alab_gantry_core::{MachineProfile, Position};

/// Height of the lateral travel leg of a hop.
///
/// `hop` above the higher endpoint, clamped to the Z limit.
pub fn hop_ceiling(current_z: f64, target_z: f64, hop: f64, z_limit: f64) -> f64 {
    (current_z.max(target_z) + hop).min(z_limit)
}

/// Legs for a move from `current` to `target`.
///
/// Returns the three hop legs when `z_hop` is requested and the move has a
/// lateral component, otherwise the single direct leg.
pub fn plan_move(
    current: &Position,
    target: &Position,
    z_hop: bool,
    profile: &MachineProfile,
) -> Vec<Position> {
    if !z_hop || current.same_xy(target) {
        return vec![*target];
    }

    let ceiling = hop_ceiling(current.z, target.z, profile.z_hop_height, profile.z_limit);
    vec![
        Position::new(current.x, current.y, ceiling),
        Position::new(target.x, target.y, ceiling),
        *target,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_clamped_to_z_limit() {
        assert_eq!(hop_ceiling(140.0, 10.0, 20.0, 150.0), 150.0);
        assert_eq!(hop_ceiling(5.0, 5.0, 5.0, 150.0), 10.0);
        assert_eq!(hop_ceiling(2.0, 30.0, 5.0, 150.0), 35.0);
    }

    #[test]
    fn test_hop_waypoint_order() {
        let profile = MachineProfile::ender3();
        let legs = plan_move(
            &Position::new(10.0, 10.0, 5.0),
            &Position::new(100.0, 100.0, 5.0),
            true,
            &profile,
        );
        assert_eq!(
            legs,
            vec![
                Position::new(10.0, 10.0, 10.0),
                Position::new(100.0, 100.0, 10.0),
                Position::new(100.0, 100.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_hop_suppressed_without_lateral_motion() {
        let profile = MachineProfile::ender3();
        let legs = plan_move(
            &Position::new(50.0, 50.0, 10.0),
            &Position::new(50.0, 50.0, 80.0),
            true,
            &profile,
        );
        assert_eq!(legs, vec![Position::new(50.0, 50.0, 80.0)]);
    }

    #[test]
    fn test_direct_move_without_hop() {
        let profile = MachineProfile::ender3();
        let legs = plan_move(
            &Position::new(0.0, 0.0, 0.0),
            &Position::new(20.0, 30.0, 4.0),
            false,
            &profile,
        );
        assert_eq!(legs, vec![Position::new(20.0, 30.0, 4.0)]);
    }

    #[test]
    fn test_hop_from_high_start_uses_clamped_ceiling() {
        let profile = MachineProfile {
            z_hop_height: 20.0,
            ..MachineProfile::ender3()
        };
        let legs = plan_move(
            &Position::new(0.0, 0.0, 140.0),
            &Position::new(50.0, 50.0, 10.0),
            true,
            &profile,
        );
        assert_eq!(legs[0], Position::new(0.0, 0.0, 150.0));
        assert_eq!(legs[1], Position::new(50.0, 50.0, 150.0));
    }
}
