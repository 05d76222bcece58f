//! UAV motion model.
//!
//! Spawns UAVs at random points inside the radar zone and random-walks them
//! each motion tick, nudging any UAV whose proposed move would leave the
//! zone back toward the center.

use std::f64::consts::TAU;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use uav_domain::{Uav, Zone, meters_per_degree};

use crate::config::SimulationConfig;

/// Maximum per-tick latitude/longitude jitter in degrees.
pub const POSITION_JITTER_DEG: f64 = 0.0025;

/// Maximum per-tick altitude jitter in meters.
pub const ALTITUDE_JITTER_M: f64 = 2.5;

/// Per-axis correction applied when a move would leave the zone, in degrees.
pub const BOUNDARY_NUDGE_DEG: f64 = 0.002;

/// Spawn altitudes fall within this many meters of the radar altitude.
pub const SPAWN_ALTITUDE_SPREAD_M: f64 = 50.0;

const MAX_SPAWN_ATTEMPTS: usize = 8;

/// Random event odds applied by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleOdds {
    pub dangerous_at_spawn: f64,
    pub threat_flip: f64,
    pub retire: f64,
}

impl Default for LifecycleOdds {
    fn default() -> Self {
        Self {
            dangerous_at_spawn: 0.5,
            threat_flip: 0.05,
            retire: 0.03,
        }
    }
}

/// Spawn/step/retire rules for UAVs in a single zone.
#[derive(Debug, Clone)]
pub struct MotionModel {
    zone: Zone,
    odds: LifecycleOdds,
}

impl MotionModel {
    pub const fn new(zone: Zone, odds: LifecycleOdds) -> Self {
        Self { zone, odds }
    }

    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.zone,
            LifecycleOdds {
                dangerous_at_spawn: config.dangerous_probability,
                threat_flip: config.threat_flip_probability,
                retire: config.retire_probability,
            },
        )
    }

    pub const fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Create a UAV at a uniformly random bearing and radial distance from
    /// the zone center.
    ///
    /// The polar offset is projected with an equirectangular approximation,
    /// which can land a hair outside the radius right at the edge; such draws
    /// are repeated so the result is always strictly inside the zone.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R, now: DateTime<Utc>) -> Uav {
        let id = uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid();

        let (latitude, longitude) = (0..MAX_SPAWN_ATTEMPTS)
            .map(|_| self.random_point(rng))
            .find(|&(lat, lon)| self.zone.distance_from_center(lat, lon) < self.zone.radius)
            .unwrap_or((self.zone.latitude, self.zone.longitude));

        let altitude = self.zone.altitude
            + rng.gen_range(-SPAWN_ALTITUDE_SPREAD_M..=SPAWN_ALTITUDE_SPREAD_M);

        Uav {
            id,
            latitude,
            longitude,
            altitude,
            timestamp: now,
            is_dangerous: rng.gen_bool(self.odds.dangerous_at_spawn),
        }
    }

    fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let bearing = rng.gen_range(0.0..TAU);
        let distance = rng.gen_range(0.0..self.zone.radius);

        let deg = meters_per_degree();
        let lat_offset = distance / deg * bearing.cos();
        let lon_offset = distance / (deg * self.zone.latitude.to_radians().cos()) * bearing.sin();

        (self.zone.latitude + lat_offset, self.zone.longitude + lon_offset)
    }

    /// Advance a UAV by one motion tick.
    ///
    /// The proposed position is checked against the zone radius. When it
    /// falls outside, it is dropped and the original position is moved a
    /// fixed [`BOUNDARY_NUDGE_DEG`] per axis in the direction from the
    /// proposed position toward the center. Altitude jitter applies either
    /// way.
    ///
    /// The new timestamp is at least one millisecond past the previous one,
    /// even when `now` has not advanced at millisecond resolution.
    pub fn step<R: Rng + ?Sized>(&self, uav: &Uav, rng: &mut R, now: DateTime<Utc>) -> Uav {
        let mut latitude =
            uav.latitude + rng.gen_range(-POSITION_JITTER_DEG..=POSITION_JITTER_DEG);
        let mut longitude =
            uav.longitude + rng.gen_range(-POSITION_JITTER_DEG..=POSITION_JITTER_DEG);
        let altitude = uav.altitude + rng.gen_range(-ALTITUDE_JITTER_M..=ALTITUDE_JITTER_M);

        if self.zone.distance_from_center(latitude, longitude) > self.zone.radius {
            latitude = uav.latitude + BOUNDARY_NUDGE_DEG * direction(latitude, self.zone.latitude);
            longitude =
                uav.longitude + BOUNDARY_NUDGE_DEG * direction(longitude, self.zone.longitude);
        }

        let is_dangerous = if rng.gen_bool(self.odds.threat_flip) {
            !uav.is_dangerous
        } else {
            uav.is_dangerous
        };

        Uav {
            id: uav.id,
            latitude,
            longitude,
            altitude,
            timestamp: now.max(uav.timestamp + TimeDelta::milliseconds(1)),
            is_dangerous,
        }
    }

    /// Lifecycle roll made after each step.
    pub fn should_retire<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.odds.retire)
    }
}

/// Sign of `to - from`, zero when equal.
fn direction(from: f64, to: f64) -> f64 {
    let delta = to - from;
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use uuid::Uuid;

    fn model() -> MotionModel {
        MotionModel::new(Zone::default(), LifecycleOdds::default())
    }

    #[test]
    fn test_spawn_fields_are_valid() {
        let model = model();
        let zone = *model.zone();
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();

        for _ in 0..5_000 {
            let uav = model.spawn(&mut rng, now);
            assert!(uav.distance_to_center(&zone) < zone.radius);
            assert!((uav.altitude - zone.altitude).abs() <= SPAWN_ALTITUDE_SPREAD_M);
            assert_eq!(uav.timestamp, now);
            assert_eq!(uav.id.get_version_num(), 4);
        }
    }

    #[test]
    fn test_spawn_covers_the_whole_disc() {
        let model = model();
        let zone = *model.zone();
        let mut rng = StdRng::seed_from_u64(2);
        let far = (0..2_000)
            .map(|_| model.spawn(&mut rng, Utc::now()))
            .filter(|uav| uav.distance_to_center(&zone) > zone.radius * 0.9)
            .count();
        assert!(far > 0);
    }

    #[test]
    fn test_spawn_danger_odds_are_honoured() {
        let zone = Zone::default();
        let mut rng = StdRng::seed_from_u64(3);

        let always = MotionModel::new(
            zone,
            LifecycleOdds {
                dangerous_at_spawn: 1.0,
                ..LifecycleOdds::default()
            },
        );
        assert!((0..50).all(|_| always.spawn(&mut rng, Utc::now()).is_dangerous));

        let never = MotionModel::new(
            zone,
            LifecycleOdds {
                dangerous_at_spawn: 0.0,
                ..LifecycleOdds::default()
            },
        );
        assert!((0..50).all(|_| !never.spawn(&mut rng, Utc::now()).is_dangerous));
    }

    #[test]
    fn test_step_inside_zone_stays_within_jitter() {
        let model = model();
        let zone = *model.zone();
        let mut rng = StdRng::seed_from_u64(4);
        let uav = Uav {
            id: Uuid::new_v4(),
            latitude: zone.latitude,
            longitude: zone.longitude,
            altitude: zone.altitude,
            timestamp: Utc::now(),
            is_dangerous: false,
        };

        for _ in 0..1_000 {
            let next = model.step(&uav, &mut rng, Utc::now());
            assert_eq!(next.id, uav.id);
            assert!((next.latitude - uav.latitude).abs() <= POSITION_JITTER_DEG);
            assert!((next.longitude - uav.longitude).abs() <= POSITION_JITTER_DEG);
            assert!((next.altitude - uav.altitude).abs() <= ALTITUDE_JITTER_M);
        }
    }

    #[test]
    fn test_step_outside_zone_nudges_toward_center() {
        let model = model();
        let zone = *model.zone();
        let mut rng = StdRng::seed_from_u64(5);
        // ~5 km north-east: every proposal is out of range
        let uav = Uav {
            id: Uuid::new_v4(),
            latitude: zone.latitude + 0.05,
            longitude: zone.longitude + 0.05,
            altitude: zone.altitude,
            timestamp: Utc::now(),
            is_dangerous: false,
        };

        let next = model.step(&uav, &mut rng, Utc::now());
        assert!((next.latitude - (uav.latitude - BOUNDARY_NUDGE_DEG)).abs() < 1e-12);
        assert!((next.longitude - (uav.longitude - BOUNDARY_NUDGE_DEG)).abs() < 1e-12);
        assert!((next.altitude - uav.altitude).abs() <= ALTITUDE_JITTER_M);
    }

    #[test]
    fn test_step_timestamp_strictly_increases() {
        let model = model();
        let mut rng = StdRng::seed_from_u64(9);
        let now = Utc::now();
        let uav = model.spawn(&mut rng, now);

        // Same instant as the spawn
        let next = model.step(&uav, &mut rng, now);
        assert_eq!(next.timestamp, now + TimeDelta::milliseconds(1));

        // Clock behind the last stamp
        let again = model.step(&next, &mut rng, now);
        assert!(again.timestamp > next.timestamp);

        let later = now + TimeDelta::seconds(2);
        assert_eq!(model.step(&again, &mut rng, later).timestamp, later);
    }

    #[test]
    fn test_stray_uav_returns_to_zone() {
        let model = model();
        let zone = *model.zone();
        let mut rng = StdRng::seed_from_u64(6);
        let mut uav = Uav {
            id: Uuid::new_v4(),
            latitude: zone.latitude - 0.04,
            longitude: zone.longitude + 0.03,
            altitude: zone.altitude,
            timestamp: Utc::now(),
            is_dangerous: false,
        };

        for _ in 0..200 {
            uav = model.step(&uav, &mut rng, Utc::now());
        }
        assert!(uav.distance_to_center(&zone) <= zone.radius + 300.0);
    }

    #[test]
    fn test_boundary_containment_over_many_ticks() {
        let model = model();
        let zone = *model.zone();
        // One nudge moves at most ~284 m at this latitude
        let tolerance = 300.0;

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut fleet: Vec<Uav> = (0..15)
                .map(|_| model.spawn(&mut rng, Utc::now()))
                .collect();
            for _ in 0..500 {
                for uav in &mut fleet {
                    *uav = model.step(uav, &mut rng, Utc::now());
                    assert!(uav.distance_to_center(&zone) <= zone.radius + tolerance);
                }
            }
        }
    }

    #[test]
    fn test_threat_flip_odds() {
        let zone = Zone::default();
        let mut rng = StdRng::seed_from_u64(7);
        let uav = model().spawn(&mut rng, Utc::now());

        let flipper = MotionModel::new(
            zone,
            LifecycleOdds {
                threat_flip: 1.0,
                ..LifecycleOdds::default()
            },
        );
        assert_eq!(flipper.step(&uav, &mut rng, Utc::now()).is_dangerous, !uav.is_dangerous);

        let steady = MotionModel::new(
            zone,
            LifecycleOdds {
                threat_flip: 0.0,
                ..LifecycleOdds::default()
            },
        );
        assert_eq!(steady.step(&uav, &mut rng, Utc::now()).is_dangerous, uav.is_dangerous);
    }

    #[test]
    fn test_retire_odds() {
        let zone = Zone::default();
        let mut rng = StdRng::seed_from_u64(8);
        let doomed = MotionModel::new(
            zone,
            LifecycleOdds {
                retire: 1.0,
                ..LifecycleOdds::default()
            },
        );
        let immortal = MotionModel::new(
            zone,
            LifecycleOdds {
                retire: 0.0,
                ..LifecycleOdds::default()
            },
        );
        assert!(doomed.should_retire(&mut rng));
        assert!(!immortal.should_retire(&mut rng));
    }

    #[test]
    fn test_direction() {
        assert!((direction(1.0, 2.0) - 1.0).abs() < f64::EPSILON);
        assert!((direction(2.0, 1.0) + 1.0).abs() < f64::EPSILON);
        assert!(direction(1.0, 1.0).abs() < f64::EPSILON);
    }
}
