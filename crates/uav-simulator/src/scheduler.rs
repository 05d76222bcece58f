//! Simulation scheduler.
//!
//! [`Simulator`] owns the motion model, the RNG and the clock, and holds the
//! shared store and broadcaster. It drives two cycles: growth (maybe spawn a
//! UAV) and motion (step every UAV, maybe retire it). Both cycles run on one
//! task so store mutations are serialized.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};
use uav_domain::{Uav, UavEvent};
use uuid::Uuid;

use crate::broadcast::{Broadcaster, SharedBroadcaster};
use crate::clock::{Clock, SystemClock};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::motion::MotionModel;
use crate::store::{SharedUavStore, UavStore};

/// Outcome of one motion tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionReport {
    pub updated: usize,
    pub removed: Vec<Uuid>,
}

/// Owner of all mutable simulation state.
pub struct Simulator {
    config: SimulationConfig,
    model: MotionModel,
    store: SharedUavStore,
    broadcaster: SharedBroadcaster,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    /// UAVs whose next lifecycle roll is forced to retire
    doomed: HashSet<Uuid>,
}

impl Simulator {
    /// Build a simulator on the wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a simulator on an injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_clock(config: SimulationConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(UavStore::new(config.max_population));
        let broadcaster = Arc::new(Broadcaster::new(store.clone(), config.subscriber_buffer));
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            model: MotionModel::from_config(&config),
            config,
            store,
            broadcaster,
            clock,
            rng,
            doomed: HashSet::new(),
        })
    }

    pub fn store(&self) -> SharedUavStore {
        self.store.clone()
    }

    pub fn broadcaster(&self) -> SharedBroadcaster {
        self.broadcaster.clone()
    }

    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Spawn the initial population. Call once, before the cycles start.
    ///
    /// # Errors
    ///
    /// Propagates store admission failures.
    pub fn seed_population(&mut self) -> Result<Vec<Uav>> {
        info!(count = self.config.initial_population, "Seeding initial UAV population");
        (0..self.config.initial_population)
            .map(|_| self.spawn_uav())
            .collect()
    }

    /// Spawn one UAV, admit it and announce it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PopulationFull`](crate::SimError::PopulationFull)
    /// or a duplicate-id error from the store; nothing is published then.
    pub fn spawn_uav(&mut self) -> Result<Uav> {
        let uav = self.model.spawn(&mut self.rng, self.clock.now());
        self.store.admit(uav.clone())?;
        self.broadcaster.publish(&UavEvent::Updated(uav.clone()));
        info!(uav = %uav.id, dangerous = uav.is_dangerous, "UAV spawned");
        Ok(uav)
    }

    /// One growth cycle: below the population cap, spawn with the configured
    /// probability.
    ///
    /// # Errors
    ///
    /// Propagates [`spawn_uav`](Self::spawn_uav) failures.
    pub fn growth_tick(&mut self) -> Result<Option<Uav>> {
        if self.store.is_full() || !self.rng.gen_bool(self.config.spawn_probability) {
            return Ok(None);
        }
        self.spawn_uav().map(Some)
    }

    /// One motion cycle over the UAVs present when the tick starts.
    pub fn motion_tick(&mut self) -> MotionReport {
        let now = self.clock.now();
        let mut report = MotionReport::default();

        for uav in self.store.all() {
            let moved = self.model.step(&uav, &mut self.rng, now);
            if let Err(err) = self.store.insert(moved.clone()) {
                warn!(uav = %uav.id, error = %err, "Failed to persist UAV step");
                continue;
            }
            self.broadcaster.publish(&UavEvent::Updated(moved));
            report.updated += 1;

            let rolled = self.model.should_retire(&mut self.rng);
            let forced = self.doomed.remove(&uav.id);
            if (rolled || forced) && self.retire(uav.id) {
                report.removed.push(uav.id);
            }
        }

        report
    }

    /// Force the lifecycle roll for `id` to retire it on the next motion
    /// tick, after its final update. Returns `false` for unknown ids.
    pub fn schedule_retirement(&mut self, id: Uuid) -> bool {
        if self.store.get(&id).is_none() {
            return false;
        }
        self.doomed.insert(id)
    }

    /// Remove a UAV and announce the removal. Absent ids are a no-op and
    /// publish nothing.
    pub fn retire(&mut self, id: Uuid) -> bool {
        self.doomed.remove(&id);
        if self.store.remove(&id).is_none() {
            return false;
        }
        self.broadcaster.publish(&UavEvent::Removed(id));
        info!(uav = %id, "UAV removed");
        true
    }

    /// Run both cycles forever. The first firing of each cycle is one period
    /// after the call.
    pub async fn run(mut self) {
        let growth_period = self.config.growth_period;
        let motion_period = self.config.motion_period;
        let mut growth = interval_at(Instant::now() + growth_period, growth_period);
        let mut motion = interval_at(Instant::now() + motion_period, motion_period);
        growth.set_missed_tick_behavior(MissedTickBehavior::Delay);
        motion.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            growth_ms = growth_period.as_millis(),
            motion_ms = motion_period.as_millis(),
            population = self.store.len(),
            "Simulation cycles started"
        );

        loop {
            tokio::select! {
                _ = growth.tick() => match self.growth_tick() {
                    Ok(Some(uav)) => debug!(
                        uav = %uav.id,
                        population = self.store.len(),
                        "Growth tick spawned"
                    ),
                    Ok(None) => debug!(population = self.store.len(), "Growth tick idle"),
                    Err(err) => warn!(error = %err, "Growth tick failed"),
                },
                _ = motion.tick() => {
                    let report = self.motion_tick();
                    debug!(
                        updated = report.updated,
                        removed = report.removed.len(),
                        subscribers = self.broadcaster.subscriber_count(),
                        "Motion tick complete"
                    );
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
