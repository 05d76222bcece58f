//! In-memory UAV store.
//!
//! The store is the single source of truth for which UAVs exist right now.
//! Every read hands out owned clones taken under the lock, so callers never
//! observe an entry halfway through an update.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uav_domain::{DomainError, Uav};
use uuid::Uuid;

use crate::error::{Result, SimError};

/// Shared store handle
pub type SharedUavStore = Arc<UavStore>;

/// Capacity-bounded map of UAV id to UAV state.
///
/// Ordered by id so that enumeration, and therefore a seeded run, is
/// reproducible.
#[derive(Debug)]
pub struct UavStore {
    uavs: RwLock<BTreeMap<Uuid, Uav>>,
    max_population: usize,
}

impl UavStore {
    pub fn new(max_population: usize) -> Self {
        Self {
            uavs: RwLock::new(BTreeMap::new()),
            max_population,
        }
    }

    /// Insert or overwrite a UAV.
    ///
    /// Overwriting an existing id always succeeds and returns the previous
    /// state. A new id is only accepted while the store has room.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PopulationFull`] if `uav` is new and the store is full.
    pub fn insert(&self, uav: Uav) -> Result<Option<Uav>> {
        let mut uavs = self.uavs.write();
        if !uavs.contains_key(&uav.id) && uavs.len() >= self.max_population {
            return Err(SimError::PopulationFull {
                max: self.max_population,
            });
        }
        Ok(uavs.insert(uav.id, uav))
    }

    /// Add a freshly created UAV.
    ///
    /// The collision and capacity checks run under the same write lock as the
    /// insert, so concurrent admissions cannot overshoot the bound.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DuplicateId`] on an id collision and
    /// [`SimError::PopulationFull`] when no room is left.
    pub fn admit(&self, uav: Uav) -> Result<()> {
        let mut uavs = self.uavs.write();
        if uavs.contains_key(&uav.id) {
            return Err(DomainError::DuplicateId(uav.id).into());
        }
        if uavs.len() >= self.max_population {
            return Err(SimError::PopulationFull {
                max: self.max_population,
            });
        }
        uavs.insert(uav.id, uav);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<Uav> {
        self.uavs.read().get(id).cloned()
    }

    /// Remove a UAV. Absent ids are a no-op.
    pub fn remove(&self, id: &Uuid) -> Option<Uav> {
        self.uavs.write().remove(id)
    }

    /// Point-in-time copy of every UAV.
    #[must_use]
    pub fn all(&self) -> Vec<Uav> {
        self.uavs.read().values().cloned().collect()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<Uuid> {
        self.uavs.read().keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.uavs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uavs.read().is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_population
    }

    #[must_use]
    pub const fn max_population(&self) -> usize {
        self.max_population
    }
}
