use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{trace, warn};

use crate::error::Result;
use crate::profile::{ChargeProfile, Resolution, build_profile};
use crate::vehicle::{VehicleEnergyProfile, VehicleTypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    vehicle: VehicleTypeId,
    resolution: Resolution,
}

#[derive(Debug)]
struct Entry {
    /// Inputs the profile was built from; a mismatch forces a rebuild.
    inputs: VehicleEnergyProfile,
    profile: Arc<ChargeProfile>,
}

type Slot = Arc<Mutex<Option<Entry>>>;

/// Built profiles keyed by vehicle type and resolution.
///
/// Each key has its own lock, held while that key's profile is built, so
/// concurrent callers asking for the same key wait for a single build
/// while other keys proceed. Built profiles are shared as `Arc`s and never
/// mutated; readers keep using a profile even after it is invalidated.
#[derive(Debug, Default)]
pub struct ProfileCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached profile, building it on first use.
    ///
    /// If the cached profile was built from different `inputs` (the vehicle
    /// record changed), it is rebuilt and replaced.
    ///
    /// # Errors
    ///
    /// Propagates build errors. A key whose first build fails is dropped
    /// again; a failed rebuild keeps the profile already cached.
    pub fn get_or_build(
        &self,
        vehicle: VehicleTypeId,
        inputs: &VehicleEnergyProfile,
        resolution: Resolution,
    ) -> Result<Arc<ChargeProfile>> {
        let key = CacheKey {
            vehicle,
            resolution,
        };
        let slot = Arc::clone(lock(&self.slots).entry(key).or_default());
        let mut entry = lock(&slot);

        if let Some(cached) = entry.as_ref() {
            if cached.inputs == *inputs {
                trace!(%vehicle, %resolution, "Profile cache hit");
                return Ok(Arc::clone(&cached.profile));
            }
            warn!(%vehicle, %resolution, "Vehicle inputs changed, rebuilding profile");
        } else {
            trace!(%vehicle, %resolution, "Profile cache miss");
        }

        let profile = match build_profile(inputs, resolution) {
            Ok(profile) => Arc::new(profile),
            Err(e) => {
                let never_built = entry.is_none();
                drop(entry);
                if never_built {
                    self.forget_empty(&key, &slot);
                }
                return Err(e);
            }
        };
        *entry = Some(Entry {
            inputs: *inputs,
            profile: Arc::clone(&profile),
        });
        Ok(profile)
    }

    /// Returns an already-built profile without building.
    pub fn get(&self, vehicle: VehicleTypeId, resolution: Resolution) -> Option<Arc<ChargeProfile>> {
        let key = CacheKey {
            vehicle,
            resolution,
        };
        let slot = lock(&self.slots).get(&key).cloned()?;
        let entry = lock(&slot);
        entry.as_ref().map(|e| Arc::clone(&e.profile))
    }

    /// Drops every profile of `vehicle`, returning how many keys were removed.
    ///
    /// Keys whose build is still running are left in place, so callers
    /// already waiting on them still share that single build. Their result
    /// is checked against the vehicle inputs on every later lookup.
    pub fn invalidate(&self, vehicle: VehicleTypeId) -> usize {
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|key, slot| {
            key.vehicle != vehicle || matches!(slot.try_lock(), Err(TryLockError::WouldBlock))
        });
        let removed = before - slots.len();
        if removed > 0 {
            trace!(%vehicle, removed, "Invalidated cached profiles");
        }
        removed
    }

    /// Removes `key` if it still maps to `slot` and nothing was built into it.
    fn forget_empty(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = lock(&self.slots);
        let unused = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && matches!(current.try_lock().as_deref(), Ok(None))
        });
        if unused {
            slots.remove(key);
        }
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    /// Number of keys holding a built profile.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A panic inside a build leaves the slot empty, so the data is still sound.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
