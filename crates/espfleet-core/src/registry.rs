// ── Unit registry ──
//
// Concurrent membership tracking for discovered units, plus the
// `unit-initialized` observer channel. The registry never owns a unit's
// lifecycle; it only holds shared references while the unit is known.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use dashmap::{DashMap, DashSet};
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::CoreError;
use crate::unit::FleetUnit;

/// Callback invoked with each unit that completes its own setup.
pub type UnitObserver = dyn Fn(&Arc<dyn FleetUnit>) + Send + Sync;

/// Handle returned by [`UnitRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ObserverList = Vec<(SubscriptionId, Arc<UnitObserver>)>;

/// The set of all known units.
///
/// Backed by `DashMap` for lock-free lookups. Observers are stored in an
/// `ArcSwap`, so notification iterates a snapshot and observers may call
/// back into the registry freely.
pub struct UnitRegistry {
    /// Primary storage: unit name -> unit.
    units: DashMap<String, Arc<dyn FleetUnit>>,

    /// Names of units that already reported initialized.
    initialized: DashSet<String>,

    /// Observers, in registration order.
    observers: ArcSwap<ObserverList>,

    next_subscription: AtomicU64,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self {
            units: DashMap::new(),
            initialized: DashSet::new(),
            observers: ArcSwap::from_pointee(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    // ── Membership ───────────────────────────────────────────────────

    /// Add a newly discovered unit. Names are unique.
    pub fn register(&self, unit: Arc<dyn FleetUnit>) -> Result<(), CoreError> {
        let name = unit.name().to_owned();
        match self.units.entry(name.clone()) {
            Entry::Occupied(_) => return Err(CoreError::DuplicateUnit { name }),
            Entry::Vacant(slot) => {
                slot.insert(unit);
            }
        }
        debug!(unit = %name, "unit registered");
        Ok(())
    }

    /// Forget a unit that was removed from the host.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn FleetUnit>> {
        let removed = self.units.remove(name).map(|(_, unit)| unit);
        if removed.is_some() {
            self.initialized.remove(name);
            debug!(unit = name, "unit removed");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FleetUnit>> {
        self.units.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Snapshot of every known unit. Order carries no meaning.
    pub fn get_all(&self) -> Vec<Arc<dyn FleetUnit>> {
        self.units.iter().map(|r| Arc::clone(r.value())).collect()
    }

    /// The units of one [`get_all`](Self::get_all) snapshot that are
    /// currently online.
    pub fn get_online(&self) -> Vec<Arc<dyn FleetUnit>> {
        self.get_all().into_iter().filter(|u| u.is_online()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.units.iter().filter(|r| r.value().is_online()).count()
    }

    /// Number of known units that already reported initialized.
    pub fn initialized_count(&self) -> usize {
        self.initialized.len()
    }

    // ── Initialization notifications ─────────────────────────────────

    /// Record that a unit finished its own setup and notify observers.
    ///
    /// Returns `Ok(true)` when observers were notified, `Ok(false)` if the
    /// unit had already reported before.
    pub fn mark_initialized(&self, name: &str) -> Result<bool, CoreError> {
        let unit = self.get(name).ok_or_else(|| CoreError::UnitNotFound {
            name: name.to_owned(),
        })?;

        if !self.initialized.insert(name.to_owned()) {
            return Ok(false);
        }

        debug!(unit = name, "unit initialized");
        let observers = self.observers.load_full();
        for (_, observer) in observers.iter() {
            observer(&unit);
        }
        Ok(true)
    }

    /// Register an observer for `unit-initialized` notifications.
    ///
    /// Observers run synchronously inside
    /// [`mark_initialized`](Self::mark_initialized), in registration order.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Arc<dyn FleetUnit>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let observer: Arc<UnitObserver> = Arc::new(observer);

        self.observers.rcu(|current| {
            let mut next = ObserverList::clone(current);
            next.push((id, Arc::clone(&observer)));
            next
        });
        id
    }

    /// Remove an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let previous = self.observers.rcu(|current| {
            current
                .iter()
                .filter(|(sid, _)| *sid != id)
                .cloned()
                .collect::<ObserverList>()
        });
        previous.iter().any(|(sid, _)| *sid == id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.load().len()
    }
}
