//! Lock-free, read-mostly holder for the current calendar.
//!
//! Readers call [`SharedCalendar::load`] and get an `Arc<ExchangeCalendar>`
//! snapshot with no locking contention. A writer calls
//! [`SharedCalendar::rebuild`] after the range or holiday list changes: the new
//! calendar is built completely off to the side and then swapped in with one
//! atomic store, so readers see either the old or the new calendar, never a
//! partially built one.
//!
//! Implementation notes:
//! - Uses `arc-swap` for atomic pointer swaps + cheap reads (no RwLock).
//! - Rebuilds are serialized by an internal mutex; readers never take it.
//! - A failed rebuild leaves the current snapshot in place.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::calendar::ExchangeCalendar;
use crate::config::CalendarConfig;
use crate::error::CalendarResult;
use crate::holidays::HolidaySource;

/// Shared handle to the most recently published calendar.
pub struct SharedCalendar {
    current: ArcSwap<ExchangeCalendar>,
    rebuild_lock: Mutex<()>,
}

impl SharedCalendar {
    /// Publish `calendar` as the initial snapshot.
    pub fn new(calendar: ExchangeCalendar) -> Self {
        Self {
            current: ArcSwap::from_pointee(calendar),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Build the initial snapshot from `config` and `source`.
    pub fn build(config: CalendarConfig, source: &dyn HolidaySource) -> CalendarResult<Self> {
        Ok(Self::new(ExchangeCalendar::from_source(config, source)?))
    }

    /// Current snapshot.
    ///
    /// Fast path: one atomic load + an `Arc` clone.
    pub fn load(&self) -> Arc<ExchangeCalendar> {
        self.current.load_full()
    }

    /// Rebuild from `config` and a fresh pull from `source`, then swap it in.
    ///
    /// Errors leave the published snapshot untouched.
    pub fn rebuild(&self, config: CalendarConfig, source: &dyn HolidaySource) -> CalendarResult<()> {
        let _guard = self.rebuild_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = ExchangeCalendar::from_source(config, source).inspect_err(|err| {
            tracing::warn!(error = %err, "calendar rebuild failed, keeping previous snapshot");
        })?;
        self.current.store(Arc::new(next));
        Ok(())
    }
}
