//! Process-wide artifact cache.
//!
//! One slot holding the last bundle loaded with caching enabled. Readers go
//! through an `ArcSwapOption`, so they observe either the old or the new fully
//! built bundle. Cache-filling loads are serialized by `load_lock`. The slot is
//! never refreshed on its own: new files on disk are only picked up by an
//! explicit bypass, [`ArtifactStore::clear`], or a new process.
//!
//! Filling the slot marks the process ready (`/ready`).

use crate::bundle::ArtifactBundle;
use crate::error::Result;
use crate::layout::ArtifactLayout;
use arc_swap::ArcSwapOption;
use ids_core::{mark_ready, IDS_METRICS};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ArtifactStore {
    layout: ArtifactLayout,
    slot: ArcSwapOption<ArtifactBundle>,
    load_lock: Mutex<()>,
    disk_loads: AtomicU64,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("layout", &self.layout)
            .field("cached_version", &self.cached().map(|b| b.version().to_string()))
            .field("disk_loads", &self.disk_loads())
            .finish()
    }
}

impl ArtifactStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout, slot: ArcSwapOption::empty(), load_lock: Mutex::new(()), disk_loads: AtomicU64::new(0) }
    }

    pub fn layout(&self) -> &ArtifactLayout { &self.layout }

    /// `version = None` means "latest". With `use_cache`, a populated slot answers
    /// "latest" requests without touching disk, and every successful load
    /// (explicit versions included) replaces the slot. Failed loads leave it as is.
    pub fn load(&self, version: Option<&str>, use_cache: bool) -> Result<Arc<ArtifactBundle>> {
        if use_cache && version.is_none() {
            if let Some(hit) = self.slot.load_full() {
                IDS_METRICS.cache_hits_total.inc();
                return Ok(hit);
            }
        }
        if !use_cache {
            return self.load_from_disk(version).map(Arc::new);
        }

        let _guard = self.load_lock.lock();
        if version.is_none() {
            // another caller may have filled the slot while we waited
            if let Some(hit) = self.slot.load_full() {
                IDS_METRICS.cache_hits_total.inc();
                return Ok(hit);
            }
        }
        let bundle = Arc::new(self.load_from_disk(version)?);
        if let Some(prev) = self.slot.swap(Some(bundle.clone())) {
            if prev.version() != bundle.version() {
                info!(previous = %prev.version(), current = %bundle.version(), "artifact cache replaced");
            }
        }
        // a bundle is servable from here on, even if startup preload failed
        mark_ready();
        Ok(bundle)
    }

    /// Cached bundle, or the latest one from disk on a cold cache.
    pub fn latest(&self) -> Result<Arc<ArtifactBundle>> { self.load(None, true) }

    pub fn cached(&self) -> Option<Arc<ArtifactBundle>> { self.slot.load_full() }

    pub fn clear(&self) {
        let _guard = self.load_lock.lock();
        self.slot.store(None);
    }

    /// Number of loads that went to disk (successful or not).
    pub fn disk_loads(&self) -> u64 { self.disk_loads.load(Ordering::Relaxed) }

    fn load_from_disk(&self, version: Option<&str>) -> Result<ArtifactBundle> {
        self.disk_loads.fetch_add(1, Ordering::Relaxed);
        IDS_METRICS.artifact_loads_total.inc();
        let version = match version {
            Some(v) => v.to_string(),
            None => {
                let v = self.layout.discover_latest_version()?;
                debug!(version = %v, "discovered latest artifact version");
                v
            }
        };
        ArtifactBundle::load(&self.layout, &version)
    }
}
