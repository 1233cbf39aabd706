use crate::{
    config::SyncSettings, error::SyncError, resolver::EndDateResolver, state::StateStore,
    windows::WindowIter,
};
use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use model::{
    cursor::CursorPosition,
    fields::FieldCatalog,
    partition::Partition,
    slice::EnrichedSlice,
    window::WindowStep,
};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Per-partition cursor registry.
///
/// Capacity is a hard cap: the registry refuses to grow past it instead of
/// evicting older partitions, because eviction silently forgets progress and
/// re-reads history on the next run.
pub struct PartitionCursors {
    cursors: HashMap<String, CursorPosition>,
    max_partitions: usize,
    start_date: NaiveDate,
    lookback_days: u64,
    timezone: Tz,
    step: WindowStep,
    catalog: FieldCatalog,
    resolver: Arc<dyn EndDateResolver>,
    state: Arc<dyn StateStore>,
    /// Legacy single-cursor position, read once. Seeds partitions that have
    /// no per-partition state yet.
    migrated: Option<CursorPosition>,
}

impl PartitionCursors {
    pub fn new(
        settings: &SyncSettings,
        resolver: Arc<dyn EndDateResolver>,
        state: Arc<dyn StateStore>,
    ) -> Result<Self, SyncError> {
        let migrated = state.load_global()?;
        if migrated.is_some() {
            debug!("found legacy global cursor position, will seed new partitions from it");
        }
        Ok(Self {
            cursors: HashMap::new(),
            max_partitions: settings.max_partitions,
            start_date: settings.start_date,
            lookback_days: settings.lookback_days,
            timezone: settings.timezone,
            step: settings.step,
            catalog: settings.catalog.clone(),
            resolver,
            state,
            migrated,
        })
    }

    /// Builds the lazy slice sequence for a partition from its cursor
    /// position and the partition's effective end date. A range with nothing
    /// left in it is a normal no-work case, not an error.
    pub fn slices_for(&mut self, partition: &Partition) -> Result<SliceStream, SyncError> {
        let position = self.cursor_for(partition)?;
        let end = self.resolver.resolve(partition);
        let start = self.effective_start(position, end);
        debug!(
            partition = %partition.key(),
            start = %start,
            end = %end,
            "slice range resolved"
        );
        let windows = self
            .resolver
            .range_is_pending(start, end)
            .then(|| WindowIter::new(start, end, self.step, &self.catalog));
        Ok(SliceStream {
            partition: partition.clone(),
            windows,
        })
    }

    /// Records a successfully completed slice and persists the new position.
    /// Unseen partitions register through the same capped path as
    /// `slices_for`.
    pub fn advance(&mut self, partition: &Partition, through: NaiveDate) -> Result<(), SyncError> {
        let key = partition.key();
        let mut cursor = self.cursor_for(partition)?;
        cursor.advance_to(through);
        self.cursors.insert(key.clone(), cursor);
        self.state.save_partition(&key, cursor)?;
        debug!(partition = %key, through = %through, "cursor advanced");
        Ok(())
    }

    pub fn position(&self, partition: &Partition) -> Option<CursorPosition> {
        self.cursors.get(&partition.key()).copied()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    fn cursor_for(&mut self, partition: &Partition) -> Result<CursorPosition, SyncError> {
        let key = partition.key();
        if let Some(position) = self.cursors.get(&key) {
            return Ok(*position);
        }

        if self.cursors.len() >= self.max_partitions {
            return Err(SyncError::TooManyPartitions {
                count: self.cursors.len() + 1,
                max: self.max_partitions,
            });
        }

        let position = match self.state.load_partition(&key)? {
            Some(saved) => saved,
            None => self.migrated.unwrap_or_default(),
        };
        debug!(partition = %key, position = ?position, "partition cursor registered");
        self.cursors.insert(key, position);
        Ok(position)
    }

    /// Later of: the configured start, the lookback horizon, and the day
    /// after the cursor position. The horizon is anchored to the current
    /// date in the configured zone: the API bounds how far back a range may
    /// reach from now, regardless of when the entity stopped.
    fn effective_start(&self, position: CursorPosition, end: NaiveDate) -> NaiveDate {
        let configured = self.start_date.min(end);
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        let horizon = today
            .checked_sub_days(Days::new(self.lookback_days))
            .unwrap_or(configured);
        let floor = configured.max(horizon);

        match position.synced_through() {
            Some(done) => {
                let resume = done.checked_add_days(Days::new(1)).unwrap_or(done);
                floor.max(resume)
            }
            None => floor,
        }
    }
}

/// Lazy sequence of a partition's pending slices. Empty when the
/// partition's effective range holds nothing.
#[derive(Debug)]
pub struct SliceStream {
    partition: Partition,
    windows: Option<WindowIter>,
}

impl Iterator for SliceStream {
    type Item = EnrichedSlice;

    fn next(&mut self) -> Option<EnrichedSlice> {
        let slice = self.windows.as_mut()?.next()?;
        Some(EnrichedSlice {
            partition: self.partition.clone(),
            slice,
        })
    }
}
