use crate::{
    config::{PartitioningMode, SyncSettings},
    cursors::PartitionCursors,
    error::SyncError,
    merge::FragmentMerger,
    resolver::{CampaignEndDateResolver, DefaultEndDateResolver, EndDateResolver},
    router::{CampaignRouter, PartitionRouter, SinglePartitionRouter},
    state::StateStore,
};
use model::record::AnalyticsRecord;
use std::{sync::Arc, time::Instant};
use tracing::{info, info_span};
use transport::{requester::Requester, retry::RetryPolicy};
use uuid::Uuid;

/// Receives merged records in emission order.
pub trait RecordSink {
    fn write(&mut self, record: &AnalyticsRecord) -> Result<(), SyncError>;
}

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    pub partitions: usize,
    pub slices: usize,
    pub records: usize,
}

/// Single-threaded sync driver: partitions from the router, slices from the
/// cursor registry, records from the merger, all pulled in order.
///
/// The cursor for a slice advances only after every record of that slice has
/// reached the sink, so an interrupted run resumes at the failed slice.
pub struct SyncEngine {
    router: Box<dyn PartitionRouter>,
    cursors: PartitionCursors,
    merger: FragmentMerger,
}

impl SyncEngine {
    pub fn new(
        settings: Arc<SyncSettings>,
        requester: Arc<dyn Requester>,
        state: Arc<dyn StateStore>,
    ) -> Result<Self, SyncError> {
        let retry = RetryPolicy::for_upstream();

        let (resolver, router): (Arc<dyn EndDateResolver>, Box<dyn PartitionRouter>) =
            match settings.partitioning {
                PartitioningMode::Campaign => (
                    Arc::new(CampaignEndDateResolver::new(
                        settings.end_date,
                        settings.timezone,
                    )),
                    Box::new(CampaignRouter::new(
                        settings.clone(),
                        requester.clone(),
                        retry.clone(),
                    )),
                ),
                PartitioningMode::Account => (
                    Arc::new(DefaultEndDateResolver::new(
                        settings.end_date,
                        settings.timezone,
                    )),
                    Box::new(SinglePartitionRouter),
                ),
            };

        let cursors = PartitionCursors::new(&settings, resolver, state)?;
        let merger = FragmentMerger::new(settings, requester, retry);

        Ok(Self {
            router,
            cursors,
            merger,
        })
    }

    pub fn run(&mut self, sink: &mut dyn RecordSink) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync_run", run_id = %run_id);
        let _guard = span.enter();
        let started = Instant::now();

        let partitions = self.router.partitions()?;
        info!(partitions = partitions.len(), "sync started");

        let mut report = SyncReport {
            partitions: partitions.len(),
            ..Default::default()
        };

        for partition in &partitions {
            for enriched in self.cursors.slices_for(partition)? {
                let records = self.merger.read_slice(&enriched)?;
                for record in &records {
                    sink.write(record)?;
                }
                self.cursors.advance(partition, enriched.slice.window.end)?;

                report.slices += 1;
                report.records += records.len();
                info!(
                    partition = %partition.key(),
                    window = %enriched.slice.window,
                    records = records.len(),
                    "slice synced"
                );
            }
        }

        info!(
            partitions = report.partitions,
            slices = report.slices,
            records = report.records,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sync finished"
        );
        Ok(report)
    }
}
