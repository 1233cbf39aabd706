use crate::{
    config::SyncSettings,
    error::SyncError,
    normalize,
    template::slice_context,
};
use model::{
    partition::Partition,
    record::{AnalyticsRecord, MergeKey},
    slice::{ChunkRequest, EnrichedSlice},
};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, warn};
use transport::{
    classify::classify_transport_error,
    error::TransportError,
    request::ApiRequest,
    requester::Requester,
    retry::{RetryError, RetryPolicy},
};

/// Executes the chunk requests of one slice and reassembles the fragment
/// responses into whole records.
///
/// A slice is atomic: if any chunk fails past the retry policy, the whole
/// slice fails and its fragments are discarded, so the cursor never moves
/// over a window with holes in it.
pub struct FragmentMerger {
    settings: Arc<SyncSettings>,
    requester: Arc<dyn Requester>,
    retry: RetryPolicy,
}

impl FragmentMerger {
    pub fn new(
        settings: Arc<SyncSettings>,
        requester: Arc<dyn Requester>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            settings,
            requester,
            retry,
        }
    }

    /// Fetches every chunk of the slice and merges fragments by
    /// [`MergeKey`]. Records come back in key order.
    pub fn read_slice(&self, slice: &EnrichedSlice) -> Result<Vec<AnalyticsRecord>, SyncError> {
        let context = slice_context(&self.settings, &slice.partition, &slice.slice);
        // Added fields are rendered once per slice, not once per record.
        let stamped: Vec<(&str, String)> = self
            .settings
            .added_fields
            .iter()
            .map(|field| (field.name.as_str(), field.template.render(&context)))
            .collect();

        let mut merged: BTreeMap<MergeKey, AnalyticsRecord> = BTreeMap::new();
        for chunk in &slice.slice.chunks {
            let request = self.build_request(&slice.partition, chunk);
            let response = self
                .retry
                .run(|| self.requester.execute(&request), classify_transport_error)
                .map_err(|err| slice_failure(slice, err))?;

            let fragments = normalize::extract_records(&response.body);
            debug!(
                partition = %slice.partition.key(),
                window = %slice.slice.window,
                fragments = fragments.len(),
                "chunk fetched"
            );
            for mut fragment in fragments {
                for (name, value) in &stamped {
                    fragment.set(*name, Value::String(value.clone()));
                }
                merged
                    .entry(MergeKey::of(&fragment))
                    .or_default()
                    .extend_from(&fragment);
            }
        }

        Ok(merged.into_values().collect())
    }

    fn build_request(&self, partition: &Partition, chunk: &ChunkRequest) -> ApiRequest {
        let settings = &self.settings;
        let date_range = format!(
            "(start:(year:{},month:{},day:{}),end:(year:{},month:{},day:{}))",
            chunk.start.year,
            chunk.start.month,
            chunk.start.day,
            chunk.end.year,
            chunk.end.month,
            chunk.end.day,
        );

        let request = ApiRequest::get(format!("{}/adAnalytics", settings.api_base))
            .param("q", "analytics")
            .param("pivot", format!("(value:{})", settings.pivot))
            .param(
                "timeGranularity",
                format!("(value:{})", settings.time_granularity),
            )
            .param("dateRange", date_range);

        // Colons inside the URN are pre-encoded; the query encoder passes
        // them through instead of escaping the percent signs again.
        let request = match campaign_reference(partition) {
            Some(id) => request.param(
                "campaigns",
                format!("List(urn%3Ali%3AsponsoredCampaign%3A{id})"),
            ),
            None => request.param(
                "accounts",
                format!("List(urn%3Ali%3AsponsoredAccount%3A{})", settings.account_id),
            ),
        };

        request.param("fields", chunk.fields.clone())
    }
}

fn campaign_reference(partition: &Partition) -> Option<String> {
    match partition.identity_value("campaign_id")? {
        Value::Number(id) => Some(id.to_string()),
        Value::String(id) => Some(id.clone()),
        _ => None,
    }
}

fn slice_failure(slice: &EnrichedSlice, err: RetryError<TransportError>) -> SyncError {
    let partition = slice.partition.key();
    let window = slice.slice.window;
    match &err {
        RetryError::Fatal(source) => {
            warn!(%partition, %window, error = %source, "slice failed on a fatal upstream error")
        }
        RetryError::AttemptsExceeded(source) => {
            warn!(%partition, %window, error = %source, "slice failed after exhausting retries")
        }
    }
    SyncError::UpstreamRequestFailed {
        partition,
        window,
        source: err.into_inner(),
    }
}
