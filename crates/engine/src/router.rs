use crate::{config::SyncSettings, error::SyncError};
use model::partition::Partition;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use transport::{
    classify::classify_transport_error, request::ApiRequest, requester::Requester,
    retry::RetryPolicy,
};

/// Enumerates the partitions a sync run iterates over.
pub trait PartitionRouter: Send + Sync {
    fn partitions(&self) -> Result<Vec<Partition>, SyncError>;
}

/// One anonymous partition spanning the whole account.
pub struct SinglePartitionRouter;

impl PartitionRouter for SinglePartitionRouter {
    fn partitions(&self) -> Result<Vec<Partition>, SyncError> {
        Ok(vec![Partition::new()])
    }
}

/// One partition per campaign, discovered from the account's campaign
/// listing. Carries the campaign status and run schedule so end-date
/// resolution can use them.
pub struct CampaignRouter {
    settings: Arc<SyncSettings>,
    requester: Arc<dyn Requester>,
    retry: RetryPolicy,
}

impl CampaignRouter {
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

    fn page(&self, offset: usize) -> Result<Vec<Value>, SyncError> {
        let request = ApiRequest::get(format!(
            "{}/adAccounts/{}/adCampaigns",
            self.settings.api_base, self.settings.account_id
        ))
        .param("q", "search")
        .param("start", offset.to_string())
        .param("count", self.settings.page_size.to_string());

        let response = self
            .retry
            .run(|| self.requester.execute(&request), classify_transport_error)
            .map_err(|err| SyncError::Transport(err.into_inner()))?;

        Ok(response
            .body
            .get("elements")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl PartitionRouter for CampaignRouter {
    fn partitions(&self) -> Result<Vec<Partition>, SyncError> {
        let mut partitions = Vec::new();
        let mut offset = 0;

        loop {
            let elements = self.page(offset)?;
            let fetched = elements.len();
            for element in &elements {
                match campaign_partition(element) {
                    Some(partition) => partitions.push(partition),
                    None => warn!("campaign listing entry without an id skipped"),
                }
            }
            debug!(offset, fetched, "campaign page fetched");

            // A short page is the last one.
            if fetched < self.settings.page_size {
                break;
            }
            offset += fetched;
        }

        info!(campaigns = partitions.len(), "campaign partitions discovered");
        Ok(partitions)
    }
}

fn campaign_partition(element: &Value) -> Option<Partition> {
    let id = element.get("id")?;
    let mut partition = Partition::with_identity("campaign_id", id.clone());
    for field in ["status", "runSchedule"] {
        if let Some(value) = element.get(field) {
            partition.insert_extra(field, value.clone());
        }
    }
    Some(partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex, time::Duration};
    use transport::{error::TransportError, requester::ApiResponse};

    struct ScriptedRequester {
        responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedRequester {
        fn new(responses: Vec<Result<ApiResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl Requester for ScriptedRequester {
        fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(ApiResponse {
                        status: 200,
                        body: json!({"elements": []}),
                    })
                })
        }
    }

    fn mk_router(
        page_size: usize,
        responses: Vec<Result<ApiResponse, TransportError>>,
    ) -> (CampaignRouter, Arc<ScriptedRequester>) {
        let settings = Arc::new(
            SyncSettings::from_json(&format!(
                r#"{{"account_id": 111, "start_date": "2023-01-01", "page_size": {page_size}}}"#
            ))
            .unwrap(),
        );
        let requester = Arc::new(ScriptedRequester::new(responses));
        let router = CampaignRouter::new(
            settings,
            requester.clone(),
            RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
        );
        (router, requester)
    }

    fn page_of(ids: &[u64]) -> Result<ApiResponse, TransportError> {
        let elements: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "status": "ACTIVE"}))
            .collect();
        Ok(ApiResponse {
            status: 200,
            body: json!({"elements": elements}),
        })
    }

    #[test]
    fn pages_are_walked_until_a_short_one() {
        let (router, requester) = mk_router(2, vec![page_of(&[1, 2]), page_of(&[3])]);

        let partitions = router.partitions().unwrap();
        assert_eq!(partitions.len(), 3);
        assert_eq!(
            partitions[2].identity_value("campaign_id"),
            Some(&json!(3))
        );

        let urls: Vec<String> = requester
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(ApiRequest::full_url)
            .collect();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("start=0") && urls[0].contains("count=2"));
        assert!(urls[1].contains("start=2"));
    }

    #[test]
    fn campaign_metadata_lands_in_the_partition() {
        let body = json!({
            "elements": [{
                "id": 9,
                "status": "COMPLETED",
                "runSchedule": {"start": 0, "end": 1_700_000_000_000u64},
                "name": "ignored"
            }]
        });
        let (router, _) = mk_router(
            10,
            vec![Ok(ApiResponse { status: 200, body })],
        );

        let partitions = router.partitions().unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(
            partitions[0].extra_value("status"),
            Some(&json!("COMPLETED"))
        );
        assert!(partitions[0].extra_value("runSchedule").is_some());
        assert!(partitions[0].extra_value("name").is_none());
    }

    #[test]
    fn entries_without_an_id_are_skipped() {
        let body = json!({"elements": [{"id": 5}, {"name": "no id"}]});
        let (router, _) = mk_router(10, vec![Ok(ApiResponse { status: 200, body })]);

        let partitions = router.partitions().unwrap();
        assert_eq!(partitions.len(), 1);
    }

    #[test]
    fn a_fatal_listing_error_stops_discovery() {
        let (router, _) = mk_router(
            10,
            vec![Err(TransportError::Status {
                status: 403,
                body: "forbidden".into(),
            })],
        );

        assert!(matches!(
            router.partitions(),
            Err(SyncError::Transport(TransportError::Status { status: 403, .. }))
        ));
    }

    #[test]
    fn single_router_yields_one_anonymous_partition() {
        let partitions = SinglePartitionRouter.partitions().unwrap();
        assert_eq!(partitions.len(), 1);
        assert!(partitions[0].is_anonymous());
    }
}
