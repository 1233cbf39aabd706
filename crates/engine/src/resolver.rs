use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use model::partition::Partition;
use serde_json::Value;
use tracing::warn;

/// Decides the last date worth requesting for a partition.
pub trait EndDateResolver: Send + Sync {
    fn resolve(&self, partition: &Partition) -> NaiveDate;

    /// Whether `[start, end]` still holds anything to request.
    fn range_is_pending(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= end
    }
}

/// Uses the configured end date, clamped to today in the configured zone.
/// Analytics never exist for the future.
pub struct DefaultEndDateResolver {
    configured_end: Option<NaiveDate>,
    timezone: Tz,
}

impl DefaultEndDateResolver {
    pub fn new(configured_end: Option<NaiveDate>, timezone: Tz) -> Self {
        Self {
            configured_end,
            timezone,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

impl EndDateResolver for DefaultEndDateResolver {
    fn resolve(&self, _partition: &Partition) -> NaiveDate {
        let today = self.today();
        self.configured_end.map_or(today, |end| end.min(today))
    }
}

/// Campaign-aware resolution: a completed campaign stops accruing analytics
/// at its scheduled end, so requesting beyond that date is wasted work.
pub struct CampaignEndDateResolver {
    fallback: DefaultEndDateResolver,
    timezone: Tz,
}

impl CampaignEndDateResolver {
    pub fn new(configured_end: Option<NaiveDate>, timezone: Tz) -> Self {
        Self {
            fallback: DefaultEndDateResolver::new(configured_end, timezone),
            timezone,
        }
    }

    /// `runSchedule.end` in epoch milliseconds, converted to a date in the
    /// configured zone.
    fn schedule_end(&self, partition: &Partition) -> Option<NaiveDate> {
        let millis = partition
            .extra_value("runSchedule")?
            .get("end")?
            .as_i64()?;
        let instant = DateTime::from_timestamp_millis(millis)?;
        Some(instant.with_timezone(&self.timezone).date_naive())
    }
}

impl EndDateResolver for CampaignEndDateResolver {
    fn resolve(&self, partition: &Partition) -> NaiveDate {
        let status = partition.extra_value("status").and_then(Value::as_str);
        if status == Some("COMPLETED") {
            match self.schedule_end(partition) {
                Some(date) => return date,
                None => {
                    warn!(
                        partition = %partition.key(),
                        "completed campaign has no schedule end, falling back to today"
                    );
                    return self.fallback.today();
                }
            }
        }
        self.fallback.resolve(partition)
    }

    /// Campaign ranges are exhausted once the start catches the end.
    fn range_is_pending(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completed_campaign(end_millis: Option<i64>) -> Partition {
        let mut partition = Partition::with_identity("campaign_id", json!(123));
        partition.insert_extra("status", json!("COMPLETED"));
        if let Some(millis) = end_millis {
            partition.insert_extra("runSchedule", json!({"start": 0, "end": millis}));
        }
        partition
    }

    #[test]
    fn completed_campaign_ends_at_its_schedule_end() {
        let resolver = CampaignEndDateResolver::new(None, Tz::UTC);
        // 2023-11-14T22:13:20Z
        let end = resolver.resolve(&completed_campaign(Some(1_700_000_000_000)));
        assert_eq!(end, date(2023, 11, 14));
    }

    #[test]
    fn schedule_end_respects_the_configured_timezone() {
        let resolver = CampaignEndDateResolver::new(None, Tz::Australia__Sydney);
        // 22:13 UTC is already past midnight in Sydney.
        let end = resolver.resolve(&completed_campaign(Some(1_700_000_000_000)));
        assert_eq!(end, date(2023, 11, 15));
    }

    #[test]
    fn completed_campaign_without_schedule_end_uses_today() {
        let resolver = CampaignEndDateResolver::new(None, Tz::UTC);
        let before = Utc::now().date_naive();
        let end = resolver.resolve(&completed_campaign(None));
        let after = Utc::now().date_naive();
        assert!(end == before || end == after);
    }

    #[test]
    fn active_campaign_uses_the_configured_end() {
        let resolver = CampaignEndDateResolver::new(Some(date(2023, 3, 10)), Tz::UTC);
        let mut partition = Partition::with_identity("campaign_id", json!(5));
        partition.insert_extra("status", json!("ACTIVE"));
        assert_eq!(resolver.resolve(&partition), date(2023, 3, 10));
    }

    #[test]
    fn configured_end_is_clamped_to_today() {
        let resolver = DefaultEndDateResolver::new(Some(date(2999, 1, 1)), Tz::UTC);
        let before = Utc::now().date_naive();
        let end = resolver.resolve(&Partition::new());
        let after = Utc::now().date_naive();
        assert!(end == before || end == after);
    }
}
