use crate::template::{AddedField, TemplateError};
use chrono::NaiveDate;
use chrono_tz::Tz;
use model::{fields::FieldCatalog, window::WindowStep};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.linkedin.com/rest";
pub const DEFAULT_TOKEN_ENV: &str = "ADSYNC_ACCESS_TOKEN";
pub const DEFAULT_LOOKBACK_DAYS: u64 = 730;
pub const DEFAULT_MAX_PARTITIONS: usize = 10_000;
pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid date `{value}` for `{field}`: expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid window step: {0}")]
    InvalidStep(#[from] model::window::StepParseError),

    #[error("Unknown timezone `{0}`")]
    UnknownTimezone(String),

    #[error("Invalid template for added field `{name}`: {source}")]
    InvalidTemplate {
        name: String,
        #[source]
        source: TemplateError,
    },

    #[error("`fields` must not be empty when given")]
    EmptyFieldList,

    #[error("`max_partitions` must be at least 1")]
    ZeroMaxPartitions,
}

/// How the sync splits the account into partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitioningMode {
    /// One anonymous partition covering the whole account.
    Account,
    /// One partition per campaign, discovered from the campaign listing.
    Campaign,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAddedField {
    pub name: String,
    pub value: String,
}

/// Sync configuration as written in the JSON config file. Everything except
/// the account and the start date has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub account_id: u64,
    pub start_date: String,
    pub api_base: Option<String>,
    pub end_date: Option<String>,
    pub step: Option<String>,
    pub chunk_size: Option<usize>,
    pub fields: Option<Vec<String>>,
    pub lookback_days: Option<u64>,
    pub max_partitions: Option<usize>,
    pub timezone: Option<String>,
    pub pivot: Option<String>,
    pub time_granularity: Option<String>,
    pub partitioning: Option<PartitioningMode>,
    pub added_fields: Option<Vec<RawAddedField>>,
    pub state_dir: Option<PathBuf>,
    pub token_env: Option<String>,
    pub page_size: Option<usize>,
}

/// Immutable, validated configuration used throughout the sync.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub account_id: u64,
    pub api_base: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub step: WindowStep,
    pub catalog: FieldCatalog,
    pub lookback_days: u64,
    pub max_partitions: usize,
    pub timezone: Tz,
    pub pivot: String,
    pub time_granularity: String,
    pub partitioning: PartitioningMode,
    pub added_fields: Vec<AddedField>,
    pub state_dir: Option<PathBuf>,
    pub token_env: String,
    pub page_size: usize,
}

impl SyncSettings {
    pub fn from_json(source: &str) -> Result<Self, SettingsError> {
        let raw: RawConfig = serde_json::from_str(source)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, SettingsError> {
        let start_date = parse_date("start_date", &raw.start_date)?;
        let end_date = raw
            .end_date
            .as_deref()
            .map(|value| parse_date("end_date", value))
            .transpose()?;

        let step = raw
            .step
            .as_deref()
            .unwrap_or("P1M")
            .parse::<WindowStep>()?;

        let timezone = match raw.timezone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| SettingsError::UnknownTimezone(name.to_string()))?,
            None => Tz::UTC,
        };

        let catalog = match raw.fields {
            Some(fields) if fields.is_empty() => return Err(SettingsError::EmptyFieldList),
            Some(fields) => FieldCatalog::new(
                fields,
                raw.chunk_size.unwrap_or(model::fields::DEFAULT_CHUNK_SIZE),
            ),
            None => match raw.chunk_size {
                Some(size) => {
                    FieldCatalog::new(FieldCatalog::default_catalog().fields().to_vec(), size)
                }
                None => FieldCatalog::default_catalog(),
            },
        };

        let max_partitions = raw.max_partitions.unwrap_or(DEFAULT_MAX_PARTITIONS);
        if max_partitions == 0 {
            return Err(SettingsError::ZeroMaxPartitions);
        }

        let added_fields = raw
            .added_fields
            .unwrap_or_default()
            .into_iter()
            .map(|field| {
                AddedField::parse(&field.name, &field.value).map_err(|source| {
                    SettingsError::InvalidTemplate {
                        name: field.name.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            account_id: raw.account_id,
            api_base: raw
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            start_date,
            end_date,
            step,
            catalog,
            lookback_days: raw.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
            max_partitions,
            timezone,
            pivot: raw.pivot.unwrap_or_else(|| "CAMPAIGN".to_string()),
            time_granularity: raw
                .time_granularity
                .unwrap_or_else(|| "DAILY".to_string()),
            partitioning: raw.partitioning.unwrap_or(PartitioningMode::Campaign),
            added_fields,
            state_dir: raw.state_dir,
            token_env: raw
                .token_env
                .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
            page_size: raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        })
    }

    pub fn account_urn(&self) -> String {
        format!("urn:li:sponsoredAccount:{}", self.account_id)
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, SettingsError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| SettingsError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
