use lazy_static::lazy_static;

/// Structural field carrying the record's date window; required in every
/// request so fragments can be matched back together.
pub const DATE_RANGE_FIELD: &str = "dateRange";

/// Structural field carrying the record's pivot identity; required in every
/// request for the same reason.
pub const PIVOT_VALUES_FIELD: &str = "pivotValues";

/// Upstream accepts roughly 20 fields per request; 19 base fields leaves
/// room for the structural pair when a chunk lacks them.
pub const DEFAULT_CHUNK_SIZE: usize = 19;

lazy_static! {
    static ref DEFAULT_ANALYTICS_FIELDS: Vec<&'static str> = vec![
        "actionClicks",
        "adUnitClicks",
        "approximateUniqueImpressions",
        "cardClicks",
        "cardImpressions",
        "clicks",
        "commentLikes",
        "comments",
        "companyPageClicks",
        "conversionValueInLocalCurrency",
        "costInLocalCurrency",
        "costInUsd",
        "dateRange",
        "externalWebsiteConversions",
        "externalWebsitePostClickConversions",
        "externalWebsitePostViewConversions",
        "follows",
        "fullScreenPlays",
        "impressions",
        "landingPageClicks",
        "leadGenerationMailContactInfoShares",
        "leadGenerationMailInterestedClicks",
        "likes",
        "oneClickLeadFormOpens",
        "oneClickLeads",
        "opens",
        "otherEngagements",
        "pivotValues",
        "reactions",
        "sends",
        "shares",
        "textUrlClicks",
        "totalEngagements",
        "videoCompletions",
        "videoFirstQuartileCompletions",
        "videoMidpointCompletions",
        "videoStarts",
        "videoThirdQuartileCompletions",
        "videoViews",
        "viralCardClicks",
        "viralCardImpressions",
        "viralClicks",
        "viralComments",
        "viralCompanyPageClicks",
        "viralExternalWebsiteConversions",
        "viralExternalWebsitePostClickConversions",
        "viralExternalWebsitePostViewConversions",
        "viralFollows",
        "viralFullScreenPlays",
        "viralImpressions",
        "viralLandingPageClicks",
        "viralLikes",
        "viralOneClickLeadFormOpens",
        "viralOneClickLeads",
        "viralOtherEngagements",
        "viralReactions",
        "viralShares",
        "viralTotalEngagements",
        "viralVideoCompletions",
        "viralVideoFirstQuartileCompletions",
        "viralVideoMidpointCompletions",
        "viralVideoStarts",
        "viralVideoThirdQuartileCompletions",
        "viralVideoViews",
    ];
}

/// The ordered set of analytics fields a sync requests, together with the
/// chunking limit the upstream imposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: Vec<String>,
    chunk_size: usize,
}

impl FieldCatalog {
    pub fn new(fields: Vec<String>, chunk_size: usize) -> Self {
        Self {
            fields,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Full upstream metric catalog with the default chunking limit.
    pub fn default_catalog() -> Self {
        Self::new(
            DEFAULT_ANALYTICS_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            DEFAULT_CHUNK_SIZE,
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
