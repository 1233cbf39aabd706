use crate::{partition::Partition, window::DateWindow};
use chrono::{Datelike, NaiveDate};

/// Numeric components of a date, as the upstream's structured query grammar
/// spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateParts {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Request descriptor for one (window, field chunk) cell: everything the
/// requester needs to format the upstream query.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest {
    pub start_date: String,
    pub end_date: String,
    /// Comma-joined field list for this chunk.
    pub fields: String,
    pub start: DateParts,
    pub end: DateParts,
}

impl ChunkRequest {
    pub fn new(window: DateWindow, fields: &[String]) -> Self {
        Self {
            start_date: window.start.format("%Y-%m-%d").to_string(),
            end_date: window.end.format("%Y-%m-%d").to_string(),
            fields: fields.join(","),
            start: DateParts::of(window.start),
            end: DateParts::of(window.end),
        }
    }
}

/// One date window with every field chunk that must be fetched for it.
/// The unit of work and of checkpointing.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlice {
    pub window: DateWindow,
    pub chunks: Vec<ChunkRequest>,
}

/// A window slice bound to the partition that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSlice {
    pub partition: Partition,
    pub slice: WindowSlice,
}
