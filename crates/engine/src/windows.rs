use crate::chunk::chunk_fields;
use chrono::{Days, NaiveDate};
use model::{
    fields::FieldCatalog,
    slice::{ChunkRequest, WindowSlice},
    window::{DateWindow, WindowStep},
};

/// Lazily walks `[start, end]` producing one slice per step.
///
/// Each window ends one day before the next step boundary, clamped to the
/// range end, so consecutive windows tile the range at day granularity with
/// no gaps or overlap. An inverted range yields nothing.
#[derive(Debug)]
pub struct WindowIter {
    current: NaiveDate,
    end: NaiveDate,
    step: WindowStep,
    chunks: Vec<Vec<String>>,
}

impl WindowIter {
    pub fn new(start: NaiveDate, end: NaiveDate, step: WindowStep, catalog: &FieldCatalog) -> Self {
        Self {
            current: start,
            end,
            step,
            chunks: chunk_fields(catalog),
        }
    }
}

impl Iterator for WindowIter {
    type Item = WindowSlice;

    fn next(&mut self) -> Option<WindowSlice> {
        if self.current > self.end {
            return None;
        }

        let next_start = self.step.advance(self.current);
        let window_end = next_start
            .checked_sub_days(Days::new(1))
            .map(|d| d.min(self.end))
            .unwrap_or(self.end);
        let window = DateWindow::new(self.current, window_end);

        let chunks = self
            .chunks
            .iter()
            .map(|fields| ChunkRequest::new(window, fields))
            .collect();

        self.current = next_start;
        Some(WindowSlice { window, chunks })
    }
}
