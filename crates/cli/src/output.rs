use engine::{error::SyncError, sync::RecordSink};
use model::record::AnalyticsRecord;
use std::{
    fs::File,
    io::{BufWriter, Write},
};
use tracing::info;

/// Newline-delimited JSON record sink, writing to a file or stdout.
pub struct JsonLinesSink {
    writer: BufWriter<Box<dyn Write>>,
}

impl JsonLinesSink {
    pub fn create(path: Option<&str>) -> Result<Self, SyncError> {
        let target: Box<dyn Write> = match path {
            Some(path) => {
                info!(path, "writing records to file");
                Box::new(File::create(path)?)
            }
            None => Box::new(std::io::stdout()),
        };
        Ok(Self {
            writer: BufWriter::new(target),
        })
    }

    pub fn flush(&mut self) -> Result<(), SyncError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl RecordSink for JsonLinesSink {
    fn write(&mut self, record: &AnalyticsRecord) -> Result<(), SyncError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
