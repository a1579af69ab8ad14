use crate::domain::payment::TransactionStatus;
use crate::error::Result;
use std::io::Write;

/// Writes the status sequence as CSV with a header row.
///
/// Columns: `recipient,amount,status,hash,error`; absent fields are empty.
pub struct StatusWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatusWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new().from_writer(sink);
        Self { writer }
    }

    pub fn write_statuses(&mut self, statuses: &[TransactionStatus]) -> Result<()> {
        for status in statuses {
            self.writer.serialize(status)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the status sequence as a pretty-printed JSON array.
pub fn write_json<W: Write>(mut sink: W, statuses: &[TransactionStatus]) -> Result<()> {
    serde_json::to_writer_pretty(&mut sink, statuses)?;
    writeln!(sink)?;
    Ok(())
}
