//! CSV decision log adapter.
//!
//! Appends decision records to one CSV file per calendar day
//! (`YYYY-MM-DD.csv`) under a base directory. The header is written when a
//! day's file is first created and never repeated, so a restarted run
//! appends cleanly. Optionally echoes a one-line summary to stderr.

use crate::domain::engine::DecisionRecord;
use crate::domain::error::PapertraderError;
use crate::ports::log_port::DecisionLogPort;
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

pub struct CsvLogAdapter {
    base_path: PathBuf,
    echo: bool,
    writer: Option<(NaiveDate, csv::Writer<std::fs::File>)>,
}

impl CsvLogAdapter {
    pub fn new(base_path: PathBuf, echo: bool) -> Self {
        Self {
            base_path,
            echo,
            writer: None,
        }
    }

    fn writer_for(
        &mut self,
        day: NaiveDate,
    ) -> Result<&mut csv::Writer<std::fs::File>, PapertraderError> {
        let stale = !matches!(&self.writer, Some((current_day, _)) if *current_day == day);

        if stale {
            fs::create_dir_all(&self.base_path)?;
            let path = self.base_path.join(format!("{}.csv", day.format("%Y-%m-%d")));
            let existed = path.exists();
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let writer = csv::WriterBuilder::new()
                .has_headers(!existed)
                .from_writer(file);
            let (_, writer) = self.writer.insert((day, writer));
            return Ok(writer);
        }

        let Some((_, writer)) = self.writer.as_mut() else {
            return Err(PapertraderError::Data {
                reason: "decision log writer unavailable".into(),
            });
        };
        Ok(writer)
    }
}

impl DecisionLogPort for CsvLogAdapter {
    fn record(&mut self, record: &DecisionRecord) -> Result<(), PapertraderError> {
        let echo = self.echo;
        let writer = self.writer_for(record.timestamp.date())?;

        writer
            .serialize(record)
            .map_err(|e| PapertraderError::Data {
                reason: format!("failed to write decision record: {}", e),
            })?;
        writer.flush()?;

        if echo {
            eprintln!(
                "[{}] {} {} ({}) price={:.2} equity={:.2}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.ticker,
                record.decision,
                record.decision_reason,
                record.price,
                record.equity,
            );
        }

        Ok(())
    }
}
