// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Result Sinks
//
// The raw trial feed handed to exporters. A sink sees `begin` once with the
// component columns in declaration order, then every record of every
// scenario exactly once, then `finish`.

use std::io::Write;

use crate::engine::TrialRecord;
use crate::error::Result;

pub trait ResultSink {
    fn begin(&mut self, _columns: &[String]) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, record: &TrialRecord) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

// ─── In-Memory ──────────────────────────────────────────────────────────────

/// Keeps every record, for callers that want the full raw set.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub columns: Vec<String>,
    pub records: Vec<TrialRecord>,
}

impl ResultSink for CollectSink {
    fn begin(&mut self, columns: &[String]) -> Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

// ─── JSONL ──────────────────────────────────────────────────────────────────

/// One JSON object per line, keyed like the CSV header.
pub struct JsonlSink<W: Write> {
    out: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for JsonlSink<W> {
    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

// ─── CSV ────────────────────────────────────────────────────────────────────

/// `scenario,trial,<component>...,total_harm`, one row per trial.
pub struct CsvSink<W: Write> {
    out: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn begin(&mut self, columns: &[String]) -> Result<()> {
        let mut header = String::from("scenario,trial");
        for c in columns {
            header.push(',');
            header.push_str(&csv_field(c));
        }
        header.push_str(",total_harm");
        writeln!(self.out, "{}", header)?;
        Ok(())
    }

    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        let mut row = format!("{},{}", csv_field(record.scenario()), record.trial());
        for v in record.values() {
            row.push_str(&format!(",{}", v));
        }
        row.push_str(&format!(",{}", record.total_harm()));
        writeln!(self.out, "{}", row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
