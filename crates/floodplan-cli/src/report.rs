//! Report writers
//!
//! JSON reports are wrapped in an envelope carrying a run id and timestamp.
//! CSV writers delegate to the planner.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use floodplan_planner::stats::write_stats_csv;
use floodplan_planner::{ChannelStats, ProjectPlan};
use serde::Serialize;
use uuid::Uuid;

/// JSON envelope around a command result
#[derive(Debug, Serialize)]
pub struct Report<'a, T: Serialize> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
    pub command: &'a str,
    pub payload: &'a T,
}

impl<'a, T: Serialize> Report<'a, T> {
    pub fn new(command: &'a str, payload: &'a T) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            generated_at: Utc::now(),
            version: floodplan_common::VERSION,
            command,
            payload,
        }
    }
}

/// Open `path` for writing, or stdout when absent
fn sink(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    })
}

pub fn write_json<T: Serialize>(command: &str, payload: &T, path: Option<&Path>) -> Result<Uuid> {
    let report = Report::new(command, payload);
    let mut out = sink(path)?;
    serde_json::to_writer_pretty(&mut out, &report).context("Failed to write JSON report")?;
    writeln!(out)?;
    out.flush()?;
    Ok(report.run_id)
}

pub fn write_plan_csv(plan: &ProjectPlan, path: Option<&Path>) -> Result<()> {
    let mut out = sink(path)?;
    plan.write_csv(&mut out)
        .context("Failed to write plan CSV")?;
    out.flush()?;
    Ok(())
}

pub fn write_stats(stats: &[ChannelStats], path: Option<&Path>) -> Result<()> {
    let mut out = sink(path)?;
    write_stats_csv(stats, &mut out).context("Failed to write stats CSV")?;
    out.flush()?;
    Ok(())
}
