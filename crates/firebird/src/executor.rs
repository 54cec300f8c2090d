//! Running generated DDL against a database.

use std::io::Write;

use firebird_types::{DdlPlan, SkippedObject};
use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Something that can run a single SQL statement.
pub trait StatementExecutor {
    fn execute(&mut self, sql: &str) -> Result<()>;
}

/// A statement that did not run.
#[derive(Debug)]
pub struct StatementFailure {
    /// Position in the applied sequence, starting at 0.
    pub index: usize,
    /// Short description of the statement.
    pub statement: String,
    pub error: Error,
}

/// Outcome of [`apply`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: usize,
    pub failures: Vec<StatementFailure>,
    /// Snapshot objects that never produced a statement.
    pub skipped: Vec<SkippedObject>,
}

impl ApplyReport {
    /// No statement failed and no object was skipped.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.applied + self.failures.len()
    }
}

/// Execute `statements` in order.
///
/// A failing statement is logged and recorded, then execution moves on to
/// the next one. Nothing is rolled back.
pub fn apply<'a, E, I>(executor: &mut E, statements: I) -> ApplyReport
where
    E: StatementExecutor + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut report = ApplyReport::default();

    for (index, sql) in statements.into_iter().enumerate() {
        match executor.execute(sql) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                let statement = describe(sql);
                error!("Statement {index} ({statement}) failed: {e}");
                let error = match e {
                    Error::StatementExecution(_) => e,
                    other => Error::StatementExecution(other.to_string()),
                };
                report.failures.push(StatementFailure {
                    index,
                    statement,
                    error,
                });
            }
        }
    }

    info!(
        "Applied {} of {} statements ({} failed)",
        report.applied,
        report.attempted(),
        report.failures.len()
    );
    report
}

/// Execute a whole plan, carrying its skipped objects into the report.
pub fn apply_plan<E>(executor: &mut E, plan: &DdlPlan) -> ApplyReport
where
    E: StatementExecutor + ?Sized,
{
    let mut report = apply(executor, plan.statements());
    report.skipped = plan.skipped.clone();
    if !report.skipped.is_empty() {
        warn!(
            "{} snapshot objects were not applied because no statement could be generated",
            report.skipped.len()
        );
    }
    report
}

/// First line of the statement that actually creates something.
///
/// For guarded blocks this is the head of the embedded statement.
pub fn describe(sql: &str) -> String {
    const EMBEDDED: &str = "EXECUTE STATEMENT '";
    let target = match sql.find(EMBEDDED) {
        Some(pos) if sql.trim_start().starts_with("EXECUTE BLOCK") => &sql[pos + EMBEDDED.len()..],
        _ => sql,
    };
    target
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim_end_matches(['(', ' ', '\'', ';'])
        .to_string()
}

/// Writes statements instead of running them.
///
/// Each statement is followed by a blank line.
pub struct DryRunExecutor<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> DryRunExecutor<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatementExecutor for DryRunExecutor<W> {
    fn execute(&mut self, sql: &str) -> Result<()> {
        writeln!(self.out, "{sql}\n").map_err(|e| Error::StatementExecution(e.to_string()))?;
        self.written += 1;
        Ok(())
    }
}
