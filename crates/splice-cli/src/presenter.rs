//! Renders orchestrator views for the terminal and output files.
//!
//! Success writes the output (text plus reference line) to stdout or the
//! `--output` file and the map JSON to `--map`. Failure writes an
//! `error:` banner to stderr and leaves previously written output alone.

use anyhow::Context;
use splice_runtime::{Transformed, View};
use splice_types::Sequence;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

/// Where successful results go.
#[derive(Debug, Clone, Default)]
pub struct Targets {
    /// Output file; stdout when `None`.
    pub output: Option<PathBuf>,
    /// Map JSON file; not written when `None`.
    pub map: Option<PathBuf>,
}

/// What a call to [`Presenter::present`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    /// A successful result was written.
    Output,
    /// The view carries an error; the banner was printed.
    Failure,
    /// Nothing new to show.
    Unchanged,
}

pub struct Presenter<O, E> {
    targets: Targets,
    out: O,
    err: E,
    shown: Sequence,
}

impl Presenter<io::Stdout, io::Stderr> {
    /// Presenter bound to the process stdout and stderr.
    pub fn stdio(targets: Targets) -> Self {
        Self::new(targets, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Presenter<O, E> {
    pub fn new(targets: Targets, out: O, err: E) -> Self {
        Self {
            targets,
            out,
            err,
            shown: Sequence::ZERO,
        }
    }

    /// Presents `view` unless it was already shown.
    pub fn present(&mut self, view: &View) -> anyhow::Result<Presented> {
        if view.sequence <= self.shown {
            return Ok(Presented::Unchanged);
        }
        self.shown = view.sequence;

        if let Some(failure) = &view.error {
            debug!(sequence = %view.sequence, kind = %failure.kind, "presenting failure");
            writeln!(self.err, "error: {}", failure.message)?;
            if view.success.is_some() {
                writeln!(self.err, "note: keeping output of the last successful run")?;
            }
            self.err.flush()?;
            return Ok(Presented::Failure);
        }

        match &view.success {
            Some(transformed) => {
                self.write_success(transformed)?;
                Ok(Presented::Output)
            }
            None => Ok(Presented::Unchanged),
        }
    }

    fn write_success(&mut self, transformed: &Transformed) -> anyhow::Result<()> {
        for line in &transformed.console {
            writeln!(self.err, "print: {line}")?;
        }
        self.err.flush()?;

        match &self.targets.output {
            Some(path) => std::fs::write(path, &transformed.output)
                .with_context(|| format!("failed to write output to {}", path.display()))?,
            None => {
                writeln!(self.out, "{}", transformed.output)?;
                self.out.flush()?;
            }
        }

        if let Some(path) = &self.targets.map {
            let json = transformed.map.to_json()?;
            std::fs::write(path, json)
                .with_context(|| format!("failed to write source map to {}", path.display()))?;
        }

        Ok(())
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}
