//! Printers for the headless mode: program streams and run stats.

use std::io::Write;

use owo_colors::OwoColorize;

use crate::presentation::{format_stats, DisplayModel};

pub struct ResultPrinter {
    pub color: bool,
}

impl ResultPrinter {
    pub fn print(&self, model: &DisplayModel) {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        // Closed pipe, e.g. under `| head`.
        if let Err(e) = self.write_to(model, &mut stdout.lock(), &mut stderr.lock()) {
            tracing::debug!(error = %e, "failed to write run result");
        }
    }

    /// Stdout text goes to `out` verbatim; stderr text and stats go to `err`.
    pub fn write_to(&self, model: &DisplayModel, out: &mut impl Write, err: &mut impl Write) -> std::io::Result<()> {
        if !model.stdout_text.is_empty() {
            write!(out, "{}", model.stdout_text)?;
            if !model.stdout_text.ends_with('\n') {
                writeln!(out)?;
            }
        }
        if !model.stderr_text.is_empty() {
            let text = model.stderr_text.trim_end_matches('\n');
            if self.color {
                writeln!(err, "{}", text.red())?;
            } else {
                writeln!(err, "{}", text)?;
            }
        }
        if let Some(stats) = format_stats(model) {
            if self.color {
                writeln!(err, "{}", stats.dimmed())?;
            } else {
                writeln!(err, "{}", stats)?;
            }
        }
        Ok(())
    }
}
