//! Projection of session state onto what the output view displays.

use crate::{
    execution::ExecutionResult,
    session::{Phase, SessionState},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayModel {
    pub stdout_text: String,
    pub stderr_text: String,
    pub is_busy: bool,
    /// `None` means unknown, which renderers must not show as zero.
    pub elapsed_ms: Option<f64>,
    pub memory_kb: Option<u64>,
}

impl DisplayModel {
    pub fn has_output(&self) -> bool {
        !self.stdout_text.is_empty() || !self.stderr_text.is_empty()
    }
}

pub fn project(state: &SessionState) -> DisplayModel {
    let is_busy = state.phase == Phase::Running;
    match &state.result {
        Some(ExecutionResult::Success(out)) => DisplayModel {
            stdout_text: out.stdout.clone().unwrap_or_default(),
            stderr_text: out.stderr.clone().unwrap_or_default(),
            is_busy,
            elapsed_ms: out.elapsed_ms,
            memory_kb: out.memory_kb,
        },
        Some(ExecutionResult::Failure { message }) => DisplayModel {
            stderr_text: message.clone(),
            is_busy,
            ..DisplayModel::default()
        },
        None => DisplayModel { is_busy, ..DisplayModel::default() },
    }
}

pub fn format_elapsed(elapsed_ms: Option<f64>) -> Option<String> {
    elapsed_ms.map(|ms| format!("{ms:.2}ms"))
}

pub fn format_memory(memory_kb: Option<u64>) -> Option<String> {
    memory_kb.map(|kb| format!("{kb}KB"))
}

/// Stats line such as `12.35ms · 256KB`; `None` when nothing is known.
pub fn format_stats(model: &DisplayModel) -> Option<String> {
    let parts: Vec<String> = [format_elapsed(model.elapsed_ms), format_memory(model.memory_kb)]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}
