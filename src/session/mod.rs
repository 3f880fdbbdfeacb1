//! Execution session: the idle → running → settled lifecycle of one editor.
//!
//! A run is split in two so callers that cannot hold the session across an
//! await (the TUI event loop) can still drive it:
//!
//! * [`Session::begin`] does the synchronous part: resolve the language, build
//!   the request, drop the previous result and enter `Running`.
//! * [`PendingRun::execute`] is the only suspension point.
//! * [`Session::settle`] is the single entry point that applies a result.
//!
//! Every `begin` allocates a fresh token and `clear` forgets the current one,
//! so a settlement that was superseded or cleared is discarded instead of
//! resurrecting stale output.

use std::sync::Arc;

use crate::{
    execution::{ExecutionRequest, ExecutionResult, Executor},
    languages::{LanguageDescriptor, Registry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub result: Option<ExecutionResult>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { phase: Phase::Idle, result: None }
    }
}

/// Identifies one `begin` call. Monotonic within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunToken(u64);

/// A result tagged with the run it belongs to.
#[derive(Debug)]
pub struct Settlement {
    pub token: RunToken,
    pub result: ExecutionResult,
}

/// The asynchronous half of a run, detached from the session.
pub struct PendingRun {
    pub token: RunToken,
    pub request: ExecutionRequest,
    executor: Arc<dyn Executor>,
}

impl PendingRun {
    pub async fn execute(self) -> Settlement {
        let result = self.executor.submit(self.request).await;
        Settlement { token: self.token, result }
    }
}

pub struct Session {
    registry: Registry,
    executor: Arc<dyn Executor>,
    state: SessionState,
    next_seq: u64,
    current: Option<RunToken>,
    language: Option<&'static LanguageDescriptor>,
    stdin: String,
}

impl Session {
    pub fn new(registry: Registry, executor: Arc<dyn Executor>) -> Self {
        Self {
            registry,
            executor,
            state: SessionState::default(),
            next_seq: 0,
            current: None,
            language: None,
            stdin: String::new(),
        }
    }

    /// Program input sent with every subsequent run.
    pub fn set_stdin(&mut self, stdin: impl Into<String>) {
        self.stdin = stdin.into();
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == Phase::Running
    }

    /// Language of the most recent run, if any.
    pub fn language(&self) -> Option<&'static LanguageDescriptor> {
        self.language
    }

    /// Enter `Running` and hand back the request to await. Synchronous, so
    /// the busy state is visible before any I/O happens.
    pub fn begin(&mut self, source_code: &str, language_key: &str) -> PendingRun {
        let lang = self.registry.describe(language_key);
        let request = ExecutionRequest::new(lang.execution_id, source_code, self.stdin.as_str());

        self.next_seq += 1;
        let token = RunToken(self.next_seq);
        if let Some(prev) = self.current.replace(token) {
            tracing::debug!(?prev, ?token, "run superseded before settling");
        }
        self.language = Some(lang);
        self.state = SessionState { phase: Phase::Running, result: None };

        tracing::debug!(?token, language = lang.key, "run started");
        PendingRun {
            token,
            request,
            executor: Arc::clone(&self.executor),
        }
    }

    /// Apply a settlement. Returns `false` when it belongs to a superseded or
    /// cleared run, in which case the state is left untouched.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        if self.current != Some(settlement.token) {
            tracing::debug!(token = ?settlement.token, current = ?self.current, "discarding stale settlement");
            return false;
        }
        self.current = None;
        self.state = SessionState {
            phase: Phase::Settled,
            result: Some(settlement.result),
        };
        true
    }

    /// Begin, await and settle in one call.
    pub async fn run(&mut self, source_code: &str, language_key: &str) -> &SessionState {
        let pending = self.begin(source_code, language_key);
        let settlement = pending.execute().await;
        self.settle(settlement);
        &self.state
    }

    /// Reset to `Idle` from any phase. An in-flight request keeps running but
    /// its settlement will be discarded.
    pub fn clear(&mut self) {
        self.current = None;
        self.state = SessionState::default();
    }
}
