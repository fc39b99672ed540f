use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointKind {
    /// Breaks when the instrumented process is about to execute the keyword
    /// call at `line` of `source`.
    Line { source: PathBuf, line: u32 },
    /// Breaks when the keyword with this qualified name has just failed.
    KeywordFailure { keyword: String },
}

/// Breakpoint representation.
///
/// Owned by the preferences/config collaborator and handed to the debugger
/// core behind an `Arc`; the core only reads it, except for the hit counter
/// which it advances while evaluating a hit.
#[derive(Debug)]
pub struct Breakpoint {
    kind: BreakpointKind,
    enabled: AtomicBool,
    hit_interval: u32,
    hit_counter: AtomicU32,
    condition: Option<String>,
}

impl Breakpoint {
    fn new_inner(kind: BreakpointKind) -> Self {
        Self {
            kind,
            enabled: AtomicBool::new(true),
            hit_interval: 1,
            hit_counter: AtomicU32::new(0),
            condition: None,
        }
    }

    pub fn line(source: impl Into<PathBuf>, line: u32) -> Self {
        Self::new_inner(BreakpointKind::Line {
            source: source.into(),
            line,
        })
    }

    pub fn keyword_failure(keyword: impl Into<String>) -> Self {
        Self::new_inner(BreakpointKind::KeywordFailure {
            keyword: keyword.into(),
        })
    }

    /// Make the breakpoint fire on every `interval`-th hit only.
    pub fn with_hit_interval(mut self, interval: u32) -> Self {
        self.hit_interval = interval;
        self
    }

    pub fn with_condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }

    pub fn kind(&self) -> &BreakpointKind {
        &self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst)
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst)
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_counter.load(Ordering::SeqCst)
    }

    /// Register one physical hit and report whether the hit-count policy
    /// fires. The counter advances exactly once per call, an un-fired hit is
    /// never re-counted on a later evaluation.
    pub fn register_hit(&self) -> bool {
        let count = self.hit_counter.fetch_add(1, Ordering::SeqCst) + 1;
        count % self.hit_interval.max(1) == 0
    }
}
