use std::path::{Path, PathBuf};

/// Execution context of a suite frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteContext {
    pub source: Option<PathBuf>,
    pub erroneous: bool,
    pub error_message: Option<String>,
}

/// Execution context of a test-case frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseContext {
    pub erroneous: bool,
    pub error_message: Option<String>,
}

/// Execution context of a keyword frame.
///
/// `library` distinguishes externally implemented (library) keywords from
/// user-defined ones, this flag drives the frame level computation and the
/// step-into/step-return predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordContext {
    pub library_name: Option<String>,
    pub library: bool,
    pub erroneous: bool,
    pub error_message: Option<String>,
}

/// Execution context of a for-loop head frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForLoopContext {
    pub erroneous: bool,
    pub error_message: Option<String>,
}

/// Execution context of a single for-loop iteration, chained from the
/// enclosing loop context at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForLoopIterationContext {
    pub erroneous: bool,
    pub error_message: Option<String>,
}

/// Closed set of execution contexts, one variant per frame category.
///
/// [`ExecutionContext::Unknown`] stands in when the locator cannot resolve
/// anything usable: the frame is still pushed so stack bookkeeping stays
/// correct, but breakpoint/stepping/error decisions become no-ops for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionContext {
    Suite(SuiteContext),
    Case(CaseContext),
    Keyword(KeywordContext),
    ForLoop(ForLoopContext),
    ForLoopIteration(ForLoopIterationContext),
    Unknown,
}

impl ExecutionContext {
    pub fn is_erroneous(&self) -> bool {
        match self {
            ExecutionContext::Suite(ctx) => ctx.erroneous,
            ExecutionContext::Case(ctx) => ctx.erroneous,
            ExecutionContext::Keyword(ctx) => ctx.erroneous,
            ExecutionContext::ForLoop(ctx) => ctx.erroneous,
            ExecutionContext::ForLoopIteration(ctx) => ctx.erroneous,
            ExecutionContext::Unknown => false,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExecutionContext::Suite(ctx) => ctx.error_message.as_deref(),
            ExecutionContext::Case(ctx) => ctx.error_message.as_deref(),
            ExecutionContext::Keyword(ctx) => ctx.error_message.as_deref(),
            ExecutionContext::ForLoop(ctx) => ctx.error_message.as_deref(),
            ExecutionContext::ForLoopIteration(ctx) => ctx.error_message.as_deref(),
            ExecutionContext::Unknown => None,
        }
    }

    /// Whether this context denotes an externally implemented keyword.
    /// Always `false` for non-keyword contexts.
    pub fn is_library_keyword(&self) -> bool {
        matches!(self, ExecutionContext::Keyword(ctx) if ctx.library)
    }

    /// Source path associated with the context (suites only).
    pub fn source(&self) -> Option<&Path> {
        match self {
            ExecutionContext::Suite(ctx) => ctx.source.as_deref(),
            _ => None,
        }
    }

    pub fn library_name(&self) -> Option<&str> {
        match self {
            ExecutionContext::Keyword(ctx) => ctx.library_name.as_deref(),
            _ => None,
        }
    }
}
