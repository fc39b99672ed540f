use std::collections::HashMap;
use std::path::PathBuf;

/// Shape of a keyword call reported by the instrumented process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningKeywordKind {
    Normal,
    /// The reserved for-loop construct of the test language.
    ForLoop,
}

/// One fixed instant of keyword execution at which the controller may decide
/// to suspend the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PausingPoint {
    #[strum(serialize = "pre start keyword")]
    PreStartKeyword,
    #[strum(serialize = "start keyword")]
    StartKeyword,
    #[strum(serialize = "pre end keyword")]
    PreEndKeyword,
    #[strum(serialize = "end keyword")]
    EndKeyword,
}

/// Lifecycle event of the instrumented test-running process, already
/// deserialized by the transport layer. Events arrive strictly ordered, one
/// per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    SuiteStarted {
        name: String,
        source: PathBuf,
        directory: bool,
    },
    SuiteEnded,
    TestStarted {
        name: String,
        template: Option<String>,
    },
    TestEnded,
    /// Fired before the keyword frame physically exists, defines the
    /// pre-start-keyword pausing point.
    KeywordAboutToStart {
        name: String,
    },
    KeywordStarted {
        name: String,
        library_name: Option<String>,
        kind: RunningKeywordKind,
    },
    /// Pops the keyword frame and defines the pre-end-keyword pausing point,
    /// logically before the end-keyword notification.
    KeywordAboutToEnd {
        failed: bool,
    },
    KeywordEnded {
        name: String,
    },
    ResourceImport {
        source: PathBuf,
        dynamic: bool,
    },
    Variables {
        variables: HashMap<String, String>,
    },
    /// Result of a breakpoint-condition round trip on the remote process,
    /// `None` when the evaluation itself failed.
    ConditionEvaluated {
        result: Option<bool>,
    },
    Closed,
}
