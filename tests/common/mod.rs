#![allow(dead_code)]

use robodbg::debugger::breakpoint::Breakpoint;
use robodbg::debugger::context::{
    CaseContext, ExecutionContext, ForLoopContext, ForLoopIterationContext, KeywordContext,
    SuiteContext,
};
use robodbg::debugger::event::{ExecutionEvent, RunningKeywordKind};
use robodbg::debugger::{
    BreakpointSupplier, Debugger, EventHook, Locator, Preferences, SteppingMode,
};
use indexmap::IndexSet;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Locator stub resolving contexts from a scripted description of the test
/// material: which keywords are library ones, which contexts are erroneous
/// and which names are unresolvable.
#[derive(Default)]
pub struct ScriptedLocator {
    pub library_keywords: HashSet<String>,
    pub erroneous_keywords: HashMap<String, String>,
    pub erroneous_tests: HashMap<String, String>,
    pub unresolved: HashSet<String>,
}

impl ScriptedLocator {
    pub fn with_library_keyword(mut self, name: &str) -> Self {
        self.library_keywords.insert(name.to_string());
        self
    }

    pub fn with_erroneous_keyword(mut self, name: &str, message: &str) -> Self {
        self.erroneous_keywords
            .insert(name.to_string(), message.to_string());
        self
    }

    pub fn with_erroneous_test(mut self, name: &str, message: &str) -> Self {
        self.erroneous_tests
            .insert(name.to_string(), message.to_string());
        self
    }

    pub fn with_unresolved(mut self, name: &str) -> Self {
        self.unresolved.insert(name.to_string());
        self
    }
}

impl Locator for ScriptedLocator {
    fn find_suite_context(
        &self,
        name: &str,
        source: &Path,
        _directory: bool,
        _current_source: Option<&Path>,
    ) -> Option<SuiteContext> {
        if self.unresolved.contains(name) {
            return None;
        }
        Some(SuiteContext {
            source: Some(source.to_path_buf()),
            ..Default::default()
        })
    }

    fn find_case_context(
        &self,
        name: &str,
        _source: Option<&Path>,
        _template: Option<&str>,
    ) -> Option<CaseContext> {
        if self.unresolved.contains(name) {
            return None;
        }
        let error = self.erroneous_tests.get(name).cloned();
        Some(CaseContext {
            erroneous: error.is_some(),
            error_message: error,
        })
    }

    fn find_keyword_context(
        &self,
        library_name: Option<&str>,
        name: &str,
        _source: Option<&Path>,
        _loaded_resources: &IndexSet<String>,
    ) -> Option<KeywordContext> {
        if self.unresolved.contains(name) {
            return None;
        }
        let error = self.erroneous_keywords.get(name).cloned();
        Some(KeywordContext {
            library_name: library_name.map(ToString::to_string),
            library: self.library_keywords.contains(name),
            erroneous: error.is_some(),
            error_message: error,
        })
    }

    fn find_loop_context(&self, parent: &ExecutionContext) -> Option<ForLoopContext> {
        Some(ForLoopContext {
            erroneous: parent.is_erroneous(),
            error_message: parent.error_message().map(ToString::to_string),
        })
    }

    fn find_loop_iteration_context(
        &self,
        parent: &ExecutionContext,
        _name: &str,
    ) -> Option<ForLoopIterationContext> {
        Some(ForLoopIterationContext {
            erroneous: parent.is_erroneous(),
            error_message: parent.error_message().map(ToString::to_string),
        })
    }
}

/// Breakpoint store with line breakpoints keyed by the keyword a frame is
/// about to call and failure breakpoints keyed by qualified keyword name.
#[derive(Default)]
pub struct StaticBreakpoints {
    pub line: HashMap<String, Arc<Breakpoint>>,
    pub keyword_failure: HashMap<String, Arc<Breakpoint>>,
}

impl StaticBreakpoints {
    pub fn with_line(mut self, keyword: &str, breakpoint: Breakpoint) -> Self {
        self.line.insert(keyword.to_string(), Arc::new(breakpoint));
        self
    }

    pub fn with_keyword_failure(mut self, qualified: &str, breakpoint: Breakpoint) -> Self {
        self.keyword_failure
            .insert(qualified.to_string(), Arc::new(breakpoint));
        self
    }
}

impl BreakpointSupplier for StaticBreakpoints {
    fn line_breakpoint_for(
        &self,
        frame: &robodbg::debugger::stack::StackFrame,
    ) -> Option<Arc<Breakpoint>> {
        frame
            .current_keyword()
            .and_then(|keyword| self.line.get(keyword))
            .cloned()
    }

    fn keyword_failure_breakpoint_for(
        &self,
        _frame: &robodbg::debugger::stack::StackFrame,
        keyword: &str,
    ) -> Option<Arc<Breakpoint>> {
        self.keyword_failure.get(keyword).cloned()
    }
}

#[derive(Default)]
pub struct TestPreferences {
    pub pause_on_error: bool,
    pub go_into_library_keywords: bool,
}

impl Preferences for TestPreferences {
    fn pause_on_error(&self) -> bool {
        self.pause_on_error
    }

    fn go_into_library_keywords(&self) -> bool {
        self.go_into_library_keywords
    }
}

/// Hook recording every pause-reason notification as a readable string.
#[derive(Clone, Default)]
pub struct RecordingHook {
    pub notifications: Rc<RefCell<Vec<String>>>,
}

impl RecordingHook {
    pub fn taken(&self) -> Vec<String> {
        self.notifications.borrow().clone()
    }
}

impl EventHook for RecordingHook {
    fn on_breakpoint(&self, breakpoint: &Breakpoint) -> anyhow::Result<()> {
        self.notifications
            .borrow_mut()
            .push(format!("breakpoint: {:?}", breakpoint.kind()));
        Ok(())
    }

    fn on_user_pause(&self) -> anyhow::Result<()> {
        self.notifications.borrow_mut().push("user pause".into());
        Ok(())
    }

    fn on_stepping(&self, mode: SteppingMode) -> anyhow::Result<()> {
        self.notifications
            .borrow_mut()
            .push(format!("stepping {mode}"));
        Ok(())
    }

    fn on_error_state(&self, message: &str) -> anyhow::Result<()> {
        self.notifications
            .borrow_mut()
            .push(format!("error: {message}"));
        Ok(())
    }

    fn on_variable_change(&self) -> anyhow::Result<()> {
        self.notifications
            .borrow_mut()
            .push("variable change".into());
        Ok(())
    }

    fn on_expression_evaluated(&self) -> anyhow::Result<()> {
        self.notifications
            .borrow_mut()
            .push("expression evaluated".into());
        Ok(())
    }
}

pub fn debugger_with(
    locator: ScriptedLocator,
    breakpoints: StaticBreakpoints,
    preferences: TestPreferences,
) -> (Debugger, RecordingHook) {
    init_logger();
    let hook = RecordingHook::default();
    let debugger = Debugger::new(locator, breakpoints, preferences, hook.clone());
    (debugger, hook)
}

// ---------------------------------- event script helpers ----------------------------------------

pub fn suite_started(name: &str) -> ExecutionEvent {
    ExecutionEvent::SuiteStarted {
        name: name.to_string(),
        source: PathBuf::from(format!("{name}.robot")),
        directory: false,
    }
}

pub fn test_started(name: &str) -> ExecutionEvent {
    ExecutionEvent::TestStarted {
        name: name.to_string(),
        template: None,
    }
}

pub fn keyword_about_to_start(name: &str) -> ExecutionEvent {
    ExecutionEvent::KeywordAboutToStart {
        name: name.to_string(),
    }
}

pub fn keyword_started(name: &str, library: Option<&str>) -> ExecutionEvent {
    ExecutionEvent::KeywordStarted {
        name: name.to_string(),
        library_name: library.map(ToString::to_string),
        kind: RunningKeywordKind::Normal,
    }
}

pub fn for_loop_started(name: &str) -> ExecutionEvent {
    ExecutionEvent::KeywordStarted {
        name: name.to_string(),
        library_name: None,
        kind: RunningKeywordKind::ForLoop,
    }
}

pub fn keyword_about_to_end(failed: bool) -> ExecutionEvent {
    ExecutionEvent::KeywordAboutToEnd { failed }
}

pub fn keyword_ended(name: &str) -> ExecutionEvent {
    ExecutionEvent::KeywordEnded {
        name: name.to_string(),
    }
}

/// Feed a whole event script, asserting that no event produced a response.
pub fn feed_quiet(debugger: &mut Debugger, events: Vec<ExecutionEvent>) {
    for event in events {
        let response = debugger.handle_event(event.clone()).expect("event rejected");
        assert_eq!(response, None, "unexpected response for {event:?}");
    }
}
