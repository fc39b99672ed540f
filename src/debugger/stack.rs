use crate::debugger::context::ExecutionContext;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::path::Path;

/// Kind of execution unit a stack frame represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum FrameCategory {
    #[strum(serialize = "suite")]
    Suite,
    #[strum(serialize = "test")]
    Test,
    #[strum(serialize = "keyword")]
    Keyword,
    #[strum(serialize = "for")]
    For,
    #[strum(serialize = "for item")]
    ForItem,
}

/// Single frame of the reconstructed call stack.
///
/// `level` is the variable-scope depth used for variable lookup, which is not
/// always the physical stack depth: library keywords and for-loop frames do
/// not open a new scope.
#[derive(Debug)]
pub struct StackFrame {
    name: String,
    category: FrameCategory,
    level: usize,
    context: ExecutionContext,
    stepping: bool,
    error: bool,
    loaded_resources: IndexSet<String>,
    variables: HashMap<String, String>,
    current_keyword: Option<String>,
}

impl StackFrame {
    pub fn new(
        name: impl Into<String>,
        category: FrameCategory,
        level: usize,
        context: ExecutionContext,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            level,
            context,
            stepping: false,
            error: false,
            loaded_resources: IndexSet::new(),
            variables: HashMap::new(),
            current_keyword: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> FrameCategory {
        self.category
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    pub fn has_error_mark(&self) -> bool {
        self.error
    }

    pub(super) fn set_stepping(&mut self, on: bool) {
        self.stepping = on;
    }

    pub(super) fn mark_error(&mut self) {
        self.error = true;
    }

    /// Resources currently loaded by this frame (meaningful for suites only).
    pub fn loaded_resources(&self) -> &IndexSet<String> {
        &self.loaded_resources
    }

    pub(super) fn attach_resources(&mut self, resources: IndexSet<String>) {
        self.loaded_resources.extend(resources);
    }

    pub(super) fn add_resource(&mut self, resource: impl Into<String>) {
        self.loaded_resources.insert(resource.into());
    }

    /// Variables currently visible in this frame.
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub(super) fn merge_variables(&mut self, variables: HashMap<String, String>) {
        self.variables.extend(variables);
    }

    /// Name of the keyword this frame is about to call, recorded at the
    /// "keyword about to start" instant so a line-level breakpoint can be
    /// resolved before the callee frame physically exists.
    pub fn current_keyword(&self) -> Option<&str> {
        self.current_keyword.as_deref()
    }

    pub(super) fn set_current_keyword(&mut self, keyword: impl Into<String>) {
        self.current_keyword = Some(keyword.into());
    }

    /// Close the "inside a keyword call" scope after a child keyword exited.
    pub(super) fn on_child_keyword_exit(&mut self) {
        self.current_keyword = None;
    }

    /// Keyword name qualified by its owning library/resource, used to key
    /// keyword-failure breakpoints. Falls back to the bare name when the
    /// context carries no library.
    pub fn qualified_name(&self) -> String {
        match self.context.library_name() {
            Some(library) => format!("{library}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Ordered LIFO sequence of stack frames plus the side channel of resource
/// imports collected before any suite frame exists.
#[derive(Debug, Default)]
pub struct Stacktrace {
    frames: Vec<StackFrame>,
    pending_resources: IndexSet<String>,
}

impl Stacktrace {
    pub fn push(&mut self, frame: StackFrame) {
        if frame.category == FrameCategory::ForItem {
            let below = self.frames.last().map(|f| f.category);
            assert_eq!(
                below,
                Some(FrameCategory::For),
                "a for-item frame must sit directly above a for frame"
            );
        }
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> StackFrame {
        self.frames
            .pop()
            .expect("stack underflow: pop on an empty stacktrace")
    }

    pub fn current(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub(super) fn current_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&StackFrame> {
        self.frames.get(index)
    }

    pub(super) fn frame_mut(&mut self, index: usize) -> Option<&mut StackFrame> {
        self.frames.get_mut(index)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Nearest enclosing suite frame, seen from the top of the stack.
    pub fn current_suite(&self) -> Option<&StackFrame> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.category == FrameCategory::Suite)
    }

    pub(super) fn current_suite_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames
            .iter_mut()
            .rev()
            .find(|f| f.category == FrameCategory::Suite)
    }

    /// Source path of the nearest enclosing suite, the path that governs
    /// context resolution for frames pushed above it.
    pub fn governing_source(&self) -> Option<&Path> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.context.source())
    }

    /// Scope level for a library keyword: the nearest enclosing test frame's
    /// level, or the nearest enclosing suite frame's level if no test frame
    /// exists. Library keywords never open a new variable scope.
    pub fn library_keyword_level(&self) -> usize {
        self.frames
            .iter()
            .rev()
            .find(|f| f.category == FrameCategory::Test)
            .or_else(|| self.current_suite())
            .map(|f| f.level)
            .unwrap_or(0)
    }

    pub fn any_stepping(&self) -> bool {
        self.frames.iter().any(|f| f.stepping)
    }

    pub(super) fn clear_stepping_marks(&mut self) {
        self.frames.iter_mut().for_each(|f| f.stepping = false);
    }

    pub(super) fn add_pending_resource(&mut self, resource: impl Into<String>) {
        self.pending_resources.insert(resource.into());
    }

    pub(super) fn take_pending_resources(&mut self) -> IndexSet<String> {
        std::mem::take(&mut self.pending_resources)
    }

    pub(super) fn clear(&mut self) {
        self.frames.clear();
        self.pending_resources.clear();
    }
}
