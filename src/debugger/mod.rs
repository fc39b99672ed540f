mod builder;
mod decision;
pub mod error;

pub mod breakpoint;
pub mod context;
pub mod event;
pub mod response;
pub mod stack;

use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::context::{
    CaseContext, ExecutionContext, ForLoopContext, ForLoopIterationContext, KeywordContext,
    SuiteContext,
};
use crate::debugger::error::Error;
use crate::debugger::event::PausingPoint;
use crate::debugger::response::{ExpressionKind, Response, VariableScope};
use crate::debugger::stack::{StackFrame, Stacktrace};
use indexmap::IndexSet;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Single-stepping granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SteppingMode {
    #[strum(serialize = "into")]
    Into,
    #[strum(serialize = "over")]
    Over,
    #[strum(serialize = "return")]
    Return,
}

/// Why the debugger decided to suspend the process. Held until the remote
/// process confirms it actually paused.
#[derive(Debug, Clone)]
pub enum Suspension {
    UserRequest,
    Breakpoint(Arc<Breakpoint>),
    Stepping(SteppingMode),
    VariableChange,
    ExpressionEvaluated,
    ErroneousState(String),
}

/// Resolves a human-readable execution context for suite/test/keyword/loop
/// names. Implemented by whatever owns the test-definition model.
pub trait Locator {
    fn find_suite_context(
        &self,
        name: &str,
        source: &Path,
        directory: bool,
        current_source: Option<&Path>,
    ) -> Option<SuiteContext>;

    fn find_case_context(
        &self,
        name: &str,
        source: Option<&Path>,
        template: Option<&str>,
    ) -> Option<CaseContext>;

    fn find_keyword_context(
        &self,
        library_name: Option<&str>,
        name: &str,
        source: Option<&Path>,
        loaded_resources: &IndexSet<String>,
    ) -> Option<KeywordContext>;

    fn find_loop_context(&self, parent: &ExecutionContext) -> Option<ForLoopContext>;

    fn find_loop_iteration_context(
        &self,
        parent: &ExecutionContext,
        name: &str,
    ) -> Option<ForLoopIterationContext>;
}

/// Looks up configured breakpoints for a stack location. Breakpoints stay
/// owned by the configuration layer, the core only evaluates hits.
pub trait BreakpointSupplier {
    fn line_breakpoint_for(&self, frame: &StackFrame) -> Option<Arc<Breakpoint>>;

    fn keyword_failure_breakpoint_for(
        &self,
        frame: &StackFrame,
        keyword: &str,
    ) -> Option<Arc<Breakpoint>>;
}

/// User preferences consulted by the decision state machine.
pub trait Preferences {
    fn pause_on_error(&self) -> bool;
    fn go_into_library_keywords(&self) -> bool;
}

/// Observer of confirmed suspensions, fired exactly once per pause.
pub trait EventHook {
    fn on_breakpoint(&self, breakpoint: &Breakpoint) -> anyhow::Result<()>;
    fn on_user_pause(&self) -> anyhow::Result<()>;
    fn on_stepping(&self, mode: SteppingMode) -> anyhow::Result<()>;
    fn on_error_state(&self, message: &str) -> anyhow::Result<()>;
    fn on_variable_change(&self) -> anyhow::Result<()>;
    fn on_expression_evaluated(&self) -> anyhow::Result<()>;
}

/// Mutable control state shared between event handling and the user-facing
/// request path. This is the only synchronized slot of the engine; a request
/// arriving before the matching pausing point supersedes whatever was armed
/// earlier (last write wins).
#[derive(Default)]
struct ControlState {
    suspension: Option<Suspension>,
    condition_pending: bool,
    stepping: Option<SteppingMode>,
    queued: VecDeque<Response>,
    last_pausing_point: Option<PausingPoint>,
}

/// Debugger core: reconstructs the call stack from the lifecycle event
/// stream and decides at each pausing point whether execution should pause.
pub struct Debugger {
    stack: Stacktrace,
    locator: Box<dyn Locator>,
    breakpoints: Box<dyn BreakpointSupplier>,
    preferences: Box<dyn Preferences>,
    hooks: Box<dyn EventHook>,
    control: Mutex<ControlState>,
    closed: bool,
}

impl Debugger {
    pub fn new(
        locator: impl Locator + 'static,
        breakpoints: impl BreakpointSupplier + 'static,
        preferences: impl Preferences + 'static,
        hooks: impl EventHook + 'static,
    ) -> Self {
        Self {
            stack: Stacktrace::default(),
            locator: Box::new(locator),
            breakpoints: Box::new(breakpoints),
            preferences: Box::new(preferences),
            hooks: Box::new(hooks),
            control: Mutex::new(ControlState::default()),
            closed: false,
        }
    }

    pub fn stacktrace(&self) -> &Stacktrace {
        &self.stack
    }

    fn control(&self) -> MutexGuard<'_, ControlState> {
        self.control.lock().expect("control state lock poisoned")
    }

    /// Request an unconditional pause. Overrides any in-progress step or
    /// pending condition decision; execution stops at the next pausing point.
    pub fn pause(&self) {
        let mut control = self.control();
        control.stepping = None;
        control.condition_pending = false;
        control.suspension = Some(Suspension::UserRequest);
        log::debug!(target: "controller", "user pause requested");
    }

    /// Resume execution, discarding any armed stepping mode, pending
    /// condition decision and queued responses.
    pub fn resume(&mut self) {
        let mut control = self.control();
        control.suspension = None;
        control.condition_pending = false;
        control.stepping = None;
        control.queued.clear();
        drop(control);
        self.stack.clear_stepping_marks();
        log::debug!(target: "controller", "resume requested");
    }

    /// Arm step-into mode. Not parameterized by a frame, only the top frame
    /// can be stepped into.
    pub fn step_into(&self) {
        let mut control = self.control();
        control.suspension = None;
        control.condition_pending = false;
        control.stepping = Some(SteppingMode::Into);
        log::debug!(target: "controller", "step into armed");
    }

    /// Arm step-over mode for the frame at `frame_index` (0 is the bottom of
    /// the stack). When the most recent pausing point was start-keyword the
    /// frame itself is already pushed, so its parent is marked instead:
    /// stepping over it means waiting for the parent's next sibling call.
    pub fn step_over(&mut self, frame_index: usize) -> Result<(), Error> {
        if frame_index >= self.stack.depth() {
            return Err(Error::FrameNotFound(frame_index as u32));
        }

        let mut control = self.control();
        let target = if control.last_pausing_point == Some(PausingPoint::StartKeyword) {
            // the frame to mark is the parent, the bottom frame has none
            frame_index
                .checked_sub(1)
                .ok_or(Error::FrameNotFound(frame_index as u32))?
        } else {
            frame_index
        };
        control.suspension = None;
        control.condition_pending = false;
        control.stepping = Some(SteppingMode::Over);
        drop(control);

        if let Some(frame) = self.stack.frame_mut(target) {
            frame.set_stepping(true);
        }
        log::debug!(target: "controller", "step over armed, frame {target} marked");
        Ok(())
    }

    /// Arm step-return mode for the frame at `frame_index`.
    pub fn step_return(&mut self, frame_index: usize) -> Result<(), Error> {
        if frame_index >= self.stack.depth() {
            return Err(Error::FrameNotFound(frame_index as u32));
        }

        let mut control = self.control();
        control.suspension = None;
        control.condition_pending = false;
        control.stepping = Some(SteppingMode::Return);
        drop(control);

        if let Some(frame) = self.stack.frame_mut(frame_index) {
            frame.set_stepping(true);
        }
        log::debug!(target: "controller", "step return armed, frame {frame_index} marked");
        Ok(())
    }

    /// Queue a change-variable request for the remote process. It is emitted
    /// at the next pausing point, ahead of any debug decision.
    pub fn change_variable(
        &self,
        name: impl Into<String>,
        scope: VariableScope,
        frame_level: usize,
        path: Option<Vec<String>>,
        arguments: Vec<String>,
    ) {
        let mut control = self.control();
        control.stepping = None;
        control.condition_pending = false;
        control.suspension = Some(Suspension::VariableChange);
        control.queued.push_back(Response::ChangeVariable {
            name: name.into(),
            scope,
            frame_level,
            path,
            arguments,
        });
    }

    /// Queue an expression evaluation on the remote process. Returns the id
    /// the transport layer can use to correlate the evaluation result.
    pub fn evaluate_expression(&self, kind: ExpressionKind, payload: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        let mut control = self.control();
        control.stepping = None;
        control.condition_pending = false;
        control.suspension = Some(Suspension::ExpressionEvaluated);
        control.queued.push_back(Response::EvaluateExpression {
            kind,
            id,
            payload: payload.into(),
        });
        id
    }

    /// Confirmation that the remote process actually paused. Clears the
    /// suspension slot and all stepping marks, and notifies the hook with
    /// the pause reason, exactly once per suspension.
    pub fn suspension_confirmed(&mut self) -> Result<(), Error> {
        let suspension = {
            let mut control = self.control();
            control.suspension.take()
        }
        .ok_or(Error::NoPendingSuspension)?;

        self.stack.clear_stepping_marks();

        log::debug!(target: "controller", "suspension confirmed: {suspension:?}");
        let notified = match &suspension {
            Suspension::UserRequest => self.hooks.on_user_pause(),
            Suspension::Breakpoint(brkpt) => self.hooks.on_breakpoint(brkpt),
            Suspension::Stepping(mode) => self.hooks.on_stepping(*mode),
            Suspension::VariableChange => self.hooks.on_variable_change(),
            Suspension::ExpressionEvaluated => self.hooks.on_expression_evaluated(),
            Suspension::ErroneousState(message) => self.hooks.on_error_state(message),
        };
        notified.map_err(Error::Hook)
    }

    /// Currently pending suspension, if any.
    pub fn current_suspension(&self) -> Option<Suspension> {
        self.control().suspension.clone()
    }
}
