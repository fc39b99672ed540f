use crate::debugger::event::PausingPoint;
use crate::debugger::response::Response;
use crate::debugger::stack::{FrameCategory, Stacktrace};
use crate::debugger::{
    BreakpointSupplier, ControlState, Debugger, Preferences, SteppingMode, Suspension,
};
use log::{debug, warn};
use std::sync::Arc;

impl Debugger {
    /// Run one pausing-point decision. Candidate responses are evaluated as
    /// an ordered rule list, top to bottom, and the first match wins:
    ///
    /// 1. a queued user-initiated request,
    /// 2. nothing at all while a condition round trip is in flight,
    /// 3. a suspension set earlier (user pause, confirmed condition, ...),
    /// 4. an erroneous frame state,
    /// 5. a breakpoint hit,
    /// 6. an armed stepping mode.
    pub(super) fn decide(
        &mut self,
        point: PausingPoint,
        failed_keyword: Option<String>,
    ) -> Option<Response> {
        let mut control = self.control.lock().expect("control state lock poisoned");
        control.last_pausing_point = Some(point);

        if let Some(response) = control.queued.pop_front() {
            debug!(target: "controller", "{point}: emit queued user request");
            return Some(response);
        }

        // the same logical hit must not be decided twice while the remote
        // condition evaluation is in flight
        if control.condition_pending {
            return None;
        }

        if control.suspension.is_some() {
            debug!(target: "controller", "{point}: pause on pending suspension");
            return Some(Response::PauseExecution);
        }

        if matches!(
            point,
            PausingPoint::PreStartKeyword | PausingPoint::StartKeyword
        ) {
            if let Some(response) =
                respond_on_error(&mut self.stack, &*self.preferences, &mut control)
            {
                debug!(target: "controller", "{point}: pause on erroneous state");
                return Some(response);
            }
        }

        if let Some(response) = respond_on_breakpoint(
            &self.stack,
            &*self.breakpoints,
            &mut control,
            point,
            failed_keyword.as_deref(),
        ) {
            debug!(target: "controller", "{point}: breakpoint hit");
            return Some(response);
        }

        let response = respond_on_stepping(&self.stack, &*self.preferences, &mut control, point);
        if response.is_some() {
            debug!(target: "controller", "{point}: pause on stepping");
        }
        response
    }

    /// Side input closing a breakpoint-condition round trip. A false result
    /// clears the tentative suspension; a true result or a failed evaluation
    /// leaves it in place so the next pausing point pauses.
    pub(super) fn on_condition_evaluated(&mut self, result: Option<bool>) {
        let mut control = self.control.lock().expect("control state lock poisoned");
        if !control.condition_pending {
            warn!(target: "controller", "condition result arrived with no evaluation in flight");
            return;
        }
        control.condition_pending = false;
        if result == Some(false) {
            debug!(target: "controller", "breakpoint condition is false, run continues");
            control.suspension = None;
        }
    }
}

/// Error-triggered pause. Every erroneous frame is marked ERROR exactly once,
/// whether or not the pause-on-error preference is set, so a later check does
/// not re-fire for the same error while frames are popped.
fn respond_on_error(
    stack: &mut Stacktrace,
    preferences: &dyn Preferences,
    control: &mut ControlState,
) -> Option<Response> {
    if stack.frames().iter().any(|f| f.has_error_mark()) {
        return None;
    }

    let erroneous: Vec<usize> = stack
        .frames()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.context().is_erroneous())
        .map(|(idx, _)| idx)
        .collect();
    let innermost = *erroneous.last()?;

    let message = stack
        .frame(innermost)
        .and_then(|f| f.context().error_message())
        .unwrap_or_default()
        .to_string();
    for idx in erroneous {
        if let Some(frame) = stack.frame_mut(idx) {
            frame.mark_error();
        }
    }

    if !preferences.pause_on_error() {
        return None;
    }
    control.suspension = Some(Suspension::ErroneousState(message));
    Some(Response::PauseExecution)
}

/// Breakpoint rule: a line breakpoint just before a keyword call, or a
/// keyword-failure breakpoint just after a failed keyword was popped.
fn respond_on_breakpoint(
    stack: &Stacktrace,
    supplier: &dyn BreakpointSupplier,
    control: &mut ControlState,
    point: PausingPoint,
    failed_keyword: Option<&str>,
) -> Option<Response> {
    let frame = stack.current()?;
    let breakpoint = match point {
        PausingPoint::PreStartKeyword => supplier.line_breakpoint_for(frame),
        PausingPoint::PreEndKeyword => {
            failed_keyword.and_then(|name| supplier.keyword_failure_breakpoint_for(frame, name))
        }
        _ => None,
    }?;

    if !breakpoint.is_enabled() || !breakpoint.register_hit() {
        return None;
    }

    if let Some(expression) = breakpoint.condition() {
        let expression = expression.to_string();
        control.suspension = Some(Suspension::Breakpoint(Arc::clone(&breakpoint)));
        control.condition_pending = true;
        return Some(Response::EvaluateCondition { expression });
    }

    control.suspension = Some(Suspension::Breakpoint(breakpoint));
    Some(Response::PauseExecution)
}

fn respond_on_stepping(
    stack: &Stacktrace,
    preferences: &dyn Preferences,
    control: &mut ControlState,
    point: PausingPoint,
) -> Option<Response> {
    let mode = control.stepping?;
    if !stepping_fires(mode, point, stack, preferences) {
        return None;
    }

    // stepping ended; STEPPING marks stay until the suspension is confirmed
    control.stepping = None;
    control.suspension = Some(Suspension::Stepping(mode));
    Some(Response::PauseExecution)
}

fn stepping_fires(
    mode: SteppingMode,
    point: PausingPoint,
    stack: &Stacktrace,
    preferences: &dyn Preferences,
) -> bool {
    let Some(top) = stack.current() else {
        return false;
    };

    match mode {
        SteppingMode::Into => {
            // stepping into a loop head is meaningless, wait for the first
            // iteration's keyword instead
            if top.category() == FrameCategory::For {
                return false;
            }
            if preferences.go_into_library_keywords() {
                point != PausingPoint::EndKeyword
            } else {
                matches!(
                    point,
                    PausingPoint::PreStartKeyword | PausingPoint::StartKeyword
                ) && !top.context().is_library_keyword()
            }
        }
        SteppingMode::Over => match point {
            PausingPoint::StartKeyword => {
                let below_top_stepping = stack
                    .depth()
                    .checked_sub(2)
                    .and_then(|idx| stack.frame(idx))
                    .map(|f| f.is_stepping())
                    .unwrap_or(false);
                // the no-marks case covers stepping over the very first
                // iteration of a loop
                top.category() == FrameCategory::ForItem
                    && (below_top_stepping || !stack.any_stepping())
            }
            PausingPoint::PreStartKeyword => {
                top.category() != FrameCategory::For
                    && (top.is_stepping() || !stack.any_stepping())
            }
            _ => false,
        },
        SteppingMode::Return => {
            matches!(
                point,
                PausingPoint::PreStartKeyword | PausingPoint::PreEndKeyword
            ) && !stack.any_stepping()
                && (preferences.go_into_library_keywords()
                    || !top.context().is_library_keyword())
        }
    }
}
