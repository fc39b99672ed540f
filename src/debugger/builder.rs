use crate::debugger::context::ExecutionContext;
use crate::debugger::error::Error;
use crate::debugger::event::{ExecutionEvent, PausingPoint, RunningKeywordKind};
use crate::debugger::response::Response;
use crate::debugger::stack::{FrameCategory, StackFrame};
use crate::debugger::Debugger;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::PathBuf;

impl Debugger {
    /// Apply one lifecycle event of the instrumented process: exactly one
    /// stack mutation, in event order, followed by one pausing-point
    /// decision for the four keyword events.
    ///
    /// Returns the response the transport layer must ship back, if any.
    pub fn handle_event(&mut self, event: ExecutionEvent) -> Result<Option<Response>, Error> {
        if self.closed {
            return Err(Error::SessionClosed);
        }

        match event {
            ExecutionEvent::SuiteStarted {
                name,
                source,
                directory,
            } => {
                self.on_suite_started(name, source, directory);
                Ok(None)
            }
            ExecutionEvent::SuiteEnded => {
                let frame = self.stack.pop();
                assert_eq!(
                    frame.category(),
                    FrameCategory::Suite,
                    "unbalanced lifecycle events: suite end while a {} frame is on top",
                    frame.category()
                );
                debug!(target: "builder", "suite frame `{}` popped", frame.name());
                Ok(None)
            }
            ExecutionEvent::TestStarted { name, template } => {
                self.on_test_started(name, template);
                Ok(None)
            }
            ExecutionEvent::TestEnded => {
                let frame = self.stack.pop();
                assert_eq!(
                    frame.category(),
                    FrameCategory::Test,
                    "unbalanced lifecycle events: test end while a {} frame is on top",
                    frame.category()
                );
                debug!(target: "builder", "test frame `{}` popped", frame.name());
                Ok(None)
            }
            ExecutionEvent::KeywordAboutToStart { name } => {
                if let Some(top) = self.stack.current_mut() {
                    top.set_current_keyword(name);
                }
                Ok(self.decide(PausingPoint::PreStartKeyword, None))
            }
            ExecutionEvent::KeywordStarted {
                name,
                library_name,
                kind,
            } => {
                self.on_keyword_started(name, library_name, kind);
                Ok(self.decide(PausingPoint::StartKeyword, None))
            }
            ExecutionEvent::KeywordAboutToEnd { failed } => {
                // the pop defines the pre-end-keyword instant, logically
                // before the end-keyword notification
                let frame = self.stack.pop();
                debug!(
                    target: "builder",
                    "{} frame `{}` popped (failed: {failed})",
                    frame.category(),
                    frame.name()
                );
                let failed_keyword = failed.then(|| frame.qualified_name());
                Ok(self.decide(PausingPoint::PreEndKeyword, failed_keyword))
            }
            ExecutionEvent::KeywordEnded { name } => {
                if let Some(top) = self.stack.current_mut() {
                    top.on_child_keyword_exit();
                } else {
                    warn!(target: "builder", "keyword `{name}` ended on an empty stack");
                }
                Ok(self.decide(PausingPoint::EndKeyword, None))
            }
            ExecutionEvent::ResourceImport { source, dynamic } => {
                self.on_resource_import(source, dynamic);
                Ok(None)
            }
            ExecutionEvent::Variables { variables } => {
                self.on_variables(variables);
                Ok(None)
            }
            ExecutionEvent::ConditionEvaluated { result } => {
                self.on_condition_evaluated(result);
                Ok(None)
            }
            ExecutionEvent::Closed => {
                self.stack.clear();
                self.closed = true;
                debug!(target: "builder", "debug session closed");
                Ok(None)
            }
        }
    }

    fn on_suite_started(&mut self, name: String, source: PathBuf, directory: bool) {
        let current_source = self.stack.governing_source().map(PathBuf::from);
        let level = self.stack.current().map(|f| f.level() + 1).unwrap_or(0);
        let context = self
            .locator
            .find_suite_context(&name, &source, directory, current_source.as_deref())
            .map(ExecutionContext::Suite)
            .unwrap_or(ExecutionContext::Unknown);

        let mut frame = StackFrame::new(name, FrameCategory::Suite, level, context);
        // resources declared before the run become visible on the suite
        // that actually uses them
        frame.attach_resources(self.stack.take_pending_resources());
        debug!(target: "builder", "suite frame `{}` pushed at level {level}", frame.name());
        self.stack.push(frame);
    }

    fn on_test_started(&mut self, name: String, template: Option<String>) {
        let context = self
            .locator
            .find_case_context(&name, self.stack.governing_source(), template.as_deref())
            .map(ExecutionContext::Case)
            .unwrap_or(ExecutionContext::Unknown);
        let level = self.stack.current().map(|f| f.level() + 1).unwrap_or(0);

        debug!(target: "builder", "test frame `{name}` pushed at level {level}");
        self.stack
            .push(StackFrame::new(name, FrameCategory::Test, level, context));
    }

    fn on_keyword_started(
        &mut self,
        name: String,
        library_name: Option<String>,
        kind: RunningKeywordKind,
    ) {
        let top = self
            .stack
            .current()
            .expect("keyword started on an empty stacktrace");
        let top_level = top.level();
        let top_category = top.category();

        let frame = if kind == RunningKeywordKind::ForLoop {
            // a for-loop head does not introduce a new variable scope
            let context = self
                .locator
                .find_loop_context(top.context())
                .map(ExecutionContext::ForLoop)
                .unwrap_or(ExecutionContext::Unknown);
            StackFrame::new(name, FrameCategory::For, top_level, context)
        } else if top_category == FrameCategory::For {
            let context = self
                .locator
                .find_loop_iteration_context(top.context(), &name)
                .map(ExecutionContext::ForLoopIteration)
                .unwrap_or(ExecutionContext::Unknown);
            StackFrame::new(name, FrameCategory::ForItem, top_level, context)
        } else {
            let loaded_resources = self
                .stack
                .current_suite()
                .map(|suite| suite.loaded_resources().clone())
                .unwrap_or_default();
            let context = self
                .locator
                .find_keyword_context(
                    library_name.as_deref(),
                    &name,
                    self.stack.governing_source(),
                    &loaded_resources,
                )
                .map(ExecutionContext::Keyword)
                .unwrap_or(ExecutionContext::Unknown);

            // library keywords never open a new nested variable scope, they
            // run at the level of the enclosing test (or suite)
            let level = if context.is_library_keyword() {
                self.stack.library_keyword_level()
            } else {
                top_level + 1
            };
            StackFrame::new(name, FrameCategory::Keyword, level, context)
        };

        debug!(
            target: "builder",
            "{} frame `{}` pushed at level {}",
            frame.category(),
            frame.name(),
            frame.level()
        );
        self.stack.push(frame);
    }

    fn on_resource_import(&mut self, source: PathBuf, dynamic: bool) {
        let resource = source.to_string_lossy().into_owned();
        if dynamic {
            match self.stack.current_suite_mut() {
                Some(suite) => {
                    debug!(target: "builder", "dynamic resource `{resource}` loaded");
                    suite.add_resource(resource);
                }
                None => {
                    warn!(
                        target: "builder",
                        "dynamic resource `{resource}` imported with no suite on the stack"
                    );
                    self.stack.add_pending_resource(resource);
                }
            }
        } else {
            self.stack.add_pending_resource(resource);
        }
    }

    fn on_variables(&mut self, variables: HashMap<String, String>) {
        match self.stack.current_mut() {
            Some(frame) => frame.merge_variables(variables),
            None => warn!(target: "builder", "variables reported with an empty stacktrace"),
        }
    }
}
