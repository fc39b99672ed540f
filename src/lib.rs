//! Debugger core for a keyword-driven automated-test execution engine.
//!
//! The engine consumes an ordered stream of lifecycle events emitted by an
//! instrumented test-running process, reconstructs the live call stack from
//! it and decides, at four fixed pausing points of keyword execution, whether
//! the process should be suspended and why.

pub mod debugger;

pub use debugger::Debugger;
