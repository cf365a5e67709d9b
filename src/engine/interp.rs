//! Execution harness for generated code.
//!
//! Runs source text in an embedded Starlark interpreter (a Python
//! dialect). Each invocation gets a fresh module scope, so no bindings
//! carry over between runs, and `print` output is captured through a
//! per-evaluator handler into an in-memory buffer, so concurrent
//! executions cannot interleave their output and there is no global
//! stream to restore afterwards.
//!
//! ⚠️ Not a sandbox. There is no CPU or memory limit and no wall-clock
//! timeout: an infinite loop in the generated code blocks the calling
//! task indefinitely. Callers must treat validated code as trusted
//! enough to run in-process.

use std::cell::RefCell;

use starlark::environment::{Globals, LibraryExtension, Module};
use starlark::eval::Evaluator;
use starlark::syntax::{AstModule, Dialect};
use starlark::PrintHandler;

/// Captured output of one execution.
///
/// Exactly one of two shapes holds: normal completion (`stderr` empty,
/// `stdout` holds everything printed) or faulted completion (`stderr`
/// holds the formatted fault, `stdout` holds whatever was printed
/// before the fault).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
}

/// Print handler that appends each printed line to a buffer.
struct BufferSink {
    buf: RefCell<String>,
}

impl PrintHandler for BufferSink {
    fn println(&self, text: &str) -> Result<(), starlark::Error> {
        let mut buf = self.buf.borrow_mut();
        buf.push_str(text);
        buf.push('\n');
        Ok(())
    }
}

/// Runs `code` as a Starlark program and captures its output.
///
/// Never returns an error: parse failures and runtime faults are
/// formatted into `stderr` and the result is always a complete
/// [`ExecutionResult`]. The harness does not re-validate the code;
/// sequencing validation before execution is the orchestrator's
/// contract.
pub fn execute_source(code: &str) -> ExecutionResult {
    let sink = BufferSink {
        buf: RefCell::new(String::new()),
    };

    let ast = match AstModule::parse("generated.star", code.to_string(), &Dialect::Extended) {
        Ok(ast) => ast,
        Err(e) => {
            return ExecutionResult {
                stdout: String::new(),
                stderr: format_fault("syntax error", &e),
            }
        }
    };

    // Standard builtins plus `print`; nothing else is pre-populated.
    let globals = Globals::extended_by(&[LibraryExtension::Print]);
    let module = Module::new();

    let stderr = {
        let mut eval = Evaluator::new(&module);
        eval.set_print_handler(&sink);
        match eval.eval_module(ast, &globals) {
            Ok(_) => String::new(),
            Err(e) => format_fault("runtime error", &e),
        }
    };

    ExecutionResult {
        stdout: sink.buf.into_inner(),
        stderr,
    }
}

/// Formats a fault into the diagnostic text placed in `stderr`:
/// stage label, then the interpreter's own message (which carries the
/// source position and, for runtime faults, the originating frames).
fn format_fault(stage: &str, err: &impl std::fmt::Display) -> String {
    format!("{stage}: {err:#}\n")
}
