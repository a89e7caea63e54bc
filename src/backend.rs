use anyhow::Result;

use crate::ast::Program;
use crate::object::Object;

/// Executable artifact produced by a backend `prepare` step.
///
/// Keeping compilation and execution separated lets benchmarks and tests
/// measure/validate the prepare and run phases independently.
pub trait PreparedBackend {
    fn run(&self) -> Result<Object>;
}

/// Common interface implemented by each execution backend.
///
/// `prepare` translates the AST into backend-owned executable state, while
/// `run` offers the convenience path for one-shot execution. Both backends
/// must produce identical observable results for every program they accept.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>>;

    fn run(&self, program: &Program) -> Result<Object> {
        self.prepare(program)?.run()
    }
}

pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(crate::evaluator::Evaluator::new()),
        Box::new(crate::vm::VmBackend::new()),
    ]
}
