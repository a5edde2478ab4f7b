//! The seam to whatever runs Plutus programs
//!
//! Evaluation itself lives outside this crate. Validation hands the script
//! and its arguments over and reads back the cost and the outcome.

use tessera_primitives::{ExUnits, PlutusData, PlutusScript, ScriptHash};

/// Why an evaluation did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFailure {
    pub message: String,
    /// What the script logged on its way to the failure, call site first
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub cost: ExUnits,
    pub result: Result<PlutusData, EvalFailure>,
}

pub trait ScriptEvaluator {
    fn evaluate(&self, script: &PlutusScript, args: &[PlutusData]) -> Evaluation;

    /// Whether an unoptimized build with tracing is around for `script`
    fn has_diagnostic_build(&self, _script: &ScriptHash) -> bool {
        false
    }
}

impl<T: ScriptEvaluator + ?Sized> ScriptEvaluator for &T {
    fn evaluate(&self, script: &PlutusScript, args: &[PlutusData]) -> Evaluation {
        (**self).evaluate(script, args)
    }

    fn has_diagnostic_build(&self, script: &ScriptHash) -> bool {
        (**self).has_diagnostic_build(script)
    }
}
