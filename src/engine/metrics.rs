//! Compile run metrics.
//!
//! Filled by the engine pipeline and surfaced through
//! [`crate::compile_verbose_with`]. Collection is cheap (a few `Instant`
//! reads), so the plain compile path uses the same pipeline and drops them.

use crate::Token;
use crate::error::CompileError;
use crate::mission::MissionSpec;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileMetrics {
    /// Total elapsed time for the compile.
    pub total: Duration,
    /// Time spent scanning the text.
    pub lex: Duration,
    /// Time spent walking tokens, resolving pools included.
    pub parse: Duration,
    /// Time spent building the final mission.
    pub assemble: Duration,
    /// Number of tokens the scanner produced.
    pub tokens: usize,
}

/// Compile output bundled with what the pipeline saw along the way.
#[derive(Debug, Clone)]
pub(crate) struct RunResult {
    pub result: Result<MissionSpec, CompileError>,
    pub tokens: Vec<Token>,
    pub metrics: CompileMetrics,
}
