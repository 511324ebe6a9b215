//! Compilation engine.
//!
//! The engine is split into focused submodules under `src/engine/`; this file
//! wires them into one pipeline.
//!
//! ## How the parts work together
//!
//! ```text
//! text ── tokenize (lexer.rs)
//!           - skip whitespace and comments
//!           - ordered alternatives: ) > time > strikes > setting > pool
//!                 │
//!                 v
//!         Parser::parse (parser.rs)
//!           - Global / Implicit / Group scopes
//!           - settings, duplicates, ranges
//!           - PoolResolver::resolve per pool (resolve.rs)
//!           - bomb finalization
//!                 │
//!                 v
//!         assemble (assemble.rs)
//!           - rule seed
//!           - extra bomb and factory marker pools
//!                 │
//!                 v
//!         Result<MissionSpec, CompileError>
//! ```
//!
//! Diagnostics are threaded through every stage in the order they are found;
//! a compile succeeds only when none were collected.
//!
//! ## Responsibilities by module
//!
//! - `lexer.rs`: turns text into `Token`s with byte spans.
//! - `parser.rs`: the scope state machine that builds `BombConfig`s.
//! - `resolve.rs`: turns pool text into `ModulePoolSpec`s against the catalog
//!   and profile snapshots.
//! - `assemble.rs`: packs the bombs into the host's single generator setting.
//! - `metrics.rs`: per-stage timings for verbose runs.
//!
//! ## Debugging
//!
//! Run with `RUST_LOG=mission_forge=debug` to see tokens, scope changes and
//! profile lookups.

#[path = "engine/assemble.rs"]
mod assemble;
#[path = "engine/lexer.rs"]
pub(crate) mod lexer;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
pub(crate) mod parser;
#[path = "engine/resolve.rs"]
mod resolve;

pub use metrics::CompileMetrics;
pub(crate) use metrics::RunResult;

use crate::api::Context;
use crate::error::CompileError;
use crate::mission::MissionSpec;
use log::debug;
use rand::Rng;
use std::time::Instant;

/// Run the whole pipeline, timing each stage.
pub(crate) fn run_with_metrics<R: Rng + ?Sized>(text: &str, ctx: &Context, rng: &mut R) -> RunResult {
    let started = Instant::now();
    let mut metrics = CompileMetrics::default();

    let tokens = lexer::tokenize(text);
    metrics.lex = started.elapsed();
    metrics.tokens = tokens.len();

    let parse_started = Instant::now();
    let parsed = parser::Parser::new(ctx).parse(&tokens, rng);
    metrics.parse = parse_started.elapsed();

    let assemble_started = Instant::now();
    let result = assemble::assemble(parsed, &ctx.limits, rng);
    metrics.assemble = assemble_started.elapsed();
    metrics.total = started.elapsed();

    debug!(
        "[engine] {} token(s), {} in {:?}",
        metrics.tokens,
        match &result {
            Ok(_) => "ok".to_string(),
            Err(err) => format!("{} problem(s)", err.len()),
        },
        metrics.total
    );

    RunResult { result, tokens, metrics }
}

/// Run the pipeline without keeping the intermediate data.
pub(crate) fn run<R: Rng + ?Sized>(text: &str, ctx: &Context, rng: &mut R) -> Result<MissionSpec, CompileError> {
    run_with_metrics(text, ctx, rng).result
}
