use crate::Token;
use crate::TokenKind;
use crate::catalog::{ModuleCatalog, ProfileRegistry};
use crate::engine::{self, CompileMetrics};
use crate::error::CompileError;
use crate::mission::MissionSpec;
use rand::Rng;
use std::time::Duration;

/// What the host game can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLimits {
    /// Largest module count any bomb casing supports.
    pub max_modules: usize,
    /// The multiple-bombs extension is installed.
    pub multiple_bombs: bool,
    /// The factory extension is installed.
    pub factory: bool,
    /// The rule-seed modifier is installed.
    pub rule_seed: bool,
}

impl Default for HostLimits {
    fn default() -> Self {
        Self { max_modules: 11, multiple_bombs: true, factory: true, rule_seed: false }
    }
}

/// Compile context.
///
/// Read-only snapshots of everything outside the mission text. Build it once
/// and share it between compiles.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub catalog: ModuleCatalog,
    pub profiles: ProfileRegistry,
    pub limits: HostLimits,
}

impl Context {
    pub fn new(catalog: ModuleCatalog, profiles: ProfileRegistry) -> Self {
        Self { catalog, profiles, limits: HostLimits::default() }
    }

    pub fn with_limits(mut self, limits: HostLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// A compact token summary used in verbose traces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSummary {
    /// `"time"`, `"strikes"`, `"setting"`, `"pool"`, `"open"` or `"close"`.
    pub kind: &'static str,
    pub start: usize,
    pub end: usize,
    /// Slice of the mission text.
    pub body: String,
    /// Interpreted value.
    pub preview: String,
}

/// Additional details returned by [`compile_verbose_with`].
#[derive(Debug, Clone)]
pub struct CompileDetails {
    pub metrics: CompileMetrics,
    pub tokens: Vec<TokenSummary>,
}

/// Result from [`compile_verbose_with`].
#[derive(Debug, Clone)]
pub struct CompileVerbose {
    pub text: String,
    pub result: Result<MissionSpec, CompileError>,
    pub elapsed: Duration,
    pub details: CompileDetails,
}

/// Compile `text` into a mission, drawing randomness from the thread RNG.
///
/// # Example
/// ```
/// use mission_forge::{Context, compile};
///
/// let mission = compile("5:00 3X Wires, Keypad", &Context::default()).unwrap();
/// assert_eq!(mission.bombs[0].time_limit, 300);
///
/// let err = compile("strikes:0 strikes:5 Wires", &Context::default()).unwrap_err();
/// assert!(err.len() >= 2);
/// ```
pub fn compile(text: &str, context: &Context) -> Result<MissionSpec, CompileError> {
    compile_with(text, context, &mut rand::thread_rng())
}

/// Compile `text` with an explicit random source.
///
/// Unique-pool sampling and random rule seeds are the only random draws, so
/// a seeded `rng` makes the output fully deterministic.
pub fn compile_with<R: Rng + ?Sized>(text: &str, context: &Context, rng: &mut R) -> Result<MissionSpec, CompileError> {
    engine::run(text, context, rng)
}

/// Compile `text` and return the tokens and stage timings alongside the
/// result.
pub fn compile_verbose_with<R: Rng + ?Sized>(text: &str, context: &Context, rng: &mut R) -> CompileVerbose {
    let run = engine::run_with_metrics(text, context, rng);
    let tokens = run.tokens.iter().map(|token| token_summary(text, token)).collect();

    CompileVerbose {
        text: text.to_string(),
        result: run.result,
        elapsed: run.metrics.total,
        details: CompileDetails { metrics: run.metrics, tokens },
    }
}

fn token_summary(input: &str, token: &Token) -> TokenSummary {
    let start = token.range.start;
    let end = token.range.end;
    let body = input.get(start..end).unwrap_or("").to_string();

    let (kind, preview) = match &token.kind {
        TokenKind::Time(seconds) => ("time", format!("{seconds}s")),
        TokenKind::Strikes(count) => ("strikes", count.to_string()),
        TokenKind::Setting { name, value } => match value {
            Some(value) => ("setting", format!("{}={value}", name.keyword())),
            None => ("setting", name.keyword().to_string()),
        },
        TokenKind::ModulePool(pool) => {
            let mut preview = format!("{}x {:?}", pool.count.unwrap_or(1), pool.body);
            if pool.unique {
                preview.push_str(" unique");
            }
            ("pool", preview)
        }
        TokenKind::GroupOpen { count } => ("open", format!("x{}", count.unwrap_or(1))),
        TokenKind::GroupClose => ("close", String::new()),
    };

    TokenSummary { kind, start, end, body, preview: preview.chars().take(80).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostic;
    use crate::mission::{AggregatePool, ModuleClass, ModulePoolSpec, ModuleRef, PoolContent, VanillaModule};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn compile_seeded(text: &str, ctx: &Context) -> Result<MissionSpec, CompileError> {
        compile_with(text, ctx, &mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn single_module_mission() {
        let mission = compile_seeded("Wires", &Context::default()).unwrap();
        assert_eq!(mission.bombs.len(), 1);
        let bomb = &mission.bombs[0];
        assert_eq!(bomb.time_limit, 120);
        assert_eq!(bomb.num_strikes, 3);
        assert_eq!(
            bomb.component_pools,
            vec![ModulePoolSpec::new(1, PoolContent::Explicit(vec![ModuleRef::vanilla(VanillaModule::Wires)]))]
        );
    }

    #[test]
    fn time_strikes_and_module_list() {
        let mission = compile_seeded("5:00 3X Wires, Keypad", &Context::default()).unwrap();
        let bomb = &mission.bombs[0];
        assert_eq!(bomb.time_limit, 300);
        assert_eq!(bomb.num_strikes, 3);
        assert_eq!(bomb.component_pools.len(), 1);
        assert_eq!(bomb.component_pools[0].count, 1);
        assert_eq!(
            bomb.component_pools[0].content,
            PoolContent::Explicit(vec![
                ModuleRef::new("Wires", ModuleClass::VanillaSolvable),
                ModuleRef::new("Keypad", ModuleClass::VanillaSolvable),
            ])
        );
    }

    #[test]
    fn unique_pool_splits_into_distinct_modules() {
        let mission = compile_seeded("2*Wires,Keypad!", &Context::default()).unwrap();
        let pools = &mission.bombs[0].component_pools;
        assert_eq!(pools.len(), 2);
        let ids: HashSet<&str> = pools
            .iter()
            .map(|pool| match &pool.content {
                PoolContent::Explicit(modules) if modules.len() == 1 && pool.count == 1 => modules[0].id.as_str(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, HashSet::from(["Wires", "Keypad"]));
    }

    #[test]
    fn two_groups_make_two_bombs() {
        let mission = compile_seeded("(Wires)(Keypad)", &Context::default()).unwrap();
        assert_eq!(mission.bombs.len(), 2);
        let pools = &mission.generator_setting.component_pools;
        assert_eq!(pools[1], ModulePoolSpec::new(1, PoolContent::ExtraBombs));
        assert!(matches!(pools[2].content, PoolContent::SerializedBomb { index: 1, .. }));
        assert_eq!(pools.len(), 3);
    }

    #[test]
    fn all_vanilla_is_the_same_set_for_any_catalog_order() {
        let forward = ModuleCatalog::new().with_solvable_mod("Alpha", "").with_solvable_mod("Beta", "");
        let mut backward = ModuleCatalog::new();
        backward.add_solvable_mod("Beta", "");
        backward.add_solvable_mod("Alpha", "");

        let vanilla: HashSet<String> = VanillaModule::SOLVABLE.iter().map(|m| m.id().to_string()).collect();
        for catalog in [ModuleCatalog::new(), forward, backward] {
            let ids: HashSet<String> = catalog.expand(AggregatePool::AllVanilla).into_iter().map(|m| m.id).collect();
            assert_eq!(ids, vanilla);
        }
    }

    #[test]
    fn seeded_compiles_are_identical() {
        let ctx = Context::default().with_limits(HostLimits { rule_seed: true, ..HostLimits::default() });
        let text = "ruleseed:random 2*(3*ALL_VANILLA! NeedyKnob) (4:00 Maze)";
        let a = serde_json::to_string(&compile_seeded(text, &ctx).unwrap()).unwrap();
        let b = serde_json::to_string(&compile_seeded(text, &ctx).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_and_duplicate_strikes_fail() {
        let err = compile_seeded("strikes:0 strikes:5 Wires", &Context::default()).unwrap_err();
        assert!(err.len() >= 2);
        assert!(err.diagnostics.contains(&Diagnostic::InvalidStrikeLimit));
        assert!(err.diagnostics.contains(&Diagnostic::Duplicate("Strikes")));
    }

    #[test]
    fn module_limit_boundary() {
        let ctx = Context::default().with_limits(HostLimits { max_modules: 5, ..HostLimits::default() });
        assert!(compile_seeded("5*Wires", &ctx).is_ok());
        let err = compile_seeded("5*Wires Maze", &ctx).unwrap_err();
        assert_eq!(err.diagnostics, vec![Diagnostic::TooManyModules { count: 6, max: 5, bomb: None }]);
        assert_eq!(err.to_string(), "mission has 1 problem(s):\nToo many modules for any bomb casing (6 > 5)");
    }

    #[test]
    fn verbose_includes_tokens_and_metrics() {
        let text = "5:00 (Wires)";
        let out = compile_verbose_with(text, &Context::default(), &mut StdRng::seed_from_u64(0));
        assert!(out.result.is_ok());
        assert_eq!(out.elapsed, out.details.metrics.total);
        assert_eq!(out.details.metrics.tokens, 4);
        let kinds: Vec<&str> = out.details.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec!["time", "open", "pool", "close"]);
        assert_eq!(out.details.tokens[0].body, "5:00");
        assert_eq!(out.details.tokens[0].preview, "300s");
    }
}
