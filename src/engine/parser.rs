//! Mission parser.
//!
//! Consumes the token stream once, left to right, keeping a single current
//! scope:
//!
//! ```text
//!            pool (no group seen yet)
//!   Global ─────────────────────────────> Implicit bomb
//!     │  ^                                   │
//!     │  │ ")"                                │ "(" (reported, bomb dropped)
//!     │  │                                    v
//!     └──┴──────────── "(" ──────────────> Group bomb (repeat N)
//! ```
//!
//! Settings go to the open bomb, or to the global defaults when no bomb is
//! open. Every scope tracks which settings it has seen so a second `5:00` in
//! the same scope is reported. The implicit bomb starts from the global
//! defaults and counts them as already seen. A `)` while the implicit bomb is
//! open checks it like any other bomb but keeps no copy of it.
//!
//! Problems never stop the walk: each one is appended to the diagnostics and
//! parsing continues, so a single pass reports everything.

use log::debug;
use rand::Rng;

use super::resolve::PoolResolver;
use crate::api::Context;
use crate::error::Diagnostic;
use crate::mission::{BombConfig, FactoryMode, ModulePoolSpec, RuleSeed};
use crate::{PoolToken, SettingName, Token, TokenKind};

/// Everything the walk produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Parsed {
    pub bombs: Vec<BombConfig>,
    /// Profile names per bomb, aligned with `bombs`.
    pub module_profiles: Vec<Vec<String>>,
    pub pacing_events_enabled: bool,
    pub factory_mode: Option<FactoryMode>,
    /// Set when `ruleseed` appeared at all.
    pub rule_seed: Option<RuleSeed>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Time,
    Strikes,
    NeedyActivationTime,
    Widgets,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Time => "Time",
            Field::Strikes => "Strikes",
            Field::NeedyActivationTime => "Needy activation time",
            Field::Widgets => "Widget count",
        }
    }

    fn invalid(self) -> Diagnostic {
        match self {
            Field::Time => Diagnostic::InvalidTimeLimit,
            Field::Strikes => Diagnostic::InvalidStrikeLimit,
            Field::NeedyActivationTime => Diagnostic::InvalidNeedyActivationTime,
            Field::Widgets => Diagnostic::InvalidWidgetCount,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    specified: bool,
    value: Option<u32>,
}

#[derive(Debug, Clone, Default)]
struct Settings {
    time: Slot,
    strikes: Slot,
    needy_activation_time: Slot,
    widgets: Slot,
    front_only: bool,
}

impl Settings {
    fn slot_mut(&mut self, field: Field) -> &mut Slot {
        match field {
            Field::Time => &mut self.time,
            Field::Strikes => &mut self.strikes,
            Field::NeedyActivationTime => &mut self.needy_activation_time,
            Field::Widgets => &mut self.widgets,
        }
    }

    /// Copy of the defaults where every value present counts as specified.
    fn seeded_from(defaults: &Settings) -> Self {
        let seed = |slot: Slot| Slot { specified: slot.value.is_some(), value: slot.value };
        Settings {
            time: seed(defaults.time),
            strikes: seed(defaults.strikes),
            needy_activation_time: seed(defaults.needy_activation_time),
            widgets: seed(defaults.widgets),
            front_only: defaults.front_only,
        }
    }
}

/// A bomb still being written.
#[derive(Debug, Clone, Default)]
struct BombDraft {
    settings: Settings,
    pools: Vec<ModulePoolSpec>,
    has_solvable: bool,
    profiles: Vec<String>,
}

#[derive(Debug)]
enum Scope {
    Global,
    Implicit(BombDraft),
    Group { draft: BombDraft, repeat: u32 },
}

/// Turns tokens into bombs and mission-wide settings.
pub(crate) struct Parser<'a> {
    ctx: &'a Context,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub(crate) fn parse<R: Rng + ?Sized>(&self, tokens: &[Token], rng: &mut R) -> Parsed {
        let mut walk = Walk {
            ctx: self.ctx,
            resolver: PoolResolver::new(&self.ctx.catalog, &self.ctx.profiles),
            rng,
            diagnostics: Vec::new(),
            defaults: Settings::default(),
            scope: Scope::Global,
            groups_used: false,
            bombs: Vec::new(),
            module_profiles: Vec::new(),
            pacing_events_enabled: true,
            factory_specified: false,
            factory_mode: None,
            rule_seed: None,
        };
        for token in tokens {
            walk.step(token);
        }
        walk.finish()
    }
}

struct Walk<'a, R: Rng + ?Sized> {
    ctx: &'a Context,
    resolver: PoolResolver<'a>,
    rng: &'a mut R,
    diagnostics: Vec<Diagnostic>,
    defaults: Settings,
    scope: Scope,
    /// A `(` was seen; bare pools are no longer allowed at the top level.
    groups_used: bool,
    bombs: Vec<BombConfig>,
    module_profiles: Vec<Vec<String>>,
    pacing_events_enabled: bool,
    factory_specified: bool,
    factory_mode: Option<FactoryMode>,
    rule_seed: Option<RuleSeed>,
}

/// Settings a value lands in: the open bomb, else the global defaults.
fn target<'s>(scope: &'s mut Scope, defaults: &'s mut Settings) -> &'s mut Settings {
    match scope {
        Scope::Implicit(draft) | Scope::Group { draft, .. } => &mut draft.settings,
        Scope::Global => defaults,
    }
}

impl<R: Rng + ?Sized> Walk<'_, R> {
    fn step(&mut self, token: &Token) {
        match &token.kind {
            TokenKind::Time(seconds) => {
                let value = u32::try_from(*seconds).ok().filter(|&t| t > 0);
                self.apply(Field::Time, value);
            }
            TokenKind::Strikes(count) => self.apply(Field::Strikes, Some(*count).filter(|&s| s > 0)),
            TokenKind::Setting { name, value } => self.setting(*name, value.as_deref()),
            TokenKind::ModulePool(pool) => self.pool(pool),
            TokenKind::GroupOpen { count } => self.open(*count),
            TokenKind::GroupClose => self.close(),
        }
    }

    fn apply(&mut self, field: Field, value: Option<u32>) {
        let slot = target(&mut self.scope, &mut self.defaults).slot_mut(field);
        if slot.specified {
            self.diagnostics.push(Diagnostic::Duplicate(field.label()));
        }
        slot.specified = true;
        match value {
            Some(value) => slot.value = Some(value),
            None => self.diagnostics.push(field.invalid()),
        }
    }

    fn in_group(&self) -> bool {
        matches!(self.scope, Scope::Group { .. })
    }

    fn setting(&mut self, name: SettingName, value: Option<&str>) {
        let number = || value.and_then(|v| v.parse::<u32>().ok());
        match name {
            SettingName::Strikes => self.apply(Field::Strikes, number().filter(|&s| s > 0)),
            SettingName::NeedyActivationTime => self.apply(Field::NeedyActivationTime, number()),
            SettingName::Widgets => self.apply(Field::Widgets, number()),
            SettingName::FrontOnly => target(&mut self.scope, &mut self.defaults).front_only = true,
            SettingName::NoPacing => {
                if self.in_group() {
                    self.diagnostics.push(Diagnostic::BombLevelSetting("nopacing"));
                } else {
                    self.pacing_events_enabled = false;
                }
            }
            SettingName::Factory => self.factory(value),
            SettingName::RuleSeed => self.rule_seed(value),
        }
    }

    fn factory(&mut self, value: Option<&str>) {
        if self.in_group() {
            self.diagnostics.push(Diagnostic::BombLevelSetting("Factory mode"));
        } else if self.factory_specified {
            self.diagnostics.push(Diagnostic::Duplicate("Factory mode"));
        } else if !self.ctx.limits.factory {
            self.diagnostics.push(Diagnostic::FactoryUnavailable);
        } else {
            self.factory_specified = true;
            self.factory_mode = FactoryMode::from_id(value.unwrap_or_default());
            if self.factory_mode.is_none() {
                self.diagnostics.push(Diagnostic::InvalidFactoryMode);
            }
        }
    }

    fn rule_seed(&mut self, value: Option<&str>) {
        if self.in_group() {
            self.diagnostics.push(Diagnostic::BombLevelSetting("Rule seed"));
            return;
        }
        if self.rule_seed.is_some() {
            self.diagnostics.push(Diagnostic::Duplicate("Rule seed"));
        }

        let parsed = match value {
            Some("random") => Some(RuleSeed::Random),
            Some(v) => v.parse::<i32>().ok().and_then(|n| u32::try_from(n).ok()).map(RuleSeed::Fixed),
            None => None,
        };
        if parsed.is_none() {
            self.diagnostics.push(Diagnostic::InvalidRuleSeed);
        }
        self.rule_seed = Some(parsed.unwrap_or(RuleSeed::Random));
    }

    fn pool(&mut self, pool: &PoolToken) {
        if pool.unclosed_quote {
            self.diagnostics.push(Diagnostic::UnclosedQuote);
        }

        if matches!(self.scope, Scope::Global) {
            if self.groups_used {
                self.diagnostics.push(Diagnostic::UnexpectedModulePool);
                return;
            }
            debug!("[parse] opening implicit bomb");
            self.scope = Scope::Implicit(BombDraft { settings: Settings::seeded_from(&self.defaults), ..Default::default() });
        }

        let count = pool.count.unwrap_or(1);
        if count == 0 {
            self.diagnostics.push(Diagnostic::InvalidPoolCount);
        }

        let resolved = self.resolver.resolve(&pool.body, count, pool.unique, &mut *self.rng, &mut self.diagnostics);
        debug!("[parse] pool {:?} -> {} descriptor(s)", pool.body, resolved.pools.len());

        if let Scope::Implicit(draft) | Scope::Group { draft, .. } = &mut self.scope {
            draft.pools.extend(resolved.pools);
            draft.has_solvable |= resolved.has_solvable;
            draft.profiles.extend(resolved.profile);
        }
    }

    fn open(&mut self, count: Option<u32>) {
        if !matches!(self.scope, Scope::Global) {
            debug!("[parse] '(' with a bomb open; dropping it");
            self.diagnostics.push(Diagnostic::UnexpectedOpen);
        }
        if !self.ctx.limits.multiple_bombs {
            self.diagnostics.push(Diagnostic::MultipleBombsUnavailable);
        }

        let repeat = count.unwrap_or(1);
        if repeat == 0 {
            self.diagnostics.push(Diagnostic::InvalidRepeatCount);
        }

        self.groups_used = true;
        let settings = Settings { front_only: self.defaults.front_only, ..Default::default() };
        self.scope = Scope::Group { draft: BombDraft { settings, ..Default::default() }, repeat };
    }

    fn close(&mut self) {
        match std::mem::replace(&mut self.scope, Scope::Global) {
            Scope::Group { draft, repeat } => {
                let number = self.bombs.len() + 1;
                let (bomb, profiles) = self.finalize(draft, Some(number));
                debug!("[parse] closing bomb {number} x{repeat}");
                for _ in 0..repeat {
                    self.bombs.push(bomb.clone());
                    self.module_profiles.push(profiles.clone());
                }
            }
            Scope::Implicit(draft) => {
                // No group set a repeat count, so the bomb is checked and then
                // contributes zero copies.
                debug!("[parse] ')' closes the implicit bomb");
                self.finalize(draft, None);
            }
            Scope::Global => self.diagnostics.push(Diagnostic::UnexpectedClose),
        }
    }

    /// Fill unset values from the defaults and check the bomb.
    fn finalize(&mut self, draft: BombDraft, number: Option<usize>) -> (BombConfig, Vec<String>) {
        if !draft.has_solvable {
            self.diagnostics.push(Diagnostic::NoSolvableModules { bomb: number });
        }

        let settings = &draft.settings;
        let count: u64 = draft.pools.iter().map(|pool| u64::from(pool.count)).sum();
        let pick = |own: Slot, default: Slot| own.value.or(default.value);

        let time_limit = pick(settings.time, self.defaults.time)
            .unwrap_or_else(|| u32::try_from(count * 120).unwrap_or(u32::MAX));
        let num_strikes = pick(settings.strikes, self.defaults.strikes)
            .unwrap_or_else(|| u32::try_from((count / 12).max(3)).unwrap_or(u32::MAX));

        let max = self.ctx.limits.max_modules;
        if count > max as u64 {
            self.diagnostics.push(Diagnostic::TooManyModules { count, max, bomb: number });
        }

        let bomb = BombConfig {
            time_limit,
            num_strikes,
            time_before_needy_activation: pick(settings.needy_activation_time, self.defaults.needy_activation_time),
            optional_widget_count: pick(settings.widgets, self.defaults.widgets),
            front_face_only: settings.front_only,
            component_pools: draft.pools,
        };
        (bomb, draft.profiles)
    }

    fn finish(mut self) -> Parsed {
        match std::mem::replace(&mut self.scope, Scope::Global) {
            Scope::Implicit(draft) => {
                let (bomb, profiles) = self.finalize(draft, None);
                self.bombs.push(bomb);
                self.module_profiles.push(profiles);
            }
            Scope::Group { .. } => self.diagnostics.push(Diagnostic::UnclosedGroup),
            Scope::Global => {
                if self.bombs.is_empty() {
                    self.diagnostics.push(Diagnostic::NoSolvableModules { bomb: None });
                }
            }
        }

        Parsed {
            bombs: self.bombs,
            module_profiles: self.module_profiles,
            pacing_events_enabled: self.pacing_events_enabled,
            factory_mode: self.factory_mode,
            rule_seed: self.rule_seed,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HostLimits;
    use crate::catalog::{ModuleCatalog, Profile, ProfileKind, ProfileRegistry};
    use crate::engine::lexer::tokenize;
    use crate::mission::{AggregatePool, PoolContent};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn context() -> Context {
        let catalog = ModuleCatalog::new().with_solvable_mod("ThreeDMaze", "3D Maze");
        let profiles = ProfileRegistry::new().with_profile("Hard", Profile::new(ProfileKind::Expert, ["Wires"]));
        Context::new(catalog, profiles)
    }

    fn parse_with(input: &str, ctx: &Context) -> Parsed {
        let mut rng = StdRng::seed_from_u64(1);
        Parser::new(ctx).parse(&tokenize(input), &mut rng)
    }

    fn parse(input: &str) -> Parsed {
        parse_with(input, &context())
    }

    #[test]
    fn implicit_bomb_uses_computed_defaults() {
        let parsed = parse("Wires 2*Keypad");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.bombs.len(), 1);
        let bomb = &parsed.bombs[0];
        assert_eq!(bomb.time_limit, 360);
        assert_eq!(bomb.num_strikes, 3);
        assert_eq!(bomb.time_before_needy_activation, None);
        assert_eq!(bomb.component_pools.len(), 2);
        assert!(parsed.pacing_events_enabled);
    }

    #[test]
    fn global_defaults_flow_into_bombs() {
        let parsed = parse("5:00 4X widgets:2 needyactivationtime:30 frontonly Wires");
        assert!(parsed.diagnostics.is_empty());
        let bomb = &parsed.bombs[0];
        assert_eq!(bomb.time_limit, 300);
        assert_eq!(bomb.num_strikes, 4);
        assert_eq!(bomb.optional_widget_count, Some(2));
        assert_eq!(bomb.time_before_needy_activation, Some(30));
        assert!(bomb.front_face_only);
    }

    #[test]
    fn strikes_scale_with_large_bombs() {
        let ctx = context().with_limits(HostLimits { max_modules: 101, ..HostLimits::default() });
        let parsed = parse_with("48*ALL_SOLVABLE", &ctx);
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.bombs[0].num_strikes, 4);
        assert_eq!(parsed.bombs[0].time_limit, 48 * 120);
    }

    #[test]
    fn duplicates_are_reported_per_scope() {
        let parsed = parse("strikes:0 strikes:5 Wires");
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::InvalidStrikeLimit, Diagnostic::Duplicate("Strikes")]
        );

        let parsed = parse("5:00 Wires 6:00");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::Duplicate("Time")]);

        let parsed = parse("5:00 (6:00 Wires) (6:00 Maze)");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.bombs[0].time_limit, 360);
    }

    #[test]
    fn groups_repeat_and_number_bombs() {
        let parsed = parse("2*(Wires) (NeedyKnob)");
        assert_eq!(parsed.bombs.len(), 3);
        assert_eq!(parsed.bombs[0], parsed.bombs[1]);
        assert_eq!(parsed.module_profiles.len(), 3);
        assert_eq!(parsed.diagnostics, vec![Diagnostic::NoSolvableModules { bomb: Some(3) }]);
    }

    #[test]
    fn group_structure_errors() {
        assert_eq!(parse("(Wires").diagnostics, vec![Diagnostic::UnclosedGroup]);
        assert_eq!(parse(")").diagnostics, vec![Diagnostic::UnexpectedClose, Diagnostic::NoSolvableModules {
            bomb: None
        }]);
        assert_eq!(parse("(Wires) Maze").diagnostics, vec![Diagnostic::UnexpectedModulePool]);
        assert_eq!(parse("0*(Wires)").diagnostics, vec![Diagnostic::InvalidRepeatCount, Diagnostic::NoSolvableModules {
            bomb: None
        }]);

        let parsed = parse("Wires (Maze)");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::UnexpectedOpen]);
        assert_eq!(parsed.bombs.len(), 1);
    }

    #[test]
    fn close_after_implicit_bomb_checks_it_and_keeps_nothing() {
        let parsed = parse("Wires)");
        assert!(parsed.bombs.is_empty());
        assert_eq!(parsed.diagnostics, vec![Diagnostic::NoSolvableModules { bomb: None }]);

        let parsed = parse("12*Wires) Maze");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::TooManyModules { count: 12, max: 11, bomb: None }]);
        assert_eq!(parsed.bombs.len(), 1);
        assert_eq!(parsed.bombs[0].module_count(), 1);
    }

    #[test]
    fn group_bombs_inherit_global_defaults() {
        let parsed = parse("5:00 widgets:2 needyactivationtime:30 frontonly (Wires) 2*(Maze)");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.bombs.len(), 3);
        for bomb in &parsed.bombs {
            assert_eq!(bomb.time_limit, 300);
            assert_eq!(bomb.optional_widget_count, Some(2));
            assert_eq!(bomb.time_before_needy_activation, Some(30));
            assert!(bomb.front_face_only);
            assert_eq!(bomb.num_strikes, 3);
        }

        // front-only is taken when the group opens, later defaults still fill the rest
        let parsed = parse("(Wires) frontonly 4X (Maze)");
        assert!(parsed.diagnostics.is_empty());
        assert!(!parsed.bombs[0].front_face_only);
        assert!(parsed.bombs[1].front_face_only);
        assert_eq!(parsed.bombs[1].num_strikes, 4);
    }

    #[test]
    fn empty_mission_has_no_solvable_modules() {
        assert_eq!(parse("").diagnostics, vec![Diagnostic::NoSolvableModules { bomb: None }]);
        assert_eq!(parse("5:00 3X").diagnostics, vec![Diagnostic::NoSolvableModules { bomb: None }]);
    }

    #[test]
    fn global_only_settings() {
        let parsed = parse("nopacing factory:finite ruleseed:12 Wires");
        assert!(parsed.diagnostics.is_empty());
        assert!(!parsed.pacing_events_enabled);
        assert_eq!(parsed.factory_mode, Some(FactoryMode::Finite));
        assert_eq!(parsed.rule_seed, Some(RuleSeed::Fixed(12)));

        let parsed = parse("(nopacing factory:static ruleseed:1 Wires)");
        assert_eq!(parsed.diagnostics, vec![
            Diagnostic::BombLevelSetting("nopacing"),
            Diagnostic::BombLevelSetting("Factory mode"),
            Diagnostic::BombLevelSetting("Rule seed"),
        ]);

        let parsed = parse("factory:sometimes ruleseed:-1 Wires");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::InvalidFactoryMode, Diagnostic::InvalidRuleSeed]);

        let parsed = parse("ruleseed:random ruleseed:4 Wires");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::Duplicate("Rule seed")]);
    }

    #[test]
    fn host_capabilities_are_checked() {
        let ctx = context().with_limits(HostLimits { multiple_bombs: false, factory: false, ..HostLimits::default() });
        let parsed = parse_with("factory:static (Wires)", &ctx);
        assert_eq!(parsed.diagnostics, vec![Diagnostic::FactoryUnavailable, Diagnostic::MultipleBombsUnavailable]);
    }

    #[test]
    fn module_count_limit() {
        assert!(parse("11*Wires").diagnostics.is_empty());
        assert_eq!(parse("12*Wires").diagnostics, vec![Diagnostic::TooManyModules { count: 12, max: 11, bomb: None }]);
        assert_eq!(parse("(12*Wires)").diagnostics, vec![Diagnostic::TooManyModules {
            count: 12,
            max: 11,
            bomb: Some(1)
        }]);
    }

    #[test]
    fn pool_errors_and_profiles() {
        let parsed = parse("0*Wires \"Maze");
        assert_eq!(parsed.diagnostics, vec![Diagnostic::InvalidPoolCount, Diagnostic::UnclosedQuote]);

        let parsed = parse("(profile:Hard) (ALL_VANILLA)");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.module_profiles, vec![vec!["Hard".to_string()], Vec::new()]);
        assert_eq!(
            parsed.bombs[1].component_pools[0].content,
            PoolContent::Aggregate(AggregatePool::AllVanilla)
        );
    }

    #[test]
    fn invalid_setting_values() {
        let parsed = parse("widgets:-1 needyactivationtime:x 0:00 Wires");
        assert_eq!(parsed.diagnostics, vec![
            Diagnostic::InvalidWidgetCount,
            Diagnostic::InvalidNeedyActivationTime,
            Diagnostic::InvalidTimeLimit,
        ]);
    }
}
