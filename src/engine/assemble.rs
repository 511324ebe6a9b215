//! Mission assembly.
//!
//! The host only knows how to start one generator setting. Extra bombs and
//! factory mode ride along as marker pools appended to the first bomb:
//!
//! ```text
//! bombs[0].pools ++ [ExtraBombs x(n-1)] ++ [SerializedBomb 1] .. [SerializedBomb n-1] ++ [FactoryMode xINDEX]
//! ```

use log::debug;
use rand::Rng;

use super::parser::Parsed;
use crate::api::HostLimits;
use crate::error::{CompileError, Diagnostic};
use crate::mission::{MissionSpec, ModulePoolSpec, PoolContent, RuleSeed, RuleSeedSetting};

pub(crate) const DISPLAY_NAME: &str = "Custom Freeplay";

/// Random rule seeds are drawn from this range.
const RANDOM_RULE_SEEDS: std::ops::Range<u32> = 1..1000;

/// Build the final mission, or fail with every diagnostic collected so far.
pub(crate) fn assemble<R: Rng + ?Sized>(
    parsed: Parsed,
    limits: &HostLimits,
    rng: &mut R,
) -> Result<MissionSpec, CompileError> {
    let mut diagnostics = parsed.diagnostics;

    let rule_seed = match parsed.rule_seed {
        None => None,
        Some(_) if !limits.rule_seed => {
            diagnostics.push(Diagnostic::RuleSeedUnavailable);
            None
        }
        Some(requested) => {
            let value = match requested {
                RuleSeed::Fixed(seed) => seed,
                RuleSeed::Random => rng.gen_range(RANDOM_RULE_SEEDS),
            };
            Some(RuleSeedSetting { requested, value })
        }
    };

    let Some(first) = parsed.bombs.first() else {
        if diagnostics.is_empty() {
            diagnostics.push(Diagnostic::NoSolvableModules { bomb: None });
        }
        return Err(CompileError { diagnostics });
    };
    if !diagnostics.is_empty() {
        return Err(CompileError { diagnostics });
    }

    let mut generator_setting = first.clone();
    let extra = parsed.bombs.len() - 1;
    if extra > 0 {
        let count = u32::try_from(extra).unwrap_or(u32::MAX);
        generator_setting.component_pools.push(ModulePoolSpec::new(count, PoolContent::ExtraBombs));
        for (index, bomb) in parsed.bombs.iter().enumerate().skip(1) {
            match serde_json::to_string(bomb) {
                Ok(config) => generator_setting
                    .component_pools
                    .push(ModulePoolSpec::new(1, PoolContent::SerializedBomb { index, config })),
                Err(err) => diagnostics.push(Diagnostic::Serialization { index, reason: err.to_string() }),
            }
        }
    }

    if let Some(mode) = parsed.factory_mode {
        generator_setting.component_pools.push(ModulePoolSpec::new(mode.index(), PoolContent::FactoryMode));
    }

    if !diagnostics.is_empty() {
        return Err(CompileError { diagnostics });
    }

    debug!(
        "[assemble] {} bomb(s), {} generator pool(s), rule seed {:?}",
        parsed.bombs.len(),
        generator_setting.component_pools.len(),
        rule_seed.map(|s| s.value)
    );

    Ok(MissionSpec {
        display_name: DISPLAY_NAME.to_string(),
        bombs: parsed.bombs,
        generator_setting,
        pacing_events_enabled: parsed.pacing_events_enabled,
        factory_mode: parsed.factory_mode,
        rule_seed,
        module_profiles: parsed.module_profiles,
    })
}
