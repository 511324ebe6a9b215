//! Pool resolution.
//!
//! Turns the text of one module-pool token into pool descriptors. The text is
//! looked up in a fixed order:
//!
//! ```text
//! "ALL_VANILLA"            exact aggregate keyword  -> Aggregate
//! "profile:Hard"           profile prefix (any case) -> Profile
//! "Wires, Keypad + Maze"   anything else            -> Explicit, id by id
//! ```
//!
//! Unknown and disabled ids are reported one by one; the remaining ids of the
//! same pool still resolve.
//!
//! A plain pool becomes one descriptor holding the whole set. A unique pool
//! (`!`) becomes `count` one-module descriptors drawn without replacement from
//! the candidates, so no module repeats across them.

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{Classification, ModuleCatalog, ProfileRegistry};
use crate::error::Diagnostic;
use crate::mission::{AggregatePool, ModulePoolSpec, ModuleRef, PoolContent};

/// Result of resolving one pool token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedPool {
    pub pools: Vec<ModulePoolSpec>,
    pub has_solvable: bool,
    /// Profile the pool referenced, when it exists.
    pub profile: Option<String>,
}

/// Where the modules of a pool come from, before the unique split.
enum Source {
    Aggregate(AggregatePool),
    Profile { name: String, needy: bool, modules: Vec<ModuleRef> },
    Explicit(Vec<ModuleRef>),
}

impl Source {
    fn has_solvable(&self) -> bool {
        match self {
            Source::Aggregate(pool) => !pool.is_needy(),
            Source::Profile { needy, modules, .. } => !needy && !modules.is_empty(),
            Source::Explicit(modules) => modules.iter().any(|m| m.class.is_solvable()),
        }
    }
}

pub(crate) struct PoolResolver<'a> {
    catalog: &'a ModuleCatalog,
    profiles: &'a ProfileRegistry,
}

/// `text` without `prefix`, compared ASCII case-insensitively.
fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

impl<'a> PoolResolver<'a> {
    pub(crate) fn new(catalog: &'a ModuleCatalog, profiles: &'a ProfileRegistry) -> Self {
        Self { catalog, profiles }
    }

    /// Resolve normalized pool text into descriptors, appending any problems
    /// to `diagnostics`.
    pub(crate) fn resolve<R: Rng + ?Sized>(
        &self,
        body: &str,
        count: u32,
        unique: bool,
        rng: &mut R,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResolvedPool {
        let source = self.lookup(body, diagnostics);
        let has_solvable = source.has_solvable();
        let profile = match &source {
            Source::Profile { name, .. } if self.profiles.get(name).is_some() => Some(name.clone()),
            _ => None,
        };

        let pools = if unique {
            self.unique_pools(source, count, rng, diagnostics)
        } else {
            let content = match source {
                Source::Aggregate(pool) => PoolContent::Aggregate(pool),
                Source::Profile { name, needy, modules } => PoolContent::Profile { name, needy, modules },
                Source::Explicit(modules) => PoolContent::Explicit(modules),
            };
            vec![ModulePoolSpec { count, unique: false, content }]
        };

        ResolvedPool { pools, has_solvable, profile }
    }

    fn lookup(&self, body: &str, diagnostics: &mut Vec<Diagnostic>) -> Source {
        if let Some(pool) = AggregatePool::from_keyword(body) {
            return Source::Aggregate(pool);
        }

        if let Some(name) = strip_prefix_ignore_case(body, "profile:") {
            return self.profile(name, false, diagnostics);
        }
        if let Some(name) = strip_prefix_ignore_case(body, "needyprofile:") {
            return self.profile(name, true, diagnostics);
        }

        let mut modules = Vec::new();
        for id in body.split([',', '+']).map(str::trim) {
            match self.catalog.classify(id) {
                Classification::Known(class) => modules.push(ModuleRef::new(id, class)),
                Classification::Disabled => diagnostics.push(Diagnostic::DisabledModule(id.to_string())),
                Classification::Unknown => diagnostics.push(Diagnostic::UnknownModule(id.to_string())),
            }
        }
        Source::Explicit(modules)
    }

    fn profile(&self, name: &str, needy: bool, diagnostics: &mut Vec<Diagnostic>) -> Source {
        let Some(profile) = self.profiles.get(name) else {
            diagnostics.push(Diagnostic::UnknownProfile(name.to_string()));
            return Source::Profile { name: name.to_string(), needy, modules: Vec::new() };
        };

        debug!("[resolve] profile {name} disables: {:?}", profile.disabled);
        let modules = profile.enabled_modules(self.catalog, needy);
        if modules.is_empty() {
            diagnostics.push(Diagnostic::EmptyProfile(name.to_string()));
        }
        Source::Profile { name: name.to_string(), needy, modules }
    }

    fn unique_pools<R: Rng + ?Sized>(
        &self,
        source: Source,
        count: u32,
        rng: &mut R,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ModulePoolSpec> {
        let mut candidates = match source {
            Source::Aggregate(pool) => self.catalog.expand(pool),
            Source::Profile { modules, .. } | Source::Explicit(modules) => modules,
        };
        let mut seen = std::collections::HashSet::new();
        candidates.retain(|m| seen.insert(m.id.clone()));

        if candidates.is_empty() {
            diagnostics.push(Diagnostic::NoValidModules);
        } else if candidates.len() < count as usize {
            diagnostics.push(Diagnostic::UniqueShortfall { requested: count, found: candidates.len() });
        }

        candidates
            .choose_multiple(rng, count as usize)
            .map(|module| ModulePoolSpec {
                count: 1,
                unique: true,
                content: PoolContent::Explicit(vec![module.clone()]),
            })
            .collect()
    }
}
