//! Read-only snapshots the compiler resolves module pools against.
//!
//! - [`ModuleCatalog`]: which mod modules are installed and which of them are
//!   disabled. Vanilla modules are always present.
//! - [`ProfileRegistry`]: named profiles, each a set of disabled module ids.
//!
//! Both are filled once by the host (or loaded from JSON) before compiling;
//! iteration is over ordered sets so resolution never depends on insertion
//! order.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::mission::{AggregatePool, ModuleClass, ModuleRef, VanillaModule};

/// An id and the human-readable name shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl ModuleInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// Outcome of looking up one id typed in a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    Known(ModuleClass),
    Disabled,
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    solvable: Vec<ModuleInfo>,
    #[serde(default)]
    needy: Vec<ModuleInfo>,
    #[serde(default)]
    disabled: Vec<String>,
}

/// Installed mod modules plus the built-in vanilla set.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    solvable_mods: BTreeSet<String>,
    needy_mods: BTreeSet<String>,
    disabled: BTreeSet<String>,
    names: BTreeMap<String, String>,
}

impl ModuleCatalog {
    /// A catalog with only the vanilla modules.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solvable_mod(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.add_solvable_mod(id, name);
        self
    }

    pub fn with_needy_mod(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.add_needy_mod(id, name);
        self
    }

    pub fn with_disabled(mut self, id: impl Into<String>) -> Self {
        self.disable(id);
        self
    }

    pub fn add_solvable_mod(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        self.names.insert(id.clone(), name.into());
        self.solvable_mods.insert(id);
    }

    pub fn add_needy_mod(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        self.names.insert(id.clone(), name.into());
        self.needy_mods.insert(id);
    }

    pub fn disable(&mut self, id: impl Into<String>) {
        self.disabled.insert(id.into());
    }

    /// Parse a snapshot of the form
    /// `{"solvable": [{"id", "name"}], "needy": [...], "disabled": [ids]}`.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for info in file.solvable {
            catalog.add_solvable_mod(info.id, info.name);
        }
        for info in file.needy {
            catalog.add_needy_mod(info.id, info.name);
        }
        for id in file.disabled {
            catalog.disable(id);
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let catalog =
            Self::from_json_str(&text).map_err(|source| LoadError::Json { path: path.to_path_buf(), source })?;
        info!(
            "loaded module catalog: {} solvable, {} needy, {} disabled",
            catalog.solvable_mods.len(),
            catalog.needy_mods.len(),
            catalog.disabled.len()
        );
        Ok(catalog)
    }

    /// Classify an id exactly as typed (case-sensitive).
    ///
    /// Vanilla ids win over mod ids with the same name; disabled mods are
    /// reported as such only when they are installed.
    pub(crate) fn classify(&self, id: &str) -> Classification {
        if let Some(module) = VanillaModule::from_id(id) {
            return Classification::Known(ModuleRef::vanilla(module).class);
        }
        let solvable = self.solvable_mods.contains(id);
        if !solvable && !self.needy_mods.contains(id) {
            return Classification::Unknown;
        }
        if self.disabled.contains(id) {
            return Classification::Disabled;
        }
        Classification::Known(if solvable { ModuleClass::ModSolvable } else { ModuleClass::ModNeedy })
    }

    fn enabled_mods<'a>(&'a self, set: &'a BTreeSet<String>) -> impl Iterator<Item = &'a String> + 'a {
        set.iter().filter(move |id| !self.disabled.contains(*id) && VanillaModule::from_id(id).is_none())
    }

    /// Every enabled module of one kind, vanilla first.
    pub fn enabled(&self, needy: bool) -> Vec<ModuleRef> {
        let pool = if needy { AggregatePool::AllNeedy } else { AggregatePool::AllSolvable };
        self.expand(pool)
    }

    /// Concrete module ids an aggregate keyword stands for: vanilla modules in
    /// table order followed by enabled mods in id order.
    pub fn expand(&self, pool: AggregatePool) -> Vec<ModuleRef> {
        use crate::mission::ComponentSource;

        let needy = pool.is_needy();
        let mut modules = Vec::new();
        if pool.sources().contains(ComponentSource::BASE) {
            let vanilla: &[VanillaModule] = if needy { &VanillaModule::NEEDY } else { &VanillaModule::SOLVABLE };
            modules.extend(vanilla.iter().map(|m| ModuleRef::vanilla(*m)));
        }
        if pool.sources().contains(ComponentSource::MODS) {
            let (set, class) = if needy {
                (&self.needy_mods, ModuleClass::ModNeedy)
            } else {
                (&self.solvable_mods, ModuleClass::ModSolvable)
            };
            modules.extend(self.enabled_mods(set).map(|id| ModuleRef::new(id.clone(), class)));
        }
        modules
    }

    /// True when `id` is a solvable module, installed or vanilla, enabled or not.
    pub fn is_solvable(&self, id: &str) -> bool {
        VanillaModule::from_id(id).is_some_and(|m| !m.is_needy()) || self.solvable_mods.contains(id)
    }

    pub fn is_needy(&self, id: &str) -> bool {
        VanillaModule::from_id(id).is_some_and(VanillaModule::is_needy) || self.needy_mods.contains(id)
    }

    /// All ids a pool may name, sorted by id, with display names.
    pub fn entries(&self) -> Vec<ModuleInfo> {
        let mut entries: Vec<ModuleInfo> = VanillaModule::SOLVABLE
            .iter()
            .chain(VanillaModule::NEEDY.iter())
            .map(|m| ModuleInfo::new(m.id(), m.display_name()))
            .collect();
        for id in self.solvable_mods.iter().chain(self.needy_mods.iter()) {
            if VanillaModule::from_id(id).is_some() {
                continue;
            }
            let name = self.names.get(id).filter(|n| !n.is_empty()).cloned().unwrap_or_else(|| id.clone());
            entries.push(ModuleInfo::new(id.clone(), name));
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

/// How a profile was authored in the mod selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProfileKind {
    /// Curates a set of modules the expert knows.
    #[default]
    Expert,
    /// Hides modules the defuser does not want to see.
    Defuser,
}

impl TryFrom<u8> for ProfileKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProfileKind::Expert),
            1 => Ok(ProfileKind::Defuser),
            other => Err(format!("unknown profile operation {other}")),
        }
    }
}

impl From<ProfileKind> for u8 {
    fn from(kind: ProfileKind) -> u8 {
        match kind {
            ProfileKind::Expert => 0,
            ProfileKind::Defuser => 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProfileFile {
    disabled_list: Option<Vec<String>>,
    #[serde(default)]
    operation: ProfileKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub disabled: BTreeSet<String>,
    pub kind: ProfileKind,
}

impl Profile {
    pub fn new(kind: ProfileKind, disabled: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { disabled: disabled.into_iter().map(Into::into).collect(), kind }
    }

    /// Modules of one kind left enabled once this profile is applied.
    pub fn enabled_modules(&self, catalog: &ModuleCatalog, needy: bool) -> Vec<ModuleRef> {
        catalog.enabled(needy).into_iter().filter(|m| !self.disabled.contains(&m.id)).collect()
    }
}

/// Profiles keyed by name (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, name: impl Into<String>, profile: Profile) -> Self {
        self.insert(name, profile);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Parse one mod-selector profile file.
    pub fn parse_profile(path: &Path, json: &str) -> Result<Profile, LoadError> {
        let file: ProfileFile =
            serde_json::from_str(json).map_err(|source| LoadError::Json { path: path.to_path_buf(), source })?;
        let disabled = file.disabled_list.ok_or_else(|| LoadError::MissingDisabledList(path.to_path_buf()))?;
        Ok(Profile::new(file.operation, disabled))
    }

    /// Load every `*.json` file in `dir`, named after the file stem.
    ///
    /// A missing directory yields an empty registry. Files that fail to parse
    /// are skipped with a warning so one broken profile does not hide the rest.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            debug!("profile directory {} does not exist", dir.display());
            return Ok(registry);
        }

        let entries = fs::read_dir(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let loaded = fs::read_to_string(&path)
                .map_err(|source| LoadError::Io { path: path.clone(), source })
                .and_then(|text| Self::parse_profile(&path, &text));
            match loaded {
                Ok(profile) => registry.insert(name, profile),
                Err(err) => warn!("could not load profile {}: {err}", path.display()),
            }
        }

        info!("loaded {} profile(s) from {}", registry.len(), dir.display());
        Ok(registry)
    }

    /// `profile:` / `needyprofile:` pool keywords worth offering.
    ///
    /// Defuser profiles that disable no module of a kind are left out, since
    /// they would enable everything.
    pub fn pool_keywords(&self, catalog: &ModuleCatalog) -> Vec<ModuleInfo> {
        let mut keywords = Vec::new();
        for (name, profile) in &self.profiles {
            let expert = profile.kind == ProfileKind::Expert;
            let mut any = false;
            if expert || profile.disabled.iter().any(|id| catalog.is_solvable(id)) {
                any = true;
                keywords
                    .push(ModuleInfo::new(format!("profile:{name}"), format!("{name} (solvable modules enabled by profile)")));
            }
            if expert || profile.disabled.iter().any(|id| catalog.is_needy(id)) {
                any = true;
                keywords.push(ModuleInfo::new(
                    format!("needyprofile:{name}"),
                    format!("{name} (needy modules enabled by profile)"),
                ));
            }
            if !any {
                debug!("not listing {name}: defuser profile that disables no modules");
            }
        }
        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .with_solvable_mod("ThreeDMaze", "3D Maze")
            .with_solvable_mod("Cheap", "Cheap Checkout")
            .with_needy_mod("NeedyMath", "Needy Math")
            .with_disabled("Cheap")
    }

    #[test]
    fn classify_covers_every_kind() {
        let catalog = catalog();
        assert_eq!(catalog.classify("Wires"), Classification::Known(ModuleClass::VanillaSolvable));
        assert_eq!(catalog.classify("NeedyKnob"), Classification::Known(ModuleClass::VanillaNeedy));
        assert_eq!(catalog.classify("ThreeDMaze"), Classification::Known(ModuleClass::ModSolvable));
        assert_eq!(catalog.classify("NeedyMath"), Classification::Known(ModuleClass::ModNeedy));
        assert_eq!(catalog.classify("Cheap"), Classification::Disabled);
        assert_eq!(catalog.classify("Nope"), Classification::Unknown);
        assert_eq!(catalog.classify("wires"), Classification::Unknown);
    }

    #[test]
    fn expand_skips_disabled_mods() {
        let ids: Vec<String> = catalog().expand(AggregatePool::AllSolvable).into_iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), VanillaModule::SOLVABLE.len() + 1);
        assert!(ids.contains(&"ThreeDMaze".to_string()));
        assert!(!ids.contains(&"Cheap".to_string()));

        let needy: Vec<String> = catalog().expand(AggregatePool::AllModsNeedy).into_iter().map(|m| m.id).collect();
        assert_eq!(needy, vec!["NeedyMath".to_string()]);
    }

    #[test]
    fn expand_ignores_insertion_order() {
        let a = ModuleCatalog::new().with_solvable_mod("B", "").with_solvable_mod("A", "");
        let b = ModuleCatalog::new().with_solvable_mod("A", "").with_solvable_mod("B", "");
        assert_eq!(a.expand(AggregatePool::AllSolvable), b.expand(AggregatePool::AllSolvable));
    }

    #[test]
    fn catalog_from_json() {
        let json = r#"{"solvable": [{"id": "ThreeDMaze", "name": "3D Maze"}], "needy": [{"id": "NeedyMath"}], "disabled": ["NeedyMath"]}"#;
        let catalog = ModuleCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.classify("ThreeDMaze"), Classification::Known(ModuleClass::ModSolvable));
        assert_eq!(catalog.classify("NeedyMath"), Classification::Disabled);
        let maze = catalog.entries().into_iter().find(|e| e.id == "ThreeDMaze").unwrap();
        assert_eq!(maze.name, "3D Maze");
        let math = catalog.entries().into_iter().find(|e| e.id == "NeedyMath").unwrap();
        assert_eq!(math.name, "NeedyMath");
    }

    #[test]
    fn profile_file_parsing() {
        let path = Path::new("Hard.json");
        let profile =
            ProfileRegistry::parse_profile(path, r#"{"DisabledList": ["Wires", "Maze"], "Operation": 1}"#).unwrap();
        assert_eq!(profile.kind, ProfileKind::Defuser);
        assert!(profile.disabled.contains("Maze"));

        let missing = ProfileRegistry::parse_profile(path, r#"{"DisabledList": null}"#);
        assert!(matches!(missing, Err(LoadError::MissingDisabledList(_))));
        assert!(ProfileRegistry::parse_profile(path, r#"{"DisabledList": [], "Operation": 7}"#).is_err());
    }

    #[test]
    fn profile_enabled_modules_subtract_disabled() {
        let profile = Profile::new(ProfileKind::Expert, ["Wires", "ThreeDMaze"]);
        let enabled = profile.enabled_modules(&catalog(), false);
        assert!(enabled.iter().all(|m| m.id != "Wires" && m.id != "ThreeDMaze"));
        assert_eq!(enabled.len(), VanillaModule::SOLVABLE.len() - 1);
    }

    #[test]
    fn defuser_profiles_that_disable_nothing_are_not_listed() {
        let registry = ProfileRegistry::new()
            .with_profile("Empty", Profile::new(ProfileKind::Defuser, Vec::<String>::new()))
            .with_profile("NoNeedy", Profile::new(ProfileKind::Defuser, ["NeedyMath"]))
            .with_profile("Curated", Profile::new(ProfileKind::Expert, ["Wires"]));
        let ids: Vec<String> = registry.pool_keywords(&catalog()).into_iter().map(|k| k.id).collect();
        assert_eq!(ids, vec!["profile:Curated", "needyprofile:Curated", "needyprofile:NoNeedy"]);
    }

    #[test]
    fn catalog_file_loads_and_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.json");
        fs::write(
            &path,
            r#"{"solvable": [{"id": "ThreeDMaze", "name": "3D Maze"}], "needy": [{"id": "NeedyMath"}], "disabled": ["ThreeDMaze"]}"#,
        )
        .unwrap();

        let catalog = ModuleCatalog::load(&path).unwrap();
        assert_eq!(catalog.classify("ThreeDMaze"), Classification::Disabled);
        assert_eq!(catalog.classify("NeedyMath"), Classification::Known(ModuleClass::ModNeedy));
        assert_eq!(catalog.classify("Wires"), Classification::Known(ModuleClass::VanillaSolvable));

        let missing = ModuleCatalog::load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(LoadError::Io { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{\"solvable\": 3}").unwrap();
        assert!(matches!(ModuleCatalog::load(&broken), Err(LoadError::Json { .. })));
    }

    #[test]
    fn profile_directory_skips_broken_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Hard.json"), r#"{"DisabledList": ["Wires", "Maze"], "Operation": 0}"#).unwrap();
        fs::write(dir.path().join("Broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), r#"{"DisabledList": []}"#).unwrap();

        let registry = ProfileRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        let hard = registry.get("Hard").unwrap();
        assert_eq!(hard.disabled, BTreeSet::from(["Wires".to_string(), "Maze".to_string()]));
        assert_eq!(hard.kind, ProfileKind::Expert);
        assert!(registry.get("Broken").is_none());
        assert!(registry.get("notes").is_none());
    }

    #[test]
    fn missing_profile_directory_is_empty() {
        let registry = ProfileRegistry::load_dir(Path::new("definitely/not/here")).unwrap();
        assert!(registry.is_empty());
    }
}
