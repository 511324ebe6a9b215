use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VanillaModule {
    BigButton,
    Keypad,
    Maze,
    Memory,
    Morse,
    Password,
    Simon,
    Venn,
    WhosOnFirst,
    WireSequence,
    Wires,
    NeedyCapacitor,
    NeedyKnob,
    NeedyVentGas,
}

impl VanillaModule {
    pub const SOLVABLE: [VanillaModule; 11] = [
        VanillaModule::BigButton,
        VanillaModule::Keypad,
        VanillaModule::Maze,
        VanillaModule::Memory,
        VanillaModule::Morse,
        VanillaModule::Password,
        VanillaModule::Simon,
        VanillaModule::Venn,
        VanillaModule::WhosOnFirst,
        VanillaModule::WireSequence,
        VanillaModule::Wires,
    ];

    pub const NEEDY: [VanillaModule; 3] =
        [VanillaModule::NeedyCapacitor, VanillaModule::NeedyKnob, VanillaModule::NeedyVentGas];

    /// Exact, case-sensitive lookup by module id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::SOLVABLE.iter().chain(Self::NEEDY.iter()).copied().find(|m| m.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            VanillaModule::BigButton => "BigButton",
            VanillaModule::Keypad => "Keypad",
            VanillaModule::Maze => "Maze",
            VanillaModule::Memory => "Memory",
            VanillaModule::Morse => "Morse",
            VanillaModule::Password => "Password",
            VanillaModule::Simon => "Simon",
            VanillaModule::Venn => "Venn",
            VanillaModule::WhosOnFirst => "WhosOnFirst",
            VanillaModule::WireSequence => "WireSequence",
            VanillaModule::Wires => "Wires",
            VanillaModule::NeedyCapacitor => "NeedyCapacitor",
            VanillaModule::NeedyKnob => "NeedyKnob",
            VanillaModule::NeedyVentGas => "NeedyVentGas",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            VanillaModule::BigButton => "The Button",
            VanillaModule::Simon => "Simon Says",
            VanillaModule::WhosOnFirst => "Who's On First",
            VanillaModule::Morse => "Morse Code",
            VanillaModule::Venn => "Complicated Wires",
            VanillaModule::WireSequence => "Wire Sequence",
            VanillaModule::NeedyCapacitor => "Capacitor Discharge",
            VanillaModule::NeedyKnob => "Knob",
            VanillaModule::NeedyVentGas => "Venting Gas",
            other => other.id(),
        }
    }

    pub fn is_needy(self) -> bool {
        Self::NEEDY.contains(&self)
    }
}

/// Where a module id comes from and how it is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleClass {
    VanillaSolvable,
    VanillaNeedy,
    ModSolvable,
    ModNeedy,
}

impl ModuleClass {
    pub fn is_solvable(self) -> bool {
        matches!(self, ModuleClass::VanillaSolvable | ModuleClass::ModSolvable)
    }
}

/// A module id that resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleRef {
    pub id: String,
    pub class: ModuleClass,
}

impl ModuleRef {
    pub fn new(id: impl Into<String>, class: ModuleClass) -> Self {
        Self { id: id.into(), class }
    }

    pub(crate) fn vanilla(module: VanillaModule) -> Self {
        let class = if module.is_needy() { ModuleClass::VanillaNeedy } else { ModuleClass::VanillaSolvable };
        Self::new(module.id(), class)
    }
}

bitflags::bitflags! {
    /// Module sources an aggregate pool may draw from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct ComponentSource: u8 {
        const BASE = 1 << 0;
        const MODS = 1 << 1;
    }
}

/// The six `ALL_*` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AggregatePool {
    AllSolvable,
    AllNeedy,
    AllVanilla,
    AllMods,
    AllVanillaNeedy,
    AllModsNeedy,
}

impl AggregatePool {
    pub const ALL: [AggregatePool; 6] = [
        AggregatePool::AllSolvable,
        AggregatePool::AllNeedy,
        AggregatePool::AllVanilla,
        AggregatePool::AllMods,
        AggregatePool::AllVanillaNeedy,
        AggregatePool::AllModsNeedy,
    ];

    /// Exact, case-sensitive keyword match.
    pub fn from_keyword(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|pool| pool.keyword() == text)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            AggregatePool::AllSolvable => "ALL_SOLVABLE",
            AggregatePool::AllNeedy => "ALL_NEEDY",
            AggregatePool::AllVanilla => "ALL_VANILLA",
            AggregatePool::AllMods => "ALL_MODS",
            AggregatePool::AllVanillaNeedy => "ALL_VANILLA_NEEDY",
            AggregatePool::AllModsNeedy => "ALL_MODS_NEEDY",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AggregatePool::AllSolvable => "[All solvable modules]",
            AggregatePool::AllNeedy => "[All needy modules]",
            AggregatePool::AllVanilla => "[All vanilla solvable modules]",
            AggregatePool::AllMods => "[All mod solvable modules]",
            AggregatePool::AllVanillaNeedy => "[All vanilla needy modules]",
            AggregatePool::AllModsNeedy => "[All mod needy modules]",
        }
    }

    pub fn sources(self) -> ComponentSource {
        match self {
            AggregatePool::AllSolvable | AggregatePool::AllNeedy => ComponentSource::BASE | ComponentSource::MODS,
            AggregatePool::AllVanilla | AggregatePool::AllVanillaNeedy => ComponentSource::BASE,
            AggregatePool::AllMods | AggregatePool::AllModsNeedy => ComponentSource::MODS,
        }
    }

    pub fn is_needy(self) -> bool {
        matches!(self, AggregatePool::AllNeedy | AggregatePool::AllVanillaNeedy | AggregatePool::AllModsNeedy)
    }
}

/// What a pool slot is filled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PoolContent {
    Aggregate(AggregatePool),
    Profile { name: String, needy: bool, modules: Vec<ModuleRef> },
    Explicit(Vec<ModuleRef>),
    /// Host marker: the mission has `count` bombs beyond the first.
    ExtraBombs,
    /// Host marker carrying one extra bomb's configuration as JSON.
    SerializedBomb { index: usize, config: String },
    /// Host marker: factory mode, index stored in the pool count.
    FactoryMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModulePoolSpec {
    pub count: u32,
    pub unique: bool,
    pub content: PoolContent,
}

impl ModulePoolSpec {
    pub fn new(count: u32, content: PoolContent) -> Self {
        Self { count, unique: false, content }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BombConfig {
    /// Seconds.
    pub time_limit: u32,
    pub num_strikes: u32,
    pub time_before_needy_activation: Option<u32>,
    pub optional_widget_count: Option<u32>,
    pub front_face_only: bool,
    pub component_pools: Vec<ModulePoolSpec>,
}

impl BombConfig {
    /// Total number of module slots on the bomb.
    pub fn module_count(&self) -> u64 {
        self.component_pools.iter().map(|pool| u64::from(pool.count)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FactoryMode {
    Static,
    Finite,
    FiniteGlobalTime,
    FiniteGlobalStrikes,
    FiniteGlobalTimeStrikes,
    Infinite,
    InfiniteGlobalTime,
    InfiniteGlobalStrikes,
    InfiniteGlobalTimeStrikes,
}

impl FactoryMode {
    pub const ALL: [FactoryMode; 9] = [
        FactoryMode::Static,
        FactoryMode::Finite,
        FactoryMode::FiniteGlobalTime,
        FactoryMode::FiniteGlobalStrikes,
        FactoryMode::FiniteGlobalTimeStrikes,
        FactoryMode::Infinite,
        FactoryMode::InfiniteGlobalTime,
        FactoryMode::InfiniteGlobalStrikes,
        FactoryMode::InfiniteGlobalTimeStrikes,
    ];

    /// Case-insensitive lookup of a `factory:` value.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.id().eq_ignore_ascii_case(id))
    }

    pub fn id(self) -> &'static str {
        match self {
            FactoryMode::Static => "static",
            FactoryMode::Finite => "finite",
            FactoryMode::FiniteGlobalTime => "finitegtime",
            FactoryMode::FiniteGlobalStrikes => "finitegstrikes",
            FactoryMode::FiniteGlobalTimeStrikes => "finitegtimestrikes",
            FactoryMode::Infinite => "infinite",
            FactoryMode::InfiniteGlobalTime => "infinitegtime",
            FactoryMode::InfiniteGlobalStrikes => "infinitegstrikes",
            FactoryMode::InfiniteGlobalTimeStrikes => "infinitegtimestrikes",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FactoryMode::Static => "Factory: Static",
            FactoryMode::Finite => "Factory: Finite",
            FactoryMode::FiniteGlobalTime => "Factory: Finite + global time",
            FactoryMode::FiniteGlobalStrikes => "Factory: Finite + global strikes",
            FactoryMode::FiniteGlobalTimeStrikes => "Factory: Finite + global time and strikes",
            FactoryMode::Infinite => "Factory: Infinite",
            FactoryMode::InfiniteGlobalTime => "Factory: Infinite + global time",
            FactoryMode::InfiniteGlobalStrikes => "Factory: Infinite + global strikes",
            FactoryMode::InfiniteGlobalTimeStrikes => "Factory: Infinite + global time and strikes",
        }
    }

    /// Position in [`FactoryMode::ALL`], which is what the host expects.
    pub fn index(self) -> u32 {
        Self::ALL.iter().position(|mode| *mode == self).unwrap_or_default() as u32
    }
}

/// Value of a `ruleseed:` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleSeed {
    Fixed(u32),
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleSeedSetting {
    pub requested: RuleSeed,
    /// The seed to hand to the host.
    pub value: u32,
}

/// Host hook that applies a rule seed before the mission starts.
pub trait RuleSeedSink {
    fn set_rule_seed(&mut self, seed: u32);
}

/// A compiled mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MissionSpec {
    pub display_name: String,
    /// Finalized bombs in mission order.
    pub bombs: Vec<BombConfig>,
    /// The first bomb with the host marker pools appended.
    pub generator_setting: BombConfig,
    pub pacing_events_enabled: bool,
    pub factory_mode: Option<FactoryMode>,
    pub rule_seed: Option<RuleSeedSetting>,
    /// Profile names referenced by each bomb, aligned with `bombs`.
    pub module_profiles: Vec<Vec<String>>,
}

impl MissionSpec {
    /// Push the resolved rule seed into the host. Returns `false` when the
    /// mission did not ask for one.
    pub fn apply_rule_seed(&self, sink: &mut dyn RuleSeedSink) -> bool {
        match self.rule_seed {
            Some(setting) => {
                sink.set_rule_seed(setting.value);
                true
            }
            None => false,
        }
    }
}
