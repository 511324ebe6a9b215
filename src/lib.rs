//! Compiler for the dynamic mission language.
//!
//! A mission is written as free text:
//!
//! ```text
//! 10:00 3X widgets:5          // global defaults
//! 2*(Wires, Keypad 2*ALL_VANILLA!)   // two identical bombs
//! (profile:Hard needyprofile:Hard)   // a third one
//! ```
//!
//! [`compile`] turns that text into a [`MissionSpec`] or a [`CompileError`]
//! holding every problem found in one pass.

#[macro_use]
mod macros;
mod api;
mod catalog;
mod engine;
mod error;
mod mission;

pub use api::{CompileDetails, CompileVerbose, Context, HostLimits, TokenSummary, compile, compile_verbose_with, compile_with};
pub use catalog::{ModuleCatalog, ModuleInfo, Profile, ProfileKind, ProfileRegistry};
pub use engine::CompileMetrics;
pub use error::{CompileError, Diagnostic, LoadError};
pub use mission::{
    AggregatePool, BombConfig, ComponentSource, FactoryMode, MissionSpec, ModuleClass, ModulePoolSpec, ModuleRef,
    PoolContent, RuleSeed, RuleSeedSetting, RuleSeedSink, VanillaModule,
};

// --- Internal types ---------------------------------------------------------

/// Byte span in the mission text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub range: Range,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// `H:MM:SS` or `MM:SS`, already converted to seconds.
    Time(u64),
    /// `3X`
    Strikes(u32),
    Setting { name: SettingName, value: Option<String> },
    ModulePool(PoolToken),
    /// `(` with the optional `N*` repeat prefix.
    GroupOpen { count: Option<u32> },
    GroupClose,
}

/// Payload of a module-pool token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PoolToken {
    /// Pool text with quotes stripped and outer whitespace trimmed.
    pub body: String,
    pub count: Option<u32>,
    /// Set by the `!` marker.
    pub unique: bool,
    pub unclosed_quote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SettingName {
    Strikes,
    NeedyActivationTime,
    Widgets,
    NoPacing,
    FrontOnly,
    Factory,
    RuleSeed,
}

impl SettingName {
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "strikes" => Some(SettingName::Strikes),
            "needyactivationtime" => Some(SettingName::NeedyActivationTime),
            "widgets" => Some(SettingName::Widgets),
            "nopacing" => Some(SettingName::NoPacing),
            "frontonly" => Some(SettingName::FrontOnly),
            "factory" => Some(SettingName::Factory),
            "ruleseed" => Some(SettingName::RuleSeed),
            _ => None,
        }
    }

    pub(crate) fn keyword(self) -> &'static str {
        match self {
            SettingName::Strikes => "strikes",
            SettingName::NeedyActivationTime => "needyactivationtime",
            SettingName::Widgets => "widgets",
            SettingName::NoPacing => "nopacing",
            SettingName::FrontOnly => "frontonly",
            SettingName::Factory => "factory",
            SettingName::RuleSeed => "ruleseed",
        }
    }
}
