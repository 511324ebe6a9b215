//! Error types.
//!
//! [`Diagnostic`] is one validation message. A compile collects all of them
//! and fails with a [`CompileError`] when the list is not empty. Loading the
//! catalog and profile snapshots uses [`LoadError`].

use std::fmt;
use std::io;
use std::path::PathBuf;

/// One problem found in the mission text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    // syntax
    #[error("Unclosed quote")]
    UnclosedQuote,
    #[error("Unexpected '('")]
    UnexpectedOpen,
    #[error("Unexpected ')'")]
    UnexpectedClose,
    #[error("Unexpected module pool")]
    UnexpectedModulePool,
    #[error("Missing ')' at end of mission")]
    UnclosedGroup,
    #[error("Invalid module pool count")]
    InvalidPoolCount,
    #[error("Invalid bomb repeat count")]
    InvalidRepeatCount,

    // duplication and scope
    #[error("{0} specified multiple times")]
    Duplicate(&'static str),
    #[error("{0} cannot be a bomb-level setting")]
    BombLevelSetting(&'static str),

    // range
    #[error("Invalid time limit")]
    InvalidTimeLimit,
    #[error("Invalid strike limit")]
    InvalidStrikeLimit,
    #[error("Invalid needy activation time")]
    InvalidNeedyActivationTime,
    #[error("Invalid widget count")]
    InvalidWidgetCount,
    #[error("Invalid rule seed")]
    InvalidRuleSeed,
    #[error("Invalid factory mode")]
    InvalidFactoryMode,

    // references
    #[error("'{0}' is an unknown module ID.")]
    UnknownModule(String),
    #[error("'{0}' is disabled.")]
    DisabledModule(String),
    #[error("No profile named '{0}' was found.")]
    UnknownProfile(String),
    #[error("Profile '{0}' enables no valid modules.")]
    EmptyProfile(String),
    #[error("No valid modules found")]
    NoValidModules,
    #[error("Requested {requested} unique modules but only found {found} valid modules")]
    UniqueShortfall { requested: u32, found: usize },

    // bomb validation
    #[error("No solvable modules{}", on_bomb(.bomb))]
    NoSolvableModules { bomb: Option<usize> },
    #[error("Too many modules for any bomb casing ({count} > {max}){}", on_bomb(.bomb))]
    TooManyModules { count: u64, max: usize, bomb: Option<usize> },

    // host integration
    #[error("Multiple Bombs does not seem to be enabled")]
    MultipleBombsUnavailable,
    #[error("Factory does not seem to be enabled")]
    FactoryUnavailable,
    #[error("Rule seed modifier mod is not installed or disabled.")]
    RuleSeedUnavailable,
    #[error("Could not serialize bomb {index}: {reason}")]
    Serialization { index: usize, reason: String },
}

fn on_bomb(bomb: &Option<usize>) -> String {
    bomb.map(|n| format!(" on bomb {n}")).unwrap_or_default()
}

/// A failed compile: every diagnostic, in the order found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    /// Render the first `limit` messages, one per line, followed by a
    /// `"N more"` line when some were left out.
    pub fn summary(&self, limit: usize) -> String {
        let mut lines: Vec<String> = self.diagnostics.iter().take(limit).map(|d| d.to_string()).collect();
        if self.diagnostics.len() > limit {
            lines.push(format!("{} more", self.diagnostics.len() - limit));
        }
        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mission has {} problem(s):\n{}", self.diagnostics.len(), self.summary(5))
    }
}

impl std::error::Error for CompileError {}

/// Failure to load a catalog or profile snapshot.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid json in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("profile {} has no disabled list", .0.display())]
    MissingDisabledList(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bomb_number_is_appended_only_for_groups() {
        assert_eq!(Diagnostic::NoSolvableModules { bomb: None }.to_string(), "No solvable modules");
        assert_eq!(Diagnostic::NoSolvableModules { bomb: Some(2) }.to_string(), "No solvable modules on bomb 2");
        assert_eq!(
            Diagnostic::TooManyModules { count: 12, max: 11, bomb: None }.to_string(),
            "Too many modules for any bomb casing (12 > 11)"
        );
    }

    #[test]
    fn summary_truncates_after_limit() {
        let err = CompileError { diagnostics: vec![Diagnostic::UnexpectedClose; 7] };
        let summary = err.summary(5);
        assert_eq!(summary.lines().count(), 6);
        assert!(summary.ends_with("2 more"));
        assert_eq!(CompileError { diagnostics: vec![Diagnostic::UnclosedQuote] }.summary(5), "Unclosed quote");
    }
}
