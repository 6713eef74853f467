//! Issue categories and the `--include` / `--exclude` report projection.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The reportable issue categories.
///
/// `ClassMembers` is opt-in: it only appears when named by `--include`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    /// Project files never reached from any entry.
    Files,
    /// Declared dependencies never referenced.
    Dependencies,
    /// Imported packages not declared in any ancestor manifest.
    Unlisted,
    /// Exports with no consumers.
    Exports,
    /// Enum members with no consumers.
    EnumMembers,
    /// Class members with no consumers.
    ClassMembers,
    /// Script binaries that resolve to no installed package.
    Binaries,
}

impl IssueKind {
    pub const ALL: [IssueKind; 7] = [
        IssueKind::Files,
        IssueKind::Dependencies,
        IssueKind::Unlisted,
        IssueKind::Exports,
        IssueKind::EnumMembers,
        IssueKind::ClassMembers,
        IssueKind::Binaries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Files => "files",
            IssueKind::Dependencies => "dependencies",
            IssueKind::Unlisted => "unlisted",
            IssueKind::Exports => "exports",
            IssueKind::EnumMembers => "enumMembers",
            IssueKind::ClassMembers => "classMembers",
            IssueKind::Binaries => "binaries",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(IssueKind::Files),
            "dependencies" => Ok(IssueKind::Dependencies),
            "unlisted" => Ok(IssueKind::Unlisted),
            "exports" => Ok(IssueKind::Exports),
            "enumMembers" => Ok(IssueKind::EnumMembers),
            "classMembers" => Ok(IssueKind::ClassMembers),
            "binaries" => Ok(IssueKind::Binaries),
            other => Err(ConfigError::InvalidIssueKind(other.to_string())),
        }
    }
}

/// Categories reported when no filter is given.
pub const DEFAULT_ISSUE_KINDS: [IssueKind; 6] = [
    IssueKind::Files,
    IssueKind::Dependencies,
    IssueKind::Unlisted,
    IssueKind::Exports,
    IssueKind::EnumMembers,
    IssueKind::Binaries,
];

/// Projection of classifier output onto a subset of categories.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub include: Vec<IssueKind>,
    pub exclude: Vec<IssueKind>,
}

impl ReportFilter {
    pub fn new(include: Vec<IssueKind>, exclude: Vec<IssueKind>) -> Self {
        Self { include, exclude }
    }

    /// The categories that survive the projection.
    ///
    /// A non-empty `include` names them outright; otherwise the defaults
    /// apply. `exclude` always wins over both.
    pub fn active(&self) -> BTreeSet<IssueKind> {
        let base: BTreeSet<IssueKind> = if self.include.is_empty() {
            DEFAULT_ISSUE_KINDS.into_iter().collect()
        } else {
            self.include.iter().copied().collect()
        };
        base.into_iter()
            .filter(|kind| !self.exclude.contains(kind))
            .collect()
    }

    pub fn is_active(&self, kind: IssueKind) -> bool {
        self.active().contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_exclude_class_members() {
        let filter = ReportFilter::default();
        assert!(filter.is_active(IssueKind::Files));
        assert!(filter.is_active(IssueKind::EnumMembers));
        assert!(!filter.is_active(IssueKind::ClassMembers));
    }

    #[test]
    fn include_replaces_the_default_set() {
        let filter = ReportFilter::new(vec![IssueKind::ClassMembers], vec![]);
        assert!(filter.is_active(IssueKind::ClassMembers));
        assert!(!filter.is_active(IssueKind::Files));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = ReportFilter::new(
            vec![IssueKind::Files, IssueKind::Exports],
            vec![IssueKind::Exports],
        );
        assert!(filter.is_active(IssueKind::Files));
        assert!(!filter.is_active(IssueKind::Exports));
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in IssueKind::ALL {
            assert_eq!(kind.as_str().parse::<IssueKind>().unwrap(), kind);
        }
        assert!("exprots".parse::<IssueKind>().is_err());
    }
}
