//! Report types.
//!
//! The classifier fills one [`Report`]; reporters render it. Every list is
//! sorted by (workspace, path, symbol) so a run's output depends only on
//! the filesystem state.

use serde::Serialize;

use shears_config::{IssueKind, ReportFilter};
use shears_core::Warning;
use shears_graph::SourceSpan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIssue {
    pub workspace: String,
    /// Path relative to the run root.
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyIssue {
    pub workspace: String,
    pub package: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportIssue {
    pub workspace: String,
    pub file: String,
    pub symbol: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryIssue {
    pub workspace: String,
    pub binary: String,
    pub script: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub unused_files: Vec<FileIssue>,
    pub unused_dependencies: Vec<DependencyIssue>,
    pub unlisted_dependencies: Vec<DependencyIssue>,
    pub unused_exports: Vec<ExportIssue>,
    pub unused_enum_members: Vec<ExportIssue>,
    pub unused_class_members: Vec<ExportIssue>,
    pub unlisted_binaries: Vec<BinaryIssue>,
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Sort every category into its canonical order.
    pub fn sort(&mut self) {
        self.unused_files
            .sort_by(|a, b| (&a.workspace, &a.file).cmp(&(&b.workspace, &b.file)));
        self.unused_dependencies
            .sort_by(|a, b| (&a.workspace, &a.package).cmp(&(&b.workspace, &b.package)));
        self.unlisted_dependencies
            .sort_by(|a, b| (&a.workspace, &a.package).cmp(&(&b.workspace, &b.package)));
        for exports in [
            &mut self.unused_exports,
            &mut self.unused_enum_members,
            &mut self.unused_class_members,
        ] {
            exports.sort_by(|a, b| {
                (&a.workspace, &a.file, &a.symbol).cmp(&(&b.workspace, &b.file, &b.symbol))
            });
        }
        self.unlisted_binaries.sort_by(|a, b| {
            (&a.workspace, &a.binary, &a.script).cmp(&(&b.workspace, &b.binary, &b.script))
        });
    }

    /// Drop the categories the filter projects away.
    pub fn apply_filter(&mut self, filter: &ReportFilter) {
        if !filter.is_active(IssueKind::Files) {
            self.unused_files.clear();
        }
        if !filter.is_active(IssueKind::Dependencies) {
            self.unused_dependencies.clear();
        }
        if !filter.is_active(IssueKind::Unlisted) {
            self.unlisted_dependencies.clear();
        }
        if !filter.is_active(IssueKind::Exports) {
            self.unused_exports.clear();
        }
        if !filter.is_active(IssueKind::EnumMembers) {
            self.unused_enum_members.clear();
        }
        if !filter.is_active(IssueKind::ClassMembers) {
            self.unused_class_members.clear();
        }
        if !filter.is_active(IssueKind::Binaries) {
            self.unlisted_binaries.clear();
        }
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        match kind {
            IssueKind::Files => self.unused_files.len(),
            IssueKind::Dependencies => self.unused_dependencies.len(),
            IssueKind::Unlisted => self.unlisted_dependencies.len(),
            IssueKind::Exports => self.unused_exports.len(),
            IssueKind::EnumMembers => self.unused_enum_members.len(),
            IssueKind::ClassMembers => self.unused_class_members.len(),
            IssueKind::Binaries => self.unlisted_binaries.len(),
        }
    }

    pub fn total_issues(&self) -> usize {
        IssueKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues() == 0
    }
}
