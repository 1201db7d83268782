//! Pull request analysis and the heuristic fallback analyzer.

use super::{ChangedFile, PR_TASK_RULES, PullRequest};
use crate::delegation::domain::{Task, TaskType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const SECURITY_PATHS: &[&str] = &[
    "auth",
    "security",
    "crypto",
    "password",
    "token",
    "secret",
    "permission",
    "session",
    "login",
];
const PERFORMANCE_PATHS: &[&str] = &["db", "database", "query", "cache", "perf", "queue"];
const DEPLOYMENT_PATHS: &[&str] = &[
    "dockerfile",
    "docker-compose",
    ".github/workflows",
    "k8s",
    "helm",
    "terraform",
    "deploy",
    "cargo.toml",
    "package.json",
];
const PUBLIC_API_PATHS: &[&str] = &["api", "routes", "lib.rs", "index."];
const LARGE_CHANGE_LINES: u64 = 1_000;
const MEDIUM_CHANGE_LINES: u64 = 300;

/// Overall risk assigned to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Small, contained change.
    Low,
    /// Noticeable change that deserves review.
    Medium,
    /// Security, deployment, or very large change.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Producer of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Returned by the AI service.
    Ai,
    /// Computed locally from touched paths and diff size.
    Heuristic,
}

/// Review requirements derived from a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrAnalysis {
    /// A security review is needed.
    pub requires_security_review: bool,
    /// A code review is needed.
    pub requires_code_review: bool,
    /// Tests must be run.
    pub requires_testing: bool,
    /// Documentation must be checked.
    pub requires_documentation: bool,
    /// A performance review is needed.
    pub requires_performance_review: bool,
    /// A deployment check is needed.
    pub requires_deployment_check: bool,
    /// Overall risk.
    pub risk_level: RiskLevel,
    /// One-line description of the change.
    pub summary: String,
    /// Producer of this analysis.
    pub source: AnalysisSource,
}

impl PrAnalysis {
    /// Derives requirements from touched paths and diff size.
    #[must_use]
    pub fn heuristic(pull_request: &PullRequest, files: &[ChangedFile]) -> Self {
        let paths: Vec<String> = files
            .iter()
            .map(|file| file.filename.to_ascii_lowercase())
            .collect();
        let touches = |needles: &[&str]| {
            paths
                .iter()
                .any(|path| needles.iter().any(|needle| path.contains(needle)))
        };
        let is_doc = |path: &String| {
            path.ends_with(".md") || path.starts_with("docs/") || path.contains("/docs/")
        };

        let changed_lines = if files.is_empty() {
            pull_request.additions.saturating_add(pull_request.deletions)
        } else {
            files.iter().map(ChangedFile::changes).sum()
        };
        let code_changed = paths.iter().any(|path| !is_doc(path));
        let docs_changed = paths.iter().any(is_doc);
        let mentions_security = pull_request.body.to_ascii_lowercase().contains("security");

        let requires_security_review = touches(SECURITY_PATHS) || mentions_security;
        let requires_deployment_check = touches(DEPLOYMENT_PATHS);
        let requires_performance_review =
            touches(PERFORMANCE_PATHS) || changed_lines > LARGE_CHANGE_LINES;

        let risk_level = if requires_security_review
            || requires_deployment_check
            || changed_lines > LARGE_CHANGE_LINES
        {
            RiskLevel::High
        } else if requires_performance_review || changed_lines > MEDIUM_CHANGE_LINES {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        Self {
            requires_security_review,
            requires_code_review: true,
            requires_testing: code_changed,
            requires_documentation: code_changed && !docs_changed && touches(PUBLIC_API_PATHS),
            requires_performance_review,
            requires_deployment_check,
            risk_level,
            summary: format!(
                "{} files changed, {changed_lines} lines touched",
                files.len()
            ),
            source: AnalysisSource::Heuristic,
        }
    }

    /// Returns whether this analysis asks for a task of `task_type`.
    #[must_use]
    pub const fn requires(&self, task_type: TaskType) -> bool {
        match task_type {
            TaskType::SecurityReview => self.requires_security_review,
            TaskType::CodeReview => self.requires_code_review,
            TaskType::Testing => self.requires_testing,
            TaskType::Documentation => self.requires_documentation,
            TaskType::PerformanceReview => self.requires_performance_review,
            TaskType::DeploymentCheck => self.requires_deployment_check,
            TaskType::CodeGeneration | TaskType::DocumentationGeneration => false,
        }
    }

    /// Builds tasks from the pull request rule table.
    ///
    /// The output depends only on the analysis flags, in table order; only
    /// task ids differ between calls.
    #[must_use]
    pub fn generate_tasks(&self, payload: &Value) -> Vec<Task> {
        PR_TASK_RULES
            .iter()
            .filter(|rule| self.requires(rule.task_type))
            .map(|rule| rule.build(payload.clone()))
            .collect()
    }
}
