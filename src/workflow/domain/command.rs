//! Comment-command protocol.
//!
//! A command is the first comment line of the form `/name [args]`. Names
//! are parsed into per-entity action enums; anything unrecognised becomes
//! the `Unknown` variant so dispatch stays exhaustive.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static COMMAND_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^/([a-z-]+)(?:\s+(.*))?$").ok());

/// A command extracted from a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation<A> {
    /// Parsed action.
    pub action: A,
    /// Trimmed text after the command name, if any.
    pub args: Option<String>,
}

/// Action vocabulary of one entity type.
pub trait CommandAction: Sized {
    /// Valid command names with their one-line descriptions.
    const COMMANDS: &'static [(&'static str, &'static str)];

    /// Maps a command name to an action.
    fn from_name(name: &str) -> Self;
}

/// Extracts the first command from a comment body.
///
/// Returns `None` when no line matches the command pattern.
#[must_use]
pub fn parse_command<A: CommandAction>(body: &str) -> Option<CommandInvocation<A>> {
    let pattern = COMMAND_LINE.as_ref()?;
    body.lines().find_map(|line| {
        let captures = pattern.captures(line.trim())?;
        let name = captures.get(1)?.as_str();
        let args = captures
            .get(2)
            .map(|args| args.as_str().trim().to_owned())
            .filter(|args| !args.is_empty());
        Some(CommandInvocation {
            action: A::from_name(name),
            args,
        })
    })
}

/// Builds the reply to an unknown command.
#[must_use]
pub fn help_text<A: CommandAction>(unknown: &str) -> String {
    let listing: Vec<String> = A::COMMANDS
        .iter()
        .map(|(name, description)| format!("- `/{name}`: {description}"))
        .collect();
    format!(
        "Unknown command `/{unknown}`. Available commands:\n\n{}",
        listing.join("\n")
    )
}

/// Pull request commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrCommand {
    /// Run the testing task again.
    RerunTests,
    /// Run a security review.
    SecurityReview,
    /// Run a performance review.
    PerformanceCheck,
    /// Re-run the whole pull request pipeline.
    FullReview,
    /// Report the recorded context status.
    Status,
    /// Open a follow-up issue.
    CreateIssue,
    /// Unrecognised command name.
    Unknown(String),
}

impl CommandAction for PrCommand {
    const COMMANDS: &'static [(&'static str, &'static str)] = &[
        ("rerun-tests", "run the test suite again"),
        ("security-review", "run a security review"),
        ("performance-check", "run a performance review"),
        ("full-review", "re-run the complete analysis"),
        ("status", "show the current analysis status"),
        ("create-issue", "open a follow-up issue titled with the arguments"),
    ];

    fn from_name(name: &str) -> Self {
        match name {
            "rerun-tests" => Self::RerunTests,
            "security-review" => Self::SecurityReview,
            "performance-check" => Self::PerformanceCheck,
            "full-review" => Self::FullReview,
            "status" => Self::Status,
            "create-issue" => Self::CreateIssue,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

/// Issue commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueCommand {
    /// Re-run classification and triage.
    Triage,
    /// Report the effort estimate.
    Estimate,
    /// Assign a capability pool.
    AssignAgent,
    /// Delegate code generation.
    GenerateCode,
    /// Delegate documentation generation.
    GenerateDocs,
    /// Link a pull request.
    LinkPr,
    /// Mark as duplicate of another issue.
    Duplicate,
    /// Report the recorded context status.
    Status,
    /// Unrecognised command name.
    Unknown(String),
}

impl CommandAction for IssueCommand {
    const COMMANDS: &'static [(&'static str, &'static str)] = &[
        ("triage", "classify and label the issue again"),
        ("estimate", "show complexity and effort estimate"),
        ("assign-agent", "assign an agent pool, e.g. `/assign-agent security`"),
        ("generate-code", "ask an agent to generate code"),
        ("generate-docs", "ask an agent to generate documentation"),
        ("link-pr", "link a pull request, e.g. `/link-pr 42`"),
        ("duplicate", "mark as duplicate, e.g. `/duplicate 17`"),
        ("status", "show the current issue status"),
    ];

    fn from_name(name: &str) -> Self {
        match name {
            "triage" => Self::Triage,
            "estimate" => Self::Estimate,
            "assign-agent" => Self::AssignAgent,
            "generate-code" => Self::GenerateCode,
            "generate-docs" => Self::GenerateDocs,
            "link-pr" => Self::LinkPr,
            "duplicate" => Self::Duplicate,
            "status" => Self::Status,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for PrCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RerunTests => "rerun-tests",
            Self::SecurityReview => "security-review",
            Self::PerformanceCheck => "performance-check",
            Self::FullReview => "full-review",
            Self::Status => "status",
            Self::CreateIssue => "create-issue",
            Self::Unknown(name) => name,
        };
        f.write_str(name)
    }
}

impl fmt::Display for IssueCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Triage => "triage",
            Self::Estimate => "estimate",
            Self::AssignAgent => "assign-agent",
            Self::GenerateCode => "generate-code",
            Self::GenerateDocs => "generate-docs",
            Self::LinkPr => "link-pr",
            Self::Duplicate => "duplicate",
            Self::Status => "status",
            Self::Unknown(name) => name,
        };
        f.write_str(name)
    }
}

/// Parses an issue or pull request reference such as `42` or `#42`.
#[must_use]
pub fn parse_reference(args: Option<&str>) -> Option<u64> {
    args?
        .split_whitespace()
        .next()?
        .trim_start_matches('#')
        .parse()
        .ok()
}
