//! Domain model for pull request and issue workflows.

mod command;
mod context;
mod entities;
mod error;
mod event;
mod issue_analysis;
mod pr_analysis;
mod report;
mod rules;
mod similarity;
mod template;
mod triage;

pub use command::{
    CommandAction, CommandInvocation, IssueCommand, PrCommand, help_text, parse_command,
    parse_reference,
};
pub use context::{ContextKey, ContextStore, IssueContext, IssueStatus, PrContext, PrStatus};
pub use entities::{ChangedFile, Comment, Issue, PullRequest, Repository};
pub use error::WorkflowDomainError;
pub use event::{IssueAction, PullRequestAction, WebhookEvent};
pub use issue_analysis::{Complexity, IssueAnalysis, IssuePriority, IssueType, analyze_issue};
pub use pr_analysis::{AnalysisSource, PrAnalysis, RiskLevel};
pub use report::{FinalReport, ReportMetrics, TaskDetail, check_fails, report_labels, type_comment};
pub use rules::{
    ISSUE_CODE_RULE, ISSUE_DOCS_RULE, ISSUE_SECURITY_RULE, PR_TASK_RULES, TaskRule, pr_rule,
};
pub use similarity::{TitleSimilarity, search_prefix};
pub use triage::POSSIBLE_DUPLICATE_LABEL;
