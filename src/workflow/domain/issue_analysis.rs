//! Deterministic issue classifier.
//!
//! Every field of [`IssueAnalysis`] is derived from the issue text and
//! labels alone, so the same issue always classifies the same way.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Defect report.
    Bug,
    /// New capability request.
    Feature,
    /// Improvement of existing behaviour; the fallback category.
    Enhancement,
    /// Documentation change.
    Documentation,
    /// Security problem.
    Security,
    /// Performance problem.
    Performance,
    /// Support question.
    Question,
    /// Chores and upkeep.
    Maintenance,
}

impl IssueType {
    /// Returns the label-friendly name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Enhancement => "enhancement",
            Self::Documentation => "documentation",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Question => "question",
            Self::Maintenance => "maintenance",
        }
    }

    const fn complexity_weight(self) -> i32 {
        match self {
            Self::Security => 3,
            Self::Performance | Self::Feature => 2,
            Self::Bug | Self::Enhancement | Self::Maintenance => 1,
            Self::Documentation | Self::Question => 0,
        }
    }

    /// Effort multiplier in tenths.
    const fn effort_tenths(self) -> u32 {
        match self {
            Self::Security => 15,
            Self::Performance => 13,
            Self::Bug => 10,
            Self::Feature => 12,
            Self::Enhancement => 11,
            Self::Documentation => 8,
            Self::Question => 3,
            Self::Maintenance => 9,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuePriority {
    /// Needs attention now.
    Critical,
    /// Next in line.
    High,
    /// Default urgency.
    Medium,
    /// Can wait.
    Low,
}

impl IssuePriority {
    /// Returns the lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implementation complexity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Complexity {
    /// One-line change.
    Trivial,
    /// Small, well-understood change.
    Simple,
    /// Touches a few components.
    Moderate,
    /// Cross-cutting change.
    Complex,
    /// Design work across several systems.
    VeryComplex,
}

impl Complexity {
    /// Returns the kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::VeryComplex => "very-complex",
        }
    }

    /// Returns whether the bucket is complex or very complex.
    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex | Self::VeryComplex)
    }

    const fn from_score(score: i32) -> Self {
        match score {
            s if s >= 6 => Self::VeryComplex,
            s if s >= 4 => Self::Complex,
            s if s >= 2 => Self::Moderate,
            s if s >= 1 => Self::Simple,
            _ => Self::Trivial,
        }
    }

    const fn base_hours(self) -> u32 {
        match self {
            Self::Trivial => 1,
            Self::Simple => 3,
            Self::Moderate => 8,
            Self::Complex => 20,
            Self::VeryComplex => 40,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAnalysis {
    /// Category.
    pub issue_type: IssueType,
    /// Urgency.
    pub priority: IssuePriority,
    /// Complexity bucket.
    pub complexity: Complexity,
    /// Estimated effort in hours.
    pub estimated_hours: u32,
    /// Skills needed to resolve the issue.
    pub required_skills: Vec<String>,
    /// Conditions for closing the issue.
    pub acceptance_criteria: Vec<String>,
    /// Suggested implementation steps.
    pub suggested_approach: Vec<String>,
    /// Known risks.
    pub risk_factors: Vec<String>,
    /// The report lacks the detail needed to act on it.
    pub needs_more_info: bool,
    /// An agent can produce the change unaided.
    pub can_auto_generate: bool,
    /// A maintainer must review any generated change.
    pub requires_human_review: bool,
}

const TYPE_LABELS: [(&[&str], IssueType); 7] = [
    (&["bug", "defect"], IssueType::Bug),
    (&["feature", "enhancement"], IssueType::Feature),
    (&["documentation", "docs"], IssueType::Documentation),
    (&["security", "vulnerability"], IssueType::Security),
    (&["performance", "optimization"], IssueType::Performance),
    (&["question", "help"], IssueType::Question),
    (&["maintenance", "chore"], IssueType::Maintenance),
];

const TYPE_KEYWORDS: [(&[&str], IssueType); 6] = [
    (
        &["bug", "error", "crash", "broken", "fails", "failing", "exception", "not working"],
        IssueType::Bug,
    ),
    (
        &["security", "vulnerab", "exploit", "xss", "injection", "csrf", "cve-"],
        IssueType::Security,
    ),
    (
        &["performance", "slow", "latency", "memory leak", "speed up"],
        IssueType::Performance,
    ),
    (&["documentation", "docs", "readme", "guide"], IssueType::Documentation),
    (&["question", "how do i", "how to", "is it possible"], IssueType::Question),
    (
        &["feature", "add ", "support for", "implement", "would be nice", "request"],
        IssueType::Feature,
    ),
];

const BUG_CRITICAL: &[&str] = &["crash", "data loss", "data-loss", "production", "critical", "urgent"];
const BUG_HIGH: &[&str] = &["error", "broken", "fails"];
const URGENT: &[&str] = &["urgent", "asap", "critical", "blocking", "important"];
const DEFERRABLE: &[&str] = &["nice to have", "later", "optional"];
const DESIGN_WORDS: &[&str] = &[
    "refactor",
    "architecture",
    "design",
    "algorithm",
    "optimization",
    "migration",
    "integration",
];
const COSMETIC_WORDS: &[&str] = &["typo", "text", "color", "style", "copy", "link"];
const SYSTEM_WORDS: &[&str] = &[
    "database",
    "api",
    "frontend",
    "backend",
    "deployment",
    "infrastructure",
];
const SKILL_WORDS: [(&[&str], &str); 6] = [
    (&["frontend", "ui", "css", "react", "component"], "frontend"),
    (&["backend", "api", "server", "endpoint"], "backend"),
    (&["database", "sql", "query", "migration"], "database"),
    (
        &["deploy", "docker", "pipeline", "infrastructure", "kubernetes"],
        "devops",
    ),
    (&["security", "auth", "vulnerab"], "security"),
    (&["test"], "testing"),
];

fn mentions(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// Classifies an issue from its text and labels.
///
/// `text` is usually the title and body joined; matching is
/// case-insensitive.
#[must_use]
pub fn analyze_issue(text: &str, labels: &[String]) -> IssueAnalysis {
    let lowered = text.to_lowercase();
    let lowered_labels: Vec<String> = labels.iter().map(|label| label.to_lowercase()).collect();

    let issue_type = classify_type(&lowered, &lowered_labels);
    let priority = classify_priority(&lowered, &lowered_labels, issue_type);
    let complexity = classify_complexity(&lowered, issue_type);
    let can_auto_generate = can_auto_generate(&lowered, issue_type);

    IssueAnalysis {
        issue_type,
        priority,
        complexity,
        estimated_hours: estimate_hours(complexity, issue_type),
        required_skills: required_skills(&lowered, issue_type),
        acceptance_criteria: acceptance_criteria(text, issue_type),
        suggested_approach: default_approach(issue_type),
        risk_factors: risk_factors(&lowered, issue_type, complexity),
        needs_more_info: needs_more_info(&lowered, issue_type),
        can_auto_generate,
        requires_human_review: !can_auto_generate || complexity.is_complex(),
    }
}

fn classify_type(text: &str, labels: &[String]) -> IssueType {
    let from_label = labels.iter().find_map(|label| {
        TYPE_LABELS
            .iter()
            .find(|(names, _)| mentions(label, names))
            .map(|(_, issue_type)| *issue_type)
    });
    from_label
        .or_else(|| {
            TYPE_KEYWORDS
                .iter()
                .find(|(keywords, _)| mentions(text, keywords))
                .map(|(_, issue_type)| *issue_type)
        })
        .unwrap_or(IssueType::Enhancement)
}

fn priority_from_labels(labels: &[String]) -> Option<IssuePriority> {
    labels.iter().find_map(|label| {
        let bare = label
            .trim_start_matches("priority")
            .trim_start_matches([':', '-', '/', ' ']);
        if mentions(label, &["critical", "urgent"]) {
            Some(IssuePriority::Critical)
        } else if bare.starts_with("high") {
            Some(IssuePriority::High)
        } else if bare.starts_with("low") {
            Some(IssuePriority::Low)
        } else {
            None
        }
    })
}

fn classify_priority(text: &str, labels: &[String], issue_type: IssueType) -> IssuePriority {
    if let Some(priority) = priority_from_labels(labels) {
        return priority;
    }
    match issue_type {
        IssueType::Security => IssuePriority::Critical,
        IssueType::Bug if mentions(text, BUG_CRITICAL) => IssuePriority::Critical,
        IssueType::Bug if mentions(text, BUG_HIGH) => IssuePriority::High,
        IssueType::Bug => IssuePriority::Medium,
        _ if mentions(text, URGENT) => IssuePriority::High,
        _ if mentions(text, DEFERRABLE) => IssuePriority::Low,
        _ => IssuePriority::Medium,
    }
}

fn classify_complexity(text: &str, issue_type: IssueType) -> Complexity {
    let length = text.chars().count();
    let mut score = match length {
        l if l > 2_000 => 2,
        l if l > 1_000 => 1,
        _ => 0,
    };
    score += issue_type.complexity_weight();
    if mentions(text, DESIGN_WORDS) {
        score += 2;
    }
    if mentions(text, COSMETIC_WORDS) {
        score -= 1;
    }
    let systems = SYSTEM_WORDS
        .iter()
        .filter(|word| text.contains(*word))
        .count()
        .min(3);
    score += i32::try_from(systems).unwrap_or(3);
    Complexity::from_score(score)
}

#[expect(
    clippy::integer_division,
    reason = "effort rounds half up to whole hours"
)]
fn estimate_hours(complexity: Complexity, issue_type: IssueType) -> u32 {
    (complexity.base_hours() * issue_type.effort_tenths() + 5) / 10
}

fn needs_more_info(text: &str, issue_type: IssueType) -> bool {
    text.chars().count() < 100
        || (issue_type == IssueType::Bug && !mentions(text, &["reproduce", "steps"]))
        || (issue_type == IssueType::Feature && !mentions(text, &["should", "requirement"]))
}

fn can_auto_generate(text: &str, issue_type: IssueType) -> bool {
    (issue_type == IssueType::Documentation
        && mentions(text, &["readme", "api doc", "api-doc", "comment"]))
        || mentions(text, &["config", "setting", "environment"])
        || (text.contains("test") && text.contains("simple"))
        || mentions(text, &["boilerplate", "template", "scaffold"])
}

fn required_skills(text: &str, issue_type: IssueType) -> Vec<String> {
    let mut skills: Vec<String> = SKILL_WORDS
        .iter()
        .filter(|(words, _)| mentions(text, words))
        .map(|(_, skill)| (*skill).to_owned())
        .collect();
    let implied = match issue_type {
        IssueType::Security => Some("security"),
        IssueType::Performance => Some("performance"),
        IssueType::Documentation => Some("documentation"),
        _ => None,
    };
    if let Some(skill) = implied
        && !skills.iter().any(|existing| existing == skill)
    {
        skills.push(skill.to_owned());
    }
    skills
}

fn acceptance_criteria(text: &str, issue_type: IssueType) -> Vec<String> {
    let checkboxes: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            line.strip_prefix("- [ ]")
                .or_else(|| line.strip_prefix("- [x]"))
                .or_else(|| line.strip_prefix("- [X]"))
        })
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect();
    if !checkboxes.is_empty() {
        return checkboxes;
    }
    let defaults: &[&str] = match issue_type {
        IssueType::Bug => &[
            "The reported behaviour no longer occurs",
            "A regression test covers the fix",
        ],
        IssueType::Feature | IssueType::Enhancement => &[
            "The change works as described",
            "Tests cover the new behaviour",
            "Documentation is updated",
        ],
        IssueType::Documentation => &["Documentation is accurate and complete"],
        IssueType::Security => &[
            "The vulnerability is no longer exploitable",
            "A security regression test is added",
        ],
        IssueType::Performance => &[
            "Improvement is measured against a baseline",
            "No functional regressions",
        ],
        IssueType::Question => &["The question is answered"],
        IssueType::Maintenance => &["The chore is done without behaviour changes"],
    };
    defaults.iter().map(|item| (*item).to_owned()).collect()
}

fn default_approach(issue_type: IssueType) -> Vec<String> {
    let steps: &[&str] = match issue_type {
        IssueType::Bug => &[
            "Reproduce the issue locally",
            "Identify the root cause",
            "Fix it and add a regression test",
        ],
        IssueType::Security => &[
            "Assess impact and affected versions",
            "Patch the vulnerable code path",
            "Add tests and prepare an advisory",
        ],
        IssueType::Performance => &[
            "Profile to find the hot path",
            "Optimize and benchmark against the baseline",
        ],
        IssueType::Documentation => &["Update the affected pages", "Check examples still run"],
        IssueType::Question => &["Answer the question and link relevant docs"],
        IssueType::Feature | IssueType::Enhancement | IssueType::Maintenance => &[
            "Agree the design in the issue",
            "Implement behind tests",
            "Document the change",
        ],
    };
    steps.iter().map(|step| (*step).to_owned()).collect()
}

fn risk_factors(text: &str, issue_type: IssueType, complexity: Complexity) -> Vec<String> {
    let mut risks = Vec::new();
    if text.contains("breaking") {
        risks.push("Potential breaking change".to_owned());
    }
    if mentions(text, &["migration", "database"]) {
        risks.push("Data migration may be required".to_owned());
    }
    if text.contains("api") {
        risks.push("Public API impact".to_owned());
    }
    if issue_type == IssueType::Security {
        risks.push("Security-sensitive change".to_owned());
    }
    if complexity.is_complex() {
        risks.push("High implementation complexity".to_owned());
    }
    risks
}
