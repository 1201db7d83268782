//! Triage labels, comments, and issue task generation.

use super::{
    ISSUE_CODE_RULE, ISSUE_DOCS_RULE, ISSUE_SECURITY_RULE, IssueAnalysis, IssuePriority, IssueType,
    WorkflowDomainError, template::render,
};
use crate::delegation::domain::Task;
use serde_json::Value;

/// Label applied to suspected duplicates.
pub const POSSIBLE_DUPLICATE_LABEL: &str = "possible-duplicate";

const TRIAGE_TEMPLATE: &str = "\
## Issue triage

| | |
|---|---|
| Type | {{ analysis.issue_type }} |
| Priority | {{ analysis.priority }} |
| Complexity | {{ analysis.complexity }} |
| Estimated effort | {{ analysis.estimated_hours }}h ({{ size }}) |
{% if analysis.required_skills %}
| Skills | {{ analysis.required_skills | join(\", \") }} |
{% endif %}

### Acceptance criteria
{% for item in analysis.acceptance_criteria %}
- [ ] {{ item }}
{% endfor %}

### Suggested approach
{% for step in analysis.suggested_approach %}
{{ loop.index }}. {{ step }}
{% endfor %}
{% if analysis.risk_factors %}

### Risks
{% for risk in analysis.risk_factors %}
- {{ risk }}
{% endfor %}
{% endif %}
{% if analysis.can_auto_generate %}

This issue can be handled by an automation agent{% if analysis.requires_human_review %}; a maintainer will review the result{% endif %}.
{% endif %}
";

impl IssueAnalysis {
    /// Returns the size bucket derived from the effort estimate.
    #[must_use]
    pub const fn size(&self) -> &'static str {
        match self.estimated_hours {
            h if h >= 20 => "large",
            h if h >= 8 => "medium",
            _ => "small",
        }
    }

    /// Returns the labels applied during triage.
    #[must_use]
    pub fn triage_labels(&self) -> Vec<String> {
        let mut labels = vec![self.issue_type.as_str().to_owned()];
        if self.priority != IssuePriority::Medium {
            labels.push(format!("priority-{}", self.priority));
        }
        if self.complexity.is_complex() {
            labels.push("complex".to_owned());
        }
        labels.push(format!("size-{}", self.size()));
        labels.extend(
            self.required_skills
                .iter()
                .map(|skill| format!("skill-{skill}")),
        );
        if self.can_auto_generate {
            labels.push("auto-generate".to_owned());
        }
        if self.needs_more_info {
            labels.push("needs-info".to_owned());
        }
        if self.requires_human_review {
            labels.push("human-review".to_owned());
        }
        labels
    }

    /// Renders the triage comment.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Render`] when the template fails.
    pub fn triage_comment(&self) -> Result<String, WorkflowDomainError> {
        render(
            "triage comment",
            TRIAGE_TEMPLATE,
            minijinja::context! { analysis => self, size => self.size() },
        )
    }

    /// Returns the request for missing details, by issue type.
    #[must_use]
    pub const fn information_request(&self) -> &'static str {
        match self.issue_type {
            IssueType::Bug => {
                "Thanks for the report. Could you add the steps to reproduce, the expected and actual behaviour, and your environment (version, OS)?"
            }
            IssueType::Feature | IssueType::Enhancement => {
                "Thanks for the idea. Could you describe what the feature should do, who needs it, and any requirements it must meet?"
            }
            IssueType::Security => {
                "Thanks for the report. Could you describe the affected component, the impact, and how the problem can be triggered?"
            }
            IssueType::Performance => {
                "Thanks for the report. Could you share the workload, measured timings, and what you expected?"
            }
            IssueType::Documentation => {
                "Thanks. Could you point to the page or section that needs changing and what is missing or wrong?"
            }
            IssueType::Question | IssueType::Maintenance => {
                "Thanks. Could you add more context so we can help?"
            }
        }
    }

    /// Builds the automation tasks for this issue.
    ///
    /// Security issues always get a critical security review; issues an
    /// agent can handle get documentation or code generation.
    #[must_use]
    pub fn generate_tasks(&self, payload: &Value) -> Vec<Task> {
        let mut tasks = Vec::new();
        if self.issue_type == IssueType::Security {
            tasks.push(ISSUE_SECURITY_RULE.build(payload.clone()));
        }
        if self.can_auto_generate {
            let rule = if self.issue_type == IssueType::Documentation {
                ISSUE_DOCS_RULE
            } else {
                ISSUE_CODE_RULE
            };
            tasks.push(rule.build(payload.clone()));
        }
        tasks
    }
}
