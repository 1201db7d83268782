//! Result aggregation, final reports, and per-type comments.

use super::{WorkflowDomainError, template::render};
use crate::delegation::domain::{Finding, TaskResult, TaskStatus, TaskType};
use serde::Serialize;

const REPORT_TEMPLATE: &str = "\
## {{ title }}

{{ summary }}

| Task | Status | Duration |
|---|---|---|
{% for detail in details %}
| {{ detail.task_type }} | {{ detail.status }} | {{ detail.duration_ms }}ms |
{% endfor %}
{% for detail in details %}
{% if detail.summary or detail.error or detail.findings %}

### {{ detail.task_type }}
{% if detail.summary %}
{{ detail.summary }}
{% endif %}
{% if detail.error %}
Error: {{ detail.error }}
{% endif %}
{% for finding in detail.findings %}
- {% if finding.severity %}**{{ finding.severity }}** {% endif %}{{ finding.message }}{% if finding.file %} (`{{ finding.file }}`){% endif %}

{% endfor %}
{% endif %}
{% endfor %}
{% if recommendations %}

### Recommendations
{% for item in recommendations %}
- {{ item }}
{% endfor %}
{% endif %}

Total execution time {{ metrics.total_execution_time_ms }}ms, average {{ metrics.average_task_time_ms }}ms per task, success rate {{ metrics.success_rate }}%.
";

/// Per-task line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetail {
    /// Task type.
    pub task_type: TaskType,
    /// Terminal status.
    pub status: TaskStatus,
    /// Execution time.
    pub duration_ms: i64,
    /// Agent summary.
    pub summary: Option<String>,
    /// Failure description.
    pub error: Option<String>,
    /// Agent findings.
    pub findings: Vec<Finding>,
}

/// Aggregate timings of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportMetrics {
    /// Sum of task durations.
    pub total_execution_time_ms: i64,
    /// Mean task duration, zero for an empty batch.
    pub average_task_time_ms: i64,
    /// Completed tasks as a whole percentage, zero for an empty batch.
    pub success_rate: u32,
}

/// Report posted once a batch settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalReport {
    /// Report heading.
    pub title: String,
    /// `Completed X/Y tasks (Z failed)`.
    pub summary: String,
    /// One entry per result.
    pub details: Vec<TaskDetail>,
    /// Recommendations from every result, in result order.
    pub recommendations: Vec<String>,
    /// Aggregate timings.
    pub metrics: ReportMetrics,
    /// Labels implied by the findings.
    pub labels: Vec<String>,
}

impl FinalReport {
    /// Aggregates settled results.
    #[must_use]
    pub fn from_results(title: impl Into<String>, results: &[TaskResult]) -> Self {
        let total = results.len();
        let failed = results.iter().filter(|result| result.is_failed()).count();
        let completed = total.saturating_sub(failed);

        let details = results
            .iter()
            .map(|result| TaskDetail {
                task_type: result.task_type(),
                status: result.status,
                duration_ms: result.duration().num_milliseconds(),
                summary: result.output.as_ref().and_then(|output| output.summary.clone()),
                error: result.error.clone(),
                findings: result.findings().to_vec(),
            })
            .collect();
        let recommendations = results
            .iter()
            .filter_map(|result| result.output.as_ref())
            .flat_map(|output| output.recommendations.iter().cloned())
            .collect();

        Self {
            title: title.into(),
            summary: format!("Completed {completed}/{total} tasks ({failed} failed)"),
            details,
            recommendations,
            metrics: metrics(results, completed),
            labels: report_labels(results),
        }
    }

    /// Renders the report as a Markdown comment.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Render`] when the template fails.
    pub fn render(&self) -> Result<String, WorkflowDomainError> {
        render("final report", REPORT_TEMPLATE, self)
    }
}

fn metrics(results: &[TaskResult], completed: usize) -> ReportMetrics {
    let total_execution_time_ms: i64 = results
        .iter()
        .map(|result| result.duration().num_milliseconds())
        .sum();
    let count = i64::try_from(results.len()).unwrap_or(i64::MAX);
    let success_rate = completed
        .saturating_mul(100)
        .checked_div(results.len())
        .unwrap_or(0);
    ReportMetrics {
        total_execution_time_ms,
        average_task_time_ms: total_execution_time_ms.checked_div(count).unwrap_or(0),
        success_rate: u32::try_from(success_rate).unwrap_or(100),
    }
}

/// Labels implied by task types that produced findings.
#[must_use]
pub fn report_labels(results: &[TaskResult]) -> Vec<String> {
    let mut labels = Vec::new();
    for (task_type, label) in [
        (TaskType::SecurityReview, "security-review-needed"),
        (TaskType::Testing, "tests-failing"),
        (TaskType::Documentation, "docs-needed"),
    ] {
        let flagged = results
            .iter()
            .any(|result| result.task_type() == task_type && !result.findings().is_empty());
        if flagged {
            labels.push(label.to_owned());
        }
    }
    labels
}

/// Returns whether the commit check should fail.
///
/// Any failed result or any blocking output fails the check, regardless of
/// the task's type or priority.
#[must_use]
pub fn check_fails(results: &[TaskResult]) -> bool {
    results
        .iter()
        .any(|result| result.is_failed() || result.is_blocking())
}

fn finding_lines(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|finding| {
            let location = finding
                .file
                .as_ref()
                .map(|file| format!(" (`{file}`)"))
                .unwrap_or_default();
            let severity = finding
                .severity
                .as_ref()
                .map(|severity| format!("**{severity}** "))
                .unwrap_or_default();
            format!("- {severity}{}{location}", finding.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the comment for one result type, if that type reports anything.
///
/// Test results and deployment status are always reported; the other types
/// only comment when they produced findings. Code review suggestions are
/// rendered by the caller, which may ask the AI service for prose.
#[must_use]
pub fn type_comment(result: &TaskResult) -> Option<String> {
    let findings = result.findings();
    match result.task_type() {
        TaskType::SecurityReview if !findings.is_empty() => Some(format!(
            "### Security alert\n\nThe security review found {} issue(s):\n\n{}",
            findings.len(),
            finding_lines(findings)
        )),
        TaskType::Testing => Some(match (&result.error, findings.is_empty()) {
            (Some(error), _) => format!("### Test results\n\nTest run failed: {error}"),
            (None, true) => "### Test results\n\nAll tests passed.".to_owned(),
            (None, false) => format!(
                "### Test results\n\n{} failing test(s):\n\n{}",
                findings.len(),
                finding_lines(findings)
            ),
        }),
        TaskType::Documentation if !findings.is_empty() => Some(format!(
            "### Documentation reminder\n\nPlease update the documentation:\n\n{}",
            finding_lines(findings)
        )),
        TaskType::PerformanceReview if !findings.is_empty() => Some(format!(
            "### Performance alert\n\n{}",
            finding_lines(findings)
        )),
        TaskType::DeploymentCheck => Some(if result.is_failed() || result.is_blocking() {
            let reason = result
                .error
                .clone()
                .unwrap_or_else(|| finding_lines(findings));
            format!("### Deployment status\n\nNot ready to deploy.\n\n{reason}")
        } else {
            "### Deployment status\n\nReady to deploy.".to_owned()
        }),
        TaskType::CodeReview if !findings.is_empty() => Some(format!(
            "### Review suggestions\n\n{}",
            finding_lines(findings)
        )),
        _ => None,
    }
}
