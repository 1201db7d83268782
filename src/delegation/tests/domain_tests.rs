//! Domain tests for tasks and results.

use std::time::Duration;

use crate::delegation::domain::{
    AgentType, Finding, ParseTaskValueError, Task, TaskOutput, TaskPriority, TaskResult, TaskType,
};
use chrono::{TimeDelta, Utc};
use rstest::rstest;
use serde_json::json;

fn task(priority: TaskPriority) -> Task {
    Task::new(
        TaskType::SecurityReview,
        priority,
        Duration::from_secs(300),
        2,
        json!({"pr": 7}),
    )
}

#[rstest]
fn priorities_sort_in_bucket_order() {
    let mut priorities = vec![
        TaskPriority::Low,
        TaskPriority::Critical,
        TaskPriority::Medium,
        TaskPriority::High,
    ];
    priorities.sort();
    assert_eq!(priorities, TaskPriority::ALL.to_vec());
}

#[rstest]
#[case(TaskType::SecurityReview, AgentType::Security)]
#[case(TaskType::CodeReview, AgentType::CodeReview)]
#[case(TaskType::Testing, AgentType::Testing)]
#[case(TaskType::Documentation, AgentType::Documentation)]
#[case(TaskType::DocumentationGeneration, AgentType::Documentation)]
#[case(TaskType::PerformanceReview, AgentType::Performance)]
#[case(TaskType::DeploymentCheck, AgentType::Deployment)]
#[case(TaskType::CodeGeneration, AgentType::CodeGeneration)]
fn task_types_route_to_capability_pools(#[case] task_type: TaskType, #[case] agent: AgentType) {
    assert_eq!(task_type.agent_type(), agent);
}

#[rstest]
fn derived_retry_has_fresh_id_and_smaller_budget() {
    let original = task(TaskPriority::High);
    let retry = original.derive_retry();

    assert_ne!(retry.id(), original.id());
    assert_eq!(retry.retries(), 1);
    assert_eq!(retry.task_type(), original.task_type());
    assert_eq!(retry.payload(), original.payload());
    assert_eq!(retry.derive_retry().derive_retry().retries(), 0);
}

#[rstest]
fn agent_names_parse_leniently() {
    assert_eq!(AgentType::try_from("Code_Review"), Ok(AgentType::CodeReview));
    assert_eq!(
        AgentType::try_from("wizard"),
        Err(ParseTaskValueError::AgentType("wizard".to_owned()))
    );
    assert_eq!(TaskPriority::try_from(" HIGH "), Ok(TaskPriority::High));
    assert_eq!(
        TaskType::try_from("deployment_check"),
        Ok(TaskType::DeploymentCheck)
    );
}

#[rstest]
fn result_helpers_expose_findings_and_duration() {
    let started = Utc::now();
    let output = TaskOutput::with_summary("checked")
        .with_finding(Finding::new("hardcoded secret").with_file("src/auth.rs"))
        .blocking();
    let result = TaskResult::completed(
        task(TaskPriority::High),
        output,
        started,
        started + TimeDelta::milliseconds(250),
    );

    assert_eq!(result.findings().len(), 1);
    assert!(result.is_blocking());
    assert_eq!(result.duration().num_milliseconds(), 250);
    assert!(!result.is_critical_failure());
}

#[rstest]
fn only_failed_critical_results_are_critical_failures() {
    let now = Utc::now();
    let critical = TaskResult::failed(task(TaskPriority::Critical), "boom", now, now);
    let high = TaskResult::failed(task(TaskPriority::High), "boom", now, now);

    assert!(critical.is_critical_failure());
    assert!(!high.is_critical_failure());
    assert!(critical.findings().is_empty());
}

#[rstest]
fn agent_output_accepts_issues_alias_and_extra_fields() {
    let output: TaskOutput = serde_json::from_value(json!({
        "summary": "2 problems",
        "issues": [{"message": "sql injection", "severity": "high"}],
        "blocking": true,
        "coverage": 81.5
    }))
    .unwrap_or_else(|err| panic!("output should deserialize: {err}"));

    assert_eq!(output.findings.len(), 1);
    assert!(output.blocking);
    assert_eq!(output.extra.get("coverage"), Some(&json!(81.5)));
}
