//! Pull request workflow engine tests.

use std::sync::Arc;
use std::time::Duration;

use super::support::{Harness, repository};
use crate::delegation::{
    adapters::memory::{InMemoryOrchestrator, ScriptedOutcome},
    domain::{Finding, TaskOutput, TaskPriority, TaskType},
};
use crate::runtime::{
    adapters::memory::InMemoryWebhookQueue,
    domain::ShutdownReason,
    ports::AgentToggle,
    services::{QueueShutdownHooks, ShutdownCoordinator, ShutdownHandle},
};
use crate::workflow::{
    adapters::memory::{InMemoryGitHub, ScriptedAi},
    domain::{
        AnalysisSource, ChangedFile, Comment, PrAnalysis, PrCommand, PrStatus, PullRequest,
        PullRequestAction, RiskLevel,
    },
    ports::{CommitState, GitHubError},
};
use rstest::{fixture, rstest};

const NUMBER: u64 = 7;

fn pull_request() -> PullRequest {
    let mut pull_request = PullRequest::new(NUMBER, "Harden login", "abc123");
    pull_request.base_ref = "main".to_owned();
    pull_request
}

fn sensitive_files() -> Vec<ChangedFile> {
    vec![
        ChangedFile::modified("src/auth/login.rs", 40, 4),
        ChangedFile::modified("Dockerfile", 2, 1),
    ]
}

fn delayed(ms: u64) -> ScriptedOutcome {
    ScriptedOutcome::Delayed(
        Duration::from_millis(ms),
        Box::new(ScriptedOutcome::Succeed(TaskOutput::with_summary("late"))),
    )
}

#[fixture]
fn harness() -> Harness {
    Harness::new(
        InMemoryGitHub::new().with_files(NUMBER, sensitive_files()),
        ScriptedAi::new(),
        InMemoryOrchestrator::new(),
    )
}

#[rstest]
#[tokio::test]
async fn opened_pull_request_runs_the_full_pipeline(harness: Harness) {
    let service = harness.pull_requests(ShutdownHandle::detached());

    let status = service
        .process_pull_request(&pull_request(), &repository(), Some("delivery-1"))
        .await;

    assert_eq!(status, Some(PrStatus::Completed));
    let executed: Vec<TaskType> = harness
        .orchestrator
        .executed()
        .iter()
        .map(|task| task.task_type())
        .collect();
    assert_eq!(executed.len(), 4);
    assert!(executed.contains(&TaskType::SecurityReview));
    assert!(executed.contains(&TaskType::DeploymentCheck));

    let comments = harness.github.comments_on(NUMBER);
    assert!(comments.first().is_some_and(|body| body.starts_with("Processing started: 4 tasks queued.")));
    assert!(comments.iter().any(|body| body.contains("All tests passed.")));
    assert!(comments.iter().any(|body| body.contains("Ready to deploy.")));
    assert!(comments.last().is_some_and(|body| body.contains("Completed 4/4 tasks (0 failed)")));

    let states: Vec<CommitState> = harness.github.statuses().into_iter().map(|(_, status)| status.state).collect();
    assert_eq!(states, vec![CommitState::Pending, CommitState::Success]);
    assert!(harness.github.labels_on(NUMBER).is_empty());

    let context = service
        .context(&repository(), NUMBER)
        .unwrap_or_else(|| panic!("context should be recorded"));
    assert_eq!(context.status, PrStatus::Completed);
    assert_eq!(context.analysis.source, AnalysisSource::Heuristic);
    assert_eq!(context.analysis.risk_level, RiskLevel::High);
    assert_eq!(context.summary.as_deref(), Some("Completed 4/4 tasks (0 failed)"));
}

#[rstest]
#[tokio::test]
async fn blocking_security_findings_fail_the_check_and_label() {
    let output = TaskOutput::with_summary("1 problem")
        .with_finding(Finding::new("token logged in plain text").with_severity("high"))
        .blocking();
    let harness = Harness::new(
        InMemoryGitHub::new().with_files(NUMBER, sensitive_files()),
        ScriptedAi::new(),
        InMemoryOrchestrator::new().with_outcome(TaskType::SecurityReview, ScriptedOutcome::Succeed(output)),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());

    let status = service
        .process_pull_request(&pull_request(), &repository(), None)
        .await;

    assert_eq!(status, Some(PrStatus::Completed));
    let comments = harness.github.comments_on(NUMBER);
    assert!(comments.iter().any(|body| body.starts_with("### Security alert")));
    assert_eq!(
        harness.github.statuses().last().map(|(_, status)| status.state),
        Some(CommitState::Failure)
    );
    assert_eq!(harness.github.labels_on(NUMBER), vec!["security-review-needed".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn scripted_ai_analysis_replaces_heuristics() {
    let analysis = PrAnalysis {
        requires_security_review: false,
        requires_code_review: true,
        requires_testing: false,
        requires_documentation: false,
        requires_performance_review: false,
        requires_deployment_check: false,
        risk_level: RiskLevel::Low,
        summary: "cosmetic".to_owned(),
        source: AnalysisSource::Ai,
    };
    let findings = TaskOutput::with_summary("nits").with_finding(Finding::new("long function"));
    let harness = Harness::new(
        InMemoryGitHub::new().with_files(NUMBER, sensitive_files()),
        ScriptedAi::new()
            .with_pull_request_analysis(analysis)
            .with_review_comment("Consider splitting `login` into smaller steps."),
        InMemoryOrchestrator::new().with_outcome(TaskType::CodeReview, ScriptedOutcome::Succeed(findings)),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());

    service
        .process_pull_request(&pull_request(), &repository(), None)
        .await;

    let executed: Vec<TaskType> = harness.orchestrator.executed().iter().map(|task| task.task_type()).collect();
    assert_eq!(executed, vec![TaskType::CodeReview]);
    assert!(harness.github.comments_on(NUMBER).iter().any(|body| {
        body == "### Review suggestions\n\nConsider splitting `login` into smaller steps."
    }));
    assert_eq!(harness.ai.calls(), 2);
}

#[rstest]
#[tokio::test]
async fn drafts_are_skipped(harness: Harness) {
    let service = harness.pull_requests(ShutdownHandle::detached());
    let mut draft = pull_request();
    draft.draft = true;

    service
        .handle_event(&PullRequestAction::Opened, &draft, &repository(), None)
        .await;

    assert_eq!(harness.github.calls(), 0);
    assert!(service.context(&repository(), NUMBER).is_none());
}

#[rstest]
#[tokio::test]
async fn disabled_agents_skip_processing(harness: Harness) {
    harness.agents.set_enabled(false);
    let service = harness.pull_requests(ShutdownHandle::detached());

    let status = service
        .process_pull_request(&pull_request(), &repository(), None)
        .await;

    assert_eq!(status, None);
    assert!(harness.github.comments().is_empty());
    assert!(harness.orchestrator.executed().is_empty());
}

#[rstest]
#[tokio::test]
async fn github_failure_is_reported_on_the_pull_request(harness: Harness) {
    harness.github.fail_next(GitHubError::NotFound("pull request files".to_owned()));
    let service = harness.pull_requests(ShutdownHandle::detached());

    let status = service
        .process_pull_request(&pull_request(), &repository(), None)
        .await;

    assert_eq!(status, Some(PrStatus::Failed));
    let comments = harness.github.comments_on(NUMBER);
    assert_eq!(comments.len(), 1);
    assert!(comments.iter().all(|body| body.starts_with("Forgewatch could not finish processing")));
    assert!(harness.orchestrator.executed().is_empty());
}

#[rstest]
#[tokio::test]
async fn closing_cancels_in_flight_tasks() {
    let harness = Harness::new(
        InMemoryGitHub::new().with_files(NUMBER, vec![ChangedFile::modified("src/auth/login.rs", 4, 0)]),
        ScriptedAi::new(),
        InMemoryOrchestrator::new().with_outcome(TaskType::SecurityReview, delayed(200)),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());
    let pr = pull_request();
    let repo = repository();

    let (status, ()) = tokio::join!(service.process_pull_request(&pr, &repo, None), async {
        tokio::time::sleep(Duration::from_millis(40)).await;
        service
            .handle_event(&PullRequestAction::Closed, &pr, &repo, None)
            .await;
    });

    assert_eq!(status, Some(PrStatus::Completed));
    assert_eq!(harness.orchestrator.cancelled().len(), 1);
    assert!(service.context(&repo, NUMBER).is_none());
    assert!(
        harness
            .github
            .comments_on(NUMBER)
            .iter()
            .any(|body| body.contains("task cancelled"))
    );
}

#[rstest]
#[tokio::test]
async fn converting_to_draft_pauses_in_flight_tasks() {
    let harness = Harness::new(
        InMemoryGitHub::new().with_files(NUMBER, vec![ChangedFile::modified("src/widgets.rs", 4, 0)]),
        ScriptedAi::new(),
        InMemoryOrchestrator::new()
            .with_outcome(TaskType::CodeReview, delayed(200))
            .with_outcome(TaskType::Testing, delayed(200)),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());
    let pr = pull_request();
    let repo = repository();

    tokio::join!(service.process_pull_request(&pr, &repo, None), async {
        tokio::time::sleep(Duration::from_millis(40)).await;
        service
            .handle_event(&PullRequestAction::ConvertedToDraft, &pr, &repo, None)
            .await;
    });

    assert_eq!(harness.orchestrator.paused().len(), 2);
    assert_eq!(
        harness.github.statuses().last().map(|(_, status)| status.state),
        Some(CommitState::Failure)
    );
}

#[rstest]
#[tokio::test]
async fn rescan_processes_open_pull_requests_once() {
    let mut draft = PullRequest::new(8, "WIP", "fff000");
    draft.draft = true;
    let harness = Harness::new(
        InMemoryGitHub::new()
            .with_files(NUMBER, sensitive_files())
            .with_open_pull_request(pull_request())
            .with_open_pull_request(draft),
        ScriptedAi::new(),
        InMemoryOrchestrator::new(),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());

    let first = service.rescan_open_pull_requests(&repository()).await;
    let second = service.rescan_open_pull_requests(&repository()).await;

    assert_eq!(first, 1);
    assert_eq!(second, 0);
}

#[rstest]
#[tokio::test]
async fn rescan_stops_once_shutdown_begins(harness: Harness) {
    let coordinator = ShutdownCoordinator::new(
        Arc::new(QueueShutdownHooks::new(Arc::new(InMemoryWebhookQueue::new(1)))),
        Duration::from_secs(1),
    );
    let service = harness.pull_requests(coordinator.handle());

    let outcome = coordinator.shutdown(ShutdownReason::Terminate).await;
    let processed = service.rescan_open_pull_requests(&repository()).await;

    assert!(outcome.is_some());
    assert_eq!(processed, 0);
    assert_eq!(harness.github.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn status_command_reports_the_context(harness: Harness) {
    let service = harness.pull_requests(ShutdownHandle::detached());
    let ask = Comment::new(1, "maintainer", "/status");

    let before = service.handle_command(NUMBER, &ask, &repository(), None).await;
    service
        .process_pull_request(&pull_request(), &repository(), None)
        .await;
    let after = service.handle_command(NUMBER, &ask, &repository(), None).await;

    assert_eq!(before, Some(PrCommand::Status));
    assert_eq!(after, Some(PrCommand::Status));
    let comments = harness.github.comments_on(NUMBER);
    assert!(comments.first().is_some_and(|body| body.starts_with("No analysis has been recorded")));
    assert!(comments.last().is_some_and(|body| body.starts_with("Status: **completed**, risk high")));
}

#[rstest]
#[tokio::test]
async fn single_task_commands_delegate_one_task(harness: Harness) {
    let service = harness.pull_requests(ShutdownHandle::detached());

    service
        .handle_command(NUMBER, &Comment::new(1, "maintainer", "/security-review"), &repository(), None)
        .await;
    service
        .handle_command(NUMBER, &Comment::new(2, "maintainer", "/rerun-tests"), &repository(), None)
        .await;

    let executed: Vec<TaskType> = harness.orchestrator.executed().iter().map(|task| task.task_type()).collect();
    assert_eq!(executed, vec![TaskType::SecurityReview, TaskType::Testing]);
    let comments = harness.github.comments_on(NUMBER);
    assert!(comments.first().is_some_and(|body| body.contains("Completed 1/1 tasks")));
    assert!(comments.last().is_some_and(|body| body.contains("All tests passed.")));
}

#[rstest]
#[case("/security-review", TaskType::SecurityReview, TaskPriority::High, "### Security alert")]
#[case("/performance-check", TaskType::PerformanceReview, TaskPriority::Medium, "### Performance alert")]
#[tokio::test]
async fn review_commands_post_their_alert(
    #[case] body: &str,
    #[case] task_type: TaskType,
    #[case] priority: TaskPriority,
    #[case] heading: &str,
) {
    let output = TaskOutput::with_summary("1 finding")
        .with_finding(Finding::new("hot loop allocates per request").with_severity("medium"));
    let harness = Harness::new(
        InMemoryGitHub::new(),
        ScriptedAi::new(),
        InMemoryOrchestrator::new().with_outcome(task_type, ScriptedOutcome::Succeed(output)),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());

    let parsed = service
        .handle_command(NUMBER, &Comment::new(1, "maintainer", body), &repository(), None)
        .await;

    assert!(parsed.is_some());
    let executed: Vec<(TaskType, TaskPriority)> = harness
        .orchestrator
        .executed()
        .iter()
        .map(|task| (task.task_type(), task.priority()))
        .collect();
    assert_eq!(executed, vec![(task_type, priority)]);
    assert_eq!(harness.github.comments_on(NUMBER).len(), 1);
    assert!(
        harness
            .github
            .comments_on(NUMBER)
            .first()
            .is_some_and(|comment| comment.starts_with(heading)
                && comment.contains("hot loop allocates per request"))
    );
}

#[rstest]
#[tokio::test]
async fn create_issue_command_opens_a_follow_up(harness: Harness) {
    let service = harness.pull_requests(ShutdownHandle::detached());
    let comment = Comment::new(1, "maintainer", "/create-issue Flaky login test");

    let command = service.handle_command(NUMBER, &comment, &repository(), None).await;

    assert_eq!(command, Some(PrCommand::CreateIssue));
    let created = harness.github.created_issues();
    assert_eq!(created.len(), 1);
    assert!(created.iter().all(|issue| issue.title == "Flaky login test"
        && issue.labels == vec!["follow-up".to_owned()]
        && issue.body.contains("@maintainer")));
    assert_eq!(harness.github.comments_on(NUMBER), vec!["Created issue #1001.".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn unknown_command_replies_with_help(harness: Harness) {
    let service = harness.pull_requests(ShutdownHandle::detached());

    let command = service
        .handle_command(NUMBER, &Comment::new(1, "maintainer", "/ship-it"), &repository(), None)
        .await;

    assert_eq!(command, Some(PrCommand::Unknown("ship-it".to_owned())));
    let comments = harness.github.comments_on(NUMBER);
    assert!(comments.iter().all(|body| body.contains("`/full-review`")));
    assert_eq!(comments.len(), 1);
}

#[rstest]
#[tokio::test]
async fn full_review_loads_an_unknown_pull_request() {
    let harness = Harness::new(
        InMemoryGitHub::new()
            .with_files(NUMBER, sensitive_files())
            .with_open_pull_request(pull_request()),
        ScriptedAi::new(),
        InMemoryOrchestrator::new(),
    );
    let service = harness.pull_requests(ShutdownHandle::detached());

    service
        .handle_command(NUMBER, &Comment::new(1, "maintainer", "/full-review"), &repository(), None)
        .await;

    assert!(service.context(&repository(), NUMBER).is_some());
    assert_eq!(harness.orchestrator.executed().len(), 4);
}
