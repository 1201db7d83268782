//! Pull request workflow engine.

use super::{WorkflowDeps, WorkflowError, WorkflowResult};
use crate::delegation::domain::{DelegationContext, Task, TaskResult, TaskType};
use crate::runtime::services::ShutdownHandle;
use crate::workflow::{
    domain::{
        AnalysisSource, ChangedFile, Comment, ContextKey, ContextStore, FinalReport, PrAnalysis, PrCommand,
        PrContext, PrStatus, PullRequest, PullRequestAction, Repository, check_fails, help_text,
        parse_command, pr_rule, type_comment,
    },
    ports::{CommitState, CommitStatus, NewIssue},
};
use mockable::Clock;
use serde_json::{Value, json};

const REPORT_TITLE: &str = "Forgewatch review";

/// Drives pull requests from webhook to final report.
pub struct PrWorkflowService<C>
where
    C: Clock + Send + Sync,
{
    deps: WorkflowDeps<C>,
    shutdown: ShutdownHandle,
    contexts: ContextStore<PrContext>,
}

impl<C> PrWorkflowService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates the engine.
    #[must_use]
    pub fn new(deps: WorkflowDeps<C>, shutdown: ShutdownHandle) -> Self {
        Self {
            deps,
            shutdown,
            contexts: ContextStore::new(),
        }
    }

    /// Returns the live context of a pull request.
    #[must_use]
    pub fn context(&self, repository: &Repository, number: u64) -> Option<PrContext> {
        self.contexts.get(&ContextKey::new(repository, number))
    }

    /// Routes a `pull_request` webhook action.
    pub async fn handle_event(
        &self,
        action: &PullRequestAction,
        pull_request: &PullRequest,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) {
        let key = ContextKey::new(repository, pull_request.number);
        match action {
            PullRequestAction::Opened | PullRequestAction::Synchronize if pull_request.draft => {
                tracing::info!(pull_request = %key, "skipping draft pull request");
            }
            PullRequestAction::Opened
            | PullRequestAction::Synchronize
            | PullRequestAction::ReadyForReview => {
                self.process_pull_request(pull_request, repository, delivery_id)
                    .await;
            }
            PullRequestAction::Closed => self.close(&key).await,
            PullRequestAction::ConvertedToDraft => self.pause(&key).await,
            PullRequestAction::Other(other) => {
                tracing::debug!(pull_request = %key, action = %other, "ignoring pull request action");
            }
        }
    }

    /// Analyses a pull request, delegates its tasks, and posts the report.
    ///
    /// Returns the settled context status, or `None` when agents are
    /// disabled. Pipeline errors are logged, posted to the pull request,
    /// and mark the context failed.
    pub async fn process_pull_request(
        &self,
        pull_request: &PullRequest,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> Option<PrStatus> {
        let key = ContextKey::new(repository, pull_request.number);
        if !self.deps.agents.is_enabled() {
            tracing::info!(pull_request = %key, "agents disabled, skipping pull request");
            return None;
        }
        let context = delegation_context(&key, delivery_id);

        match self
            .run_pipeline(pull_request, repository, &key, &context)
            .await
        {
            Ok(report) => {
                let now = self.deps.clock.utc();
                self.contexts.update(&key, |record| {
                    record.settle(PrStatus::Completed, now);
                    record.summary = Some(report.summary.clone());
                });
                tracing::info!(pull_request = %key, summary = %report.summary, "pull request processed");
                Some(PrStatus::Completed)
            }
            Err(error) => {
                tracing::error!(
                    pull_request = %key,
                    delivery = delivery_id.unwrap_or_default(),
                    %error,
                    "pull request processing failed"
                );
                self.post_error(repository, pull_request.number, &error)
                    .await;
                let now = self.deps.clock.utc();
                self.contexts.update(&key, |record| {
                    record.settle(PrStatus::Failed, now);
                });
                Some(PrStatus::Failed)
            }
        }
    }

    /// Re-processes open pull requests that have no live context.
    ///
    /// Returns the number processed. Does nothing once shutdown has begun.
    pub async fn rescan_open_pull_requests(&self, repository: &Repository) -> usize {
        if self.shutdown.is_shutting_down() {
            tracing::info!(%repository, "shutting down, skipping pull request rescan");
            return 0;
        }
        let open = match self.deps.github.list_open_pull_requests(repository).await {
            Ok(open) => open,
            Err(error) => {
                tracing::warn!(%repository, %error, "failed to list open pull requests");
                return 0;
            }
        };

        let mut processed = 0;
        for pull_request in open.iter().filter(|pull_request| !pull_request.draft) {
            if self.shutdown.is_shutting_down() {
                break;
            }
            if self
                .contexts
                .contains(&ContextKey::new(repository, pull_request.number))
            {
                continue;
            }
            self.process_pull_request(pull_request, repository, None)
                .await;
            processed += 1;
        }
        processed
    }

    /// Executes a slash command found in a pull request comment.
    ///
    /// Returns the parsed command, or `None` when the comment has none.
    pub async fn handle_command(
        &self,
        number: u64,
        comment: &Comment,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> Option<PrCommand> {
        let invocation = parse_command::<PrCommand>(&comment.body)?;
        let key = ContextKey::new(repository, number);
        tracing::info!(
            pull_request = %key,
            command = %invocation.action,
            author = %comment.author,
            "pull request command"
        );

        let outcome = self
            .run_command(
                &invocation.action,
                invocation.args.as_deref(),
                number,
                comment,
                repository,
                delivery_id,
            )
            .await;
        if let Err(error) = outcome {
            tracing::warn!(pull_request = %key, command = %invocation.action, %error, "command failed");
            self.post_error(repository, number, &error).await;
        }
        Some(invocation.action)
    }

    async fn run_pipeline(
        &self,
        pull_request: &PullRequest,
        repository: &Repository,
        key: &ContextKey,
        context: &DelegationContext,
    ) -> WorkflowResult<FinalReport> {
        let (analysis, files) = self.analyze(pull_request, repository).await?;
        self.contexts.insert(
            key.clone(),
            PrContext::processing(
                pull_request.clone(),
                repository.clone(),
                analysis.clone(),
                self.deps.clock.utc(),
            ),
        );

        let payload = task_payload(pull_request, repository, Some(&analysis), &files);
        let tasks = analysis.generate_tasks(&payload);
        self.report_started(pull_request, repository, &tasks).await?;

        let results = self.deps.delegator.delegate_tasks(tasks, context).await;
        self.process_results(pull_request, repository, &results)
            .await?;
        self.update_pr_status(pull_request, repository, &results)
            .await?;
        self.publish_final_report(pull_request.number, repository, &results)
            .await
    }

    async fn analyze(
        &self,
        pull_request: &PullRequest,
        repository: &Repository,
    ) -> WorkflowResult<(PrAnalysis, Vec<ChangedFile>)> {
        let files = self
            .deps
            .github
            .list_pull_request_files(repository, pull_request.number)
            .await?;
        let analysis = self
            .deps
            .ai
            .analyze_pull_request(pull_request, &files)
            .await
            .unwrap_or_else(|error| {
                tracing::info!(
                    pull_request = pull_request.number,
                    %error,
                    "AI analysis unavailable, using heuristics"
                );
                PrAnalysis::heuristic(pull_request, &files)
            });
        Ok((analysis, files))
    }

    async fn report_started(
        &self,
        pull_request: &PullRequest,
        repository: &Repository,
        tasks: &[Task],
    ) -> WorkflowResult<()> {
        let status = CommitStatus::new(
            CommitState::Pending,
            format!("Running {} review tasks", tasks.len()),
        );
        self.deps
            .github
            .set_commit_status(repository, &pull_request.head_sha, &status)
            .await?;
        let queued: Vec<String> = tasks
            .iter()
            .map(|task| format!("- {} ({})", task.task_type(), task.priority()))
            .collect();
        let body = format!(
            "Processing started: {} tasks queued.\n\n{}",
            tasks.len(),
            queued.join("\n")
        );
        self.deps
            .github
            .create_comment(repository, pull_request.number, &body)
            .await?;
        Ok(())
    }

    async fn process_results(
        &self,
        pull_request: &PullRequest,
        repository: &Repository,
        results: &[TaskResult],
    ) -> WorkflowResult<()> {
        for result in results {
            let body = if result.task_type() == TaskType::CodeReview {
                self.review_suggestions(pull_request, result).await
            } else {
                type_comment(result)
            };
            if let Some(body) = body {
                self.deps
                    .github
                    .create_comment(repository, pull_request.number, &body)
                    .await?;
            }
        }
        Ok(())
    }

    async fn review_suggestions(
        &self,
        pull_request: &PullRequest,
        result: &TaskResult,
    ) -> Option<String> {
        if result.findings().is_empty() {
            return None;
        }
        match self
            .deps
            .ai
            .generate_review_comment(pull_request, result.findings())
            .await
        {
            Ok(prose) => Some(format!("### Review suggestions\n\n{prose}")),
            Err(error) => {
                tracing::debug!(%error, "AI review prose unavailable, listing findings");
                type_comment(result)
            }
        }
    }

    /// Sets the final commit status: failure when any result failed or is
    /// blocking, success otherwise.
    async fn update_pr_status(
        &self,
        pull_request: &PullRequest,
        repository: &Repository,
        results: &[TaskResult],
    ) -> WorkflowResult<()> {
        let passed = results.iter().filter(|result| !result.is_failed()).count();
        let state = if check_fails(results) {
            CommitState::Failure
        } else {
            CommitState::Success
        };
        let status = CommitStatus::new(
            state,
            format!("{passed} of {} review tasks passed", results.len()),
        );
        self.deps
            .github
            .set_commit_status(repository, &pull_request.head_sha, &status)
            .await?;
        Ok(())
    }

    async fn publish_final_report(
        &self,
        number: u64,
        repository: &Repository,
        results: &[TaskResult],
    ) -> WorkflowResult<FinalReport> {
        let report = FinalReport::from_results(REPORT_TITLE, results);
        self.deps
            .github
            .create_comment(repository, number, &report.render()?)
            .await?;
        if !report.labels.is_empty() {
            self.deps
                .github
                .add_labels(repository, number, &report.labels)
                .await?;
        }
        Ok(report)
    }

    async fn run_command(
        &self,
        action: &PrCommand,
        args: Option<&str>,
        number: u64,
        comment: &Comment,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> WorkflowResult<()> {
        let key = ContextKey::new(repository, number);
        match action {
            PrCommand::RerunTests => {
                self.run_single(TaskType::Testing, number, repository, delivery_id)
                    .await
            }
            PrCommand::SecurityReview => {
                self.run_single(TaskType::SecurityReview, number, repository, delivery_id)
                    .await
            }
            PrCommand::PerformanceCheck => {
                self.run_single(TaskType::PerformanceReview, number, repository, delivery_id)
                    .await
            }
            PrCommand::FullReview => self.full_review(&key, number, repository, delivery_id).await,
            PrCommand::Status => {
                let body = self.contexts.get(&key).map_or_else(
                    || "No analysis has been recorded for this pull request yet.".to_owned(),
                    |record| status_line(&record),
                );
                self.reply(repository, number, &body).await
            }
            PrCommand::CreateIssue => {
                self.create_follow_up(args, number, comment, repository)
                    .await
            }
            PrCommand::Unknown(name) => {
                self.reply(repository, number, &help_text::<PrCommand>(name))
                    .await
            }
        }
    }

    async fn run_single(
        &self,
        task_type: TaskType,
        number: u64,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> WorkflowResult<()> {
        let Some(rule) = pr_rule(task_type) else {
            return Ok(());
        };
        if !self.deps.agents.is_enabled() {
            return self
                .reply(repository, number, "Agents are currently disabled.")
                .await;
        }
        let key = ContextKey::new(repository, number);
        let payload = self.contexts.get(&key).map_or_else(
            || json!({ "repository": repository.full_name(), "pull_request": number }),
            |record| task_payload(&record.pull_request, repository, Some(&record.analysis), &[]),
        );
        let result = self
            .deps
            .delegator
            .delegate_task(rule.build(payload), &delegation_context(&key, delivery_id))
            .await;
        let body = type_comment(&result).map_or_else(
            || FinalReport::from_results(REPORT_TITLE, std::slice::from_ref(&result)).render(),
            Ok,
        )?;
        self.reply(repository, number, &body).await
    }

    async fn full_review(
        &self,
        key: &ContextKey,
        number: u64,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> WorkflowResult<()> {
        let mut known = self.contexts.get(key).map(|record| record.pull_request);
        if known.is_none() {
            known = self
                .deps
                .github
                .list_open_pull_requests(repository)
                .await?
                .into_iter()
                .find(|pull_request| pull_request.number == number);
        }
        let Some(pull_request) = known else {
            return Err(WorkflowError::MissingContext(key.clone()));
        };
        self.process_pull_request(&pull_request, repository, delivery_id)
            .await;
        Ok(())
    }

    async fn create_follow_up(
        &self,
        args: Option<&str>,
        number: u64,
        comment: &Comment,
        repository: &Repository,
    ) -> WorkflowResult<()> {
        let Some(title) = args else {
            return self
                .reply(repository, number, "Usage: `/create-issue <title>`")
                .await;
        };
        let issue = NewIssue {
            title: title.to_owned(),
            body: format!(
                "Follow-up from #{number}, requested by @{}.",
                comment.author
            ),
            labels: vec!["follow-up".to_owned()],
        };
        let created = self.deps.github.create_issue(repository, &issue).await?;
        self.reply(repository, number, &format!("Created issue #{created}."))
            .await
    }

    async fn close(&self, key: &ContextKey) {
        if self.contexts.remove(key).is_none() {
            tracing::debug!(pull_request = %key, "closed pull request had no context");
        }
        for task_id in self.deps.delegator.active_tasks_for(key.as_str()) {
            if let Err(error) = self.deps.delegator.cancel_task(task_id).await {
                tracing::warn!(pull_request = %key, %task_id, %error, "failed to cancel task");
            }
        }
        tracing::info!(pull_request = %key, "pull request closed, context dropped");
    }

    async fn pause(&self, key: &ContextKey) {
        let active = self.deps.delegator.active_tasks_for(key.as_str());
        if active.is_empty() {
            return;
        }
        match self.deps.delegator.pause_tasks(&active).await {
            Ok(()) => tracing::info!(pull_request = %key, paused = active.len(), "paused tasks for draft"),
            Err(error) => tracing::warn!(pull_request = %key, %error, "failed to pause tasks"),
        }
    }

    async fn reply(&self, repository: &Repository, number: u64, body: &str) -> WorkflowResult<()> {
        self.deps
            .github
            .create_comment(repository, number, body)
            .await?;
        Ok(())
    }

    async fn post_error(&self, repository: &Repository, number: u64, error: &WorkflowError) {
        let body = format!("Forgewatch could not finish processing: {error}");
        if let Err(post_error) = self
            .deps
            .github
            .create_comment(repository, number, &body)
            .await
        {
            tracing::warn!(number, error = %post_error, "failed to post error comment");
        }
    }
}

fn delegation_context(key: &ContextKey, delivery_id: Option<&str>) -> DelegationContext {
    let context = DelegationContext::new(key.as_str());
    if let Some(delivery_id) = delivery_id {
        return context.with_delivery_id(delivery_id);
    }
    context
}

fn task_payload(
    pull_request: &PullRequest,
    repository: &Repository,
    analysis: Option<&PrAnalysis>,
    files: &[ChangedFile],
) -> Value {
    let mut payload = json!({
        "repository": repository.full_name(),
        "pull_request": pull_request.number,
        "title": pull_request.title,
        "head_sha": pull_request.head_sha,
        "base_ref": pull_request.base_ref,
    });
    if let (Some(analysis), Some(fields)) = (analysis, payload.as_object_mut()) {
        let names: Vec<&str> = files.iter().map(|file| file.filename.as_str()).collect();
        fields.insert("files".to_owned(), json!(names));
        fields.insert("risk_level".to_owned(), json!(analysis.risk_level));
        fields.insert("summary".to_owned(), json!(analysis.summary));
    }
    payload
}

fn status_line(record: &PrContext) -> String {
    let summary = record
        .summary
        .as_deref()
        .map(|summary| format!("\n\nLast report: {summary}"))
        .unwrap_or_default();
    format!(
        "Status: **{}**, risk {} (analysis by {}), updated {}.{summary}",
        record.status,
        record.analysis.risk_level,
        match record.analysis.source {
            AnalysisSource::Ai => "AI",
            AnalysisSource::Heuristic => "heuristics",
        },
        record.updated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}
