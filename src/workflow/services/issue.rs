//! Issue workflow engine.

use super::{WorkflowDeps, WorkflowError, WorkflowResult};
use crate::delegation::domain::{AgentType, DelegationContext, TaskResult};
use crate::workflow::{
    domain::{
        Comment, ContextKey, ContextStore, FinalReport, ISSUE_CODE_RULE, ISSUE_DOCS_RULE, Issue,
        IssueAction, IssueAnalysis, IssueCommand, IssueContext, IssueStatus, IssueType,
        POSSIBLE_DUPLICATE_LABEL, Repository, TaskRule, TitleSimilarity, analyze_issue, help_text,
        parse_command, parse_reference, search_prefix,
    },
    ports::GitHubResult,
};
use mockable::Clock;
use serde_json::{Value, json};

const RESULTS_TITLE: &str = "Automation results";

/// Issue suspected to duplicate the one being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCandidate {
    /// Existing issue number.
    pub number: u64,
    /// Existing issue title.
    pub title: String,
    /// Title similarity.
    pub similarity: TitleSimilarity,
}

/// Classifies, triages, and automates issues.
pub struct IssueWorkflowService<C>
where
    C: Clock + Send + Sync,
{
    deps: WorkflowDeps<C>,
    contexts: ContextStore<IssueContext>,
}

impl<C> IssueWorkflowService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates the engine.
    #[must_use]
    pub fn new(deps: WorkflowDeps<C>) -> Self {
        Self {
            deps,
            contexts: ContextStore::new(),
        }
    }

    /// Returns the live context of an issue.
    #[must_use]
    pub fn context(&self, repository: &Repository, number: u64) -> Option<IssueContext> {
        self.contexts.get(&ContextKey::new(repository, number))
    }

    /// Routes an `issues` webhook action.
    pub async fn handle_event(
        &self,
        action: &IssueAction,
        issue: &Issue,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) {
        let key = ContextKey::new(repository, issue.number);
        match action {
            IssueAction::Opened | IssueAction::Reopened => {
                self.process_new_issue(issue, repository, delivery_id)
                    .await;
            }
            IssueAction::Edited if self.contexts.contains(&key) => {
                if let Err(error) = self.retriage(issue, repository).await {
                    self.report_failure(&key, issue.number, repository, delivery_id, &error)
                        .await;
                }
            }
            IssueAction::Edited => {
                self.process_new_issue(issue, repository, delivery_id)
                    .await;
            }
            IssueAction::Closed => self.close(&key).await,
            IssueAction::Other(other) => {
                tracing::debug!(issue = %key, action = %other, "ignoring issue action");
            }
        }
    }

    /// Runs the new-issue pipeline: classify, triage, look for duplicates,
    /// and delegate automation tasks.
    ///
    /// Returns the resulting status, or `None` when the pipeline failed; the
    /// failure is logged and posted to the issue.
    pub async fn process_new_issue(
        &self,
        issue: &Issue,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> Option<IssueStatus> {
        let key = ContextKey::new(repository, issue.number);
        let analysis = self.analyze(issue).await;
        self.contexts.insert(
            key.clone(),
            IssueContext::new(
                issue.clone(),
                repository.clone(),
                analysis,
                self.deps.clock.utc(),
            ),
        );

        match self.run_pipeline(&key, issue, repository, delivery_id).await {
            Ok(status) => {
                tracing::info!(issue = %key, %status, "issue processed");
                Some(status)
            }
            Err(error) => {
                self.report_failure(&key, issue.number, repository, delivery_id, &error)
                    .await;
                None
            }
        }
    }

    /// Applies triage labels and posts the triage comment, plus an
    /// information request when details are missing.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the context is missing or a GitHub
    /// call fails.
    pub async fn triage_issue(&self, key: &ContextKey) -> WorkflowResult<()> {
        let record = self
            .contexts
            .get(key)
            .ok_or_else(|| WorkflowError::MissingContext(key.clone()))?;
        let analysis = &record.analysis;
        let number = record.issue.number;
        let repository = &record.repository;

        self.deps
            .github
            .add_labels(repository, number, &analysis.triage_labels())
            .await?;
        self.deps
            .github
            .create_comment(repository, number, &analysis.triage_comment()?)
            .await?;
        if analysis.needs_more_info {
            self.deps
                .github
                .create_comment(repository, number, analysis.information_request())
                .await?;
        }

        let now = self.deps.clock.utc();
        self.contexts.update(key, |record| {
            record.advance(IssueStatus::Triaged, now);
        });
        Ok(())
    }

    /// Finds open issues whose titles are more than 70% similar.
    ///
    /// # Errors
    ///
    /// Returns the GitHub error when the search fails.
    pub async fn find_duplicates(
        &self,
        issue: &Issue,
        repository: &Repository,
    ) -> GitHubResult<Vec<DuplicateCandidate>> {
        let found = self
            .deps
            .github
            .search_issues(repository, &search_prefix(&issue.title))
            .await?;
        Ok(found
            .into_iter()
            .filter(|candidate| candidate.number != issue.number)
            .filter_map(|candidate| {
                let similarity = TitleSimilarity::between(&issue.title, &candidate.title);
                similarity.is_duplicate().then(|| DuplicateCandidate {
                    number: candidate.number,
                    title: candidate.title,
                    similarity,
                })
            })
            .collect())
    }

    /// Executes a slash command found in an issue comment.
    ///
    /// Returns the parsed command, or `None` when the comment has none.
    pub async fn handle_command(
        &self,
        issue: &Issue,
        comment: &Comment,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> Option<IssueCommand> {
        let invocation = parse_command::<IssueCommand>(&comment.body)?;
        let key = ContextKey::new(repository, issue.number);
        tracing::info!(
            issue = %key,
            command = %invocation.action,
            author = %comment.author,
            "issue command"
        );

        let outcome = self
            .run_command(
                &invocation.action,
                invocation.args.as_deref(),
                issue,
                repository,
                delivery_id,
            )
            .await;
        if let Err(error) = outcome {
            self.report_failure(&key, issue.number, repository, delivery_id, &error)
                .await;
        }
        Some(invocation.action)
    }

    async fn run_pipeline(
        &self,
        key: &ContextKey,
        issue: &Issue,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> WorkflowResult<IssueStatus> {
        self.triage_issue(key).await?;
        self.flag_duplicates(issue, repository).await?;
        if self.deps.agents.is_enabled() {
            let record = self
                .contexts
                .get(key)
                .ok_or_else(|| WorkflowError::MissingContext(key.clone()))?;
            let tasks = record
                .analysis
                .generate_tasks(&task_payload(issue, repository, &record.analysis));
            if !tasks.is_empty() {
                let agent = tasks.first().map(|task| task.agent_type());
                let results = self
                    .deps
                    .delegator
                    .delegate_tasks(tasks, &delegation_context(key, delivery_id))
                    .await;
                self.mark_assigned(key, agent);
                self.post_results(repository, issue.number, &results)
                    .await?;
            }
        } else {
            tracing::info!(issue = %key, "agents disabled, skipping automation tasks");
        }
        self.contexts
            .get(key)
            .map(|record| record.status)
            .ok_or_else(|| WorkflowError::MissingContext(key.clone()))
    }

    async fn analyze(&self, issue: &Issue) -> IssueAnalysis {
        let mut analysis = analyze_issue(&issue.text(), &issue.labels);
        match self.deps.ai.analyze_issue(issue).await {
            Ok(insights) if !insights.suggested_approach.is_empty() => {
                analysis.suggested_approach = insights.suggested_approach;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(issue = issue.number, %error, "AI insights unavailable");
            }
        }
        analysis
    }

    async fn retriage(&self, issue: &Issue, repository: &Repository) -> WorkflowResult<()> {
        let key = ContextKey::new(repository, issue.number);
        let analysis = self.analyze(issue).await;
        let now = self.deps.clock.utc();
        self.contexts.update(&key, |record| {
            record.issue = issue.clone();
            record.analysis = analysis;
            record.updated_at = now;
        });
        self.triage_issue(&key).await
    }

    async fn flag_duplicates(&self, issue: &Issue, repository: &Repository) -> WorkflowResult<()> {
        let duplicates = self.find_duplicates(issue, repository).await?;
        if duplicates.is_empty() {
            return Ok(());
        }
        let listing: Vec<String> = duplicates
            .iter()
            .map(|candidate| {
                format!(
                    "- #{} {} ({}% similar)",
                    candidate.number,
                    candidate.title,
                    candidate.similarity.percent()
                )
            })
            .collect();
        let body = format!(
            "This issue may duplicate:\n\n{}\n\nIf so, comment `/duplicate <number>`.",
            listing.join("\n")
        );
        self.deps
            .github
            .create_comment(repository, issue.number, &body)
            .await?;
        self.deps
            .github
            .add_labels(
                repository,
                issue.number,
                &[POSSIBLE_DUPLICATE_LABEL.to_owned()],
            )
            .await?;
        Ok(())
    }

    async fn run_command(
        &self,
        action: &IssueCommand,
        args: Option<&str>,
        issue: &Issue,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> WorkflowResult<()> {
        let number = issue.number;
        match action {
            IssueCommand::Triage => {
                if self.context(repository, number).is_some() {
                    self.retriage(issue, repository).await
                } else {
                    let analysis = self.analyze(issue).await;
                    let key = self.track(issue, repository, analysis);
                    self.triage_issue(&key).await
                }
            }
            IssueCommand::Estimate => {
                let record = self.ensure_context(issue, repository).await;
                let analysis = &record.analysis;
                let body = format!(
                    "Complexity: **{}**. Estimated effort: **{}h** ({}).",
                    analysis.complexity,
                    analysis.estimated_hours,
                    analysis.size()
                );
                self.reply(repository, number, &body).await
            }
            IssueCommand::AssignAgent => self.assign_agent(args, issue, repository).await,
            IssueCommand::GenerateCode => {
                self.generate(ISSUE_CODE_RULE, issue, repository, delivery_id)
                    .await
            }
            IssueCommand::GenerateDocs => {
                self.generate(ISSUE_DOCS_RULE, issue, repository, delivery_id)
                    .await
            }
            IssueCommand::LinkPr => self.link_pull_request(args, issue, repository).await,
            IssueCommand::Duplicate => self.mark_duplicate(args, issue, repository).await,
            IssueCommand::Status => {
                let body = self.context(repository, number).map_or_else(
                    || "This issue has not been processed yet.".to_owned(),
                    |record| status_line(&record),
                );
                self.reply(repository, number, &body).await
            }
            IssueCommand::Unknown(name) => {
                self.reply(repository, number, &help_text::<IssueCommand>(name))
                    .await
            }
        }
    }

    async fn assign_agent(
        &self,
        args: Option<&str>,
        issue: &Issue,
        repository: &Repository,
    ) -> WorkflowResult<()> {
        let record = self.ensure_context(issue, repository).await;
        let requested = args.and_then(|args| args.split_whitespace().next());
        let agent = match requested {
            Some(name) => match AgentType::try_from(name) {
                Ok(agent) => agent,
                Err(error) => {
                    let valid: Vec<&str> = AgentType::ALL.iter().map(|agent| agent.as_str()).collect();
                    let body = format!("{error}. Valid agents: {}.", valid.join(", "));
                    return self.reply(repository, issue.number, &body).await;
                }
            },
            None => default_agent(record.analysis.issue_type),
        };

        self.mark_assigned(&record.key, Some(agent));
        self.deps
            .github
            .add_labels(repository, issue.number, &[format!("agent-{agent}")])
            .await?;
        self.reply(
            repository,
            issue.number,
            &format!("Assigned to the **{agent}** agent pool."),
        )
        .await
    }

    async fn generate(
        &self,
        rule: TaskRule,
        issue: &Issue,
        repository: &Repository,
        delivery_id: Option<&str>,
    ) -> WorkflowResult<()> {
        if !self.deps.agents.is_enabled() {
            return self
                .reply(repository, issue.number, "Agents are currently disabled.")
                .await;
        }
        let record = self.ensure_context(issue, repository).await;
        let task = rule.build(task_payload(issue, repository, &record.analysis));
        let agent = task.agent_type();
        let result = self
            .deps
            .delegator
            .delegate_task(task, &delegation_context(&record.key, delivery_id))
            .await;
        self.mark_assigned(&record.key, Some(agent));
        self.post_results(repository, issue.number, std::slice::from_ref(&result))
            .await
    }

    async fn link_pull_request(
        &self,
        args: Option<&str>,
        issue: &Issue,
        repository: &Repository,
    ) -> WorkflowResult<()> {
        let Some(pull_request) = parse_reference(args) else {
            return self
                .reply(repository, issue.number, "Usage: `/link-pr <number>`")
                .await;
        };
        let record = self.ensure_context(issue, repository).await;
        self.contexts.update(&record.key, |record| {
            if !record.linked_pull_requests.contains(&pull_request) {
                record.linked_pull_requests.push(pull_request);
            }
        });
        self.reply(
            repository,
            issue.number,
            &format!("Linked pull request #{pull_request}."),
        )
        .await?;
        self.reply(
            repository,
            pull_request,
            &format!("Linked to issue #{}.", issue.number),
        )
        .await
    }

    async fn mark_duplicate(
        &self,
        args: Option<&str>,
        issue: &Issue,
        repository: &Repository,
    ) -> WorkflowResult<()> {
        let original = match parse_reference(args) {
            Some(original) if original != issue.number => original,
            _ => {
                return self
                    .reply(repository, issue.number, "Usage: `/duplicate <number>`")
                    .await;
            }
        };
        let record = self.ensure_context(issue, repository).await;
        self.contexts.update(&record.key, |record| {
            record.duplicate_of = Some(original);
        });
        self.deps
            .github
            .add_labels(repository, issue.number, &["duplicate".to_owned()])
            .await?;
        self.reply(
            repository,
            issue.number,
            &format!("Marked as a duplicate of #{original}."),
        )
        .await
    }

    async fn ensure_context(&self, issue: &Issue, repository: &Repository) -> IssueContext {
        if let Some(record) = self.context(repository, issue.number) {
            return record;
        }
        let analysis = self.analyze(issue).await;
        let record = IssueContext::new(
            issue.clone(),
            repository.clone(),
            analysis,
            self.deps.clock.utc(),
        );
        self.contexts.insert(record.key.clone(), record.clone());
        record
    }

    fn track(&self, issue: &Issue, repository: &Repository, analysis: IssueAnalysis) -> ContextKey {
        let record = IssueContext::new(
            issue.clone(),
            repository.clone(),
            analysis,
            self.deps.clock.utc(),
        );
        let key = record.key.clone();
        self.contexts.insert(key.clone(), record);
        key
    }

    fn mark_assigned(&self, key: &ContextKey, agent: Option<AgentType>) {
        let now = self.deps.clock.utc();
        self.contexts.update(key, |record| {
            if agent.is_some() {
                record.assigned_agent = agent;
            }
            record.advance(IssueStatus::Assigned, now);
        });
    }

    async fn post_results(
        &self,
        repository: &Repository,
        number: u64,
        results: &[TaskResult],
    ) -> WorkflowResult<()> {
        let report = FinalReport::from_results(RESULTS_TITLE, results);
        self.reply(repository, number, &report.render()?).await
    }

    async fn close(&self, key: &ContextKey) {
        if self.contexts.remove(key).is_none() {
            tracing::debug!(issue = %key, "closed issue had no context");
        }
        for task_id in self.deps.delegator.active_tasks_for(key.as_str()) {
            if let Err(error) = self.deps.delegator.cancel_task(task_id).await {
                tracing::warn!(issue = %key, %task_id, %error, "failed to cancel task");
            }
        }
        tracing::info!(issue = %key, "issue closed, context dropped");
    }

    async fn reply(&self, repository: &Repository, number: u64, body: &str) -> WorkflowResult<()> {
        self.deps
            .github
            .create_comment(repository, number, body)
            .await?;
        Ok(())
    }

    async fn report_failure(
        &self,
        key: &ContextKey,
        number: u64,
        repository: &Repository,
        delivery_id: Option<&str>,
        error: &WorkflowError,
    ) {
        tracing::error!(
            issue = %key,
            delivery = delivery_id.unwrap_or_default(),
            %error,
            "issue processing failed"
        );
        let body = format!("Forgewatch could not finish processing: {error}");
        if let Err(post_error) = self
            .deps
            .github
            .create_comment(repository, number, &body)
            .await
        {
            tracing::warn!(issue = %key, error = %post_error, "failed to post error comment");
        }
    }
}

const fn default_agent(issue_type: IssueType) -> AgentType {
    match issue_type {
        IssueType::Security => AgentType::Security,
        IssueType::Documentation => AgentType::Documentation,
        IssueType::Performance => AgentType::Performance,
        _ => AgentType::CodeGeneration,
    }
}

fn delegation_context(key: &ContextKey, delivery_id: Option<&str>) -> DelegationContext {
    let context = DelegationContext::new(key.as_str());
    if let Some(delivery_id) = delivery_id {
        return context.with_delivery_id(delivery_id);
    }
    context
}

fn task_payload(issue: &Issue, repository: &Repository, analysis: &IssueAnalysis) -> Value {
    json!({
        "repository": repository.full_name(),
        "issue": issue.number,
        "title": issue.title,
        "body": issue.body,
        "analysis": analysis,
    })
}

fn status_line(record: &IssueContext) -> String {
    let agent = record
        .assigned_agent
        .map_or_else(|| "none".to_owned(), |agent| agent.to_string());
    let linked: Vec<String> = record
        .linked_pull_requests
        .iter()
        .map(|number| format!("#{number}"))
        .collect();
    let duplicate = record
        .duplicate_of
        .map(|original| format!(" Duplicate of #{original}."))
        .unwrap_or_default();
    format!(
        "Status: **{}**. Type {}, priority {}. Assigned agent: {agent}. Linked pull requests: {}.{duplicate}",
        record.status,
        record.analysis.issue_type,
        record.analysis.priority,
        if linked.is_empty() {
            "none".to_owned()
        } else {
            linked.join(", ")
        },
    )
}
