//! Issue classification, triage, and similarity tests.

use crate::delegation::domain::{TaskPriority, TaskType};
use crate::workflow::domain::{
    Complexity, IssuePriority, IssueType, TitleSimilarity, analyze_issue, search_prefix,
};
use rstest::rstest;
use serde_json::json;

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

#[rstest]
fn production_crash_is_a_critical_bug() {
    let analysis = analyze_issue("bug: app crashes in production", &[]);

    assert_eq!(analysis.issue_type, IssueType::Bug);
    assert_eq!(analysis.priority, IssuePriority::Critical);
    assert_eq!(analysis.complexity, Complexity::Simple);
    assert_eq!(analysis.estimated_hours, 3);
    assert!(analysis.needs_more_info);
    assert!(!analysis.can_auto_generate);
    assert!(analysis.requires_human_review);
}

#[rstest]
#[case(&["Security"], IssueType::Security)]
#[case(&["docs"], IssueType::Documentation)]
#[case(&["chore"], IssueType::Maintenance)]
#[case(&["help wanted"], IssueType::Question)]
fn labels_win_over_keywords(#[case] names: &[&str], #[case] expected: IssueType) {
    let analysis = analyze_issue("the app crashes with an error", &labels(names));

    assert_eq!(analysis.issue_type, expected);
}

#[rstest]
#[case("Possible XSS in the comment form", IssueType::Security)]
#[case("Dashboard is slow to load", IssueType::Performance)]
#[case("Update the README install section", IssueType::Documentation)]
#[case("How do I configure webhooks?", IssueType::Question)]
#[case("Add support for GitLab", IssueType::Feature)]
#[case("Tidy the dashboard", IssueType::Enhancement)]
fn keywords_classify_unlabelled_issues(#[case] text: &str, #[case] expected: IssueType) {
    assert_eq!(analyze_issue(text, &[]).issue_type, expected);
}

#[rstest]
#[case("Export fails on large files", &[], IssuePriority::High)]
#[case("Bug in the pager", &[], IssuePriority::Medium)]
#[case("Dark mode, nice to have", &[], IssuePriority::Low)]
#[case("Dark mode is blocking our launch", &[], IssuePriority::High)]
#[case("Dark mode", &["priority: low"], IssuePriority::Low)]
#[case("Dark mode", &["priority-high"], IssuePriority::High)]
#[case("Dark mode", &["urgent"], IssuePriority::Critical)]
fn priority_follows_labels_then_text(
    #[case] text: &str,
    #[case] names: &[&str],
    #[case] expected: IssuePriority,
) {
    assert_eq!(analyze_issue(text, &labels(names)).priority, expected);
}

#[rstest]
fn security_issues_are_critical_and_delegate_a_review() {
    let analysis = analyze_issue(
        "SQL injection in the search endpoint\nThe api passes raw input to the database query.",
        &[],
    );

    assert_eq!(analysis.issue_type, IssueType::Security);
    assert_eq!(analysis.priority, IssuePriority::Critical);
    assert!(analysis.required_skills.contains(&"security".to_owned()));
    assert!(analysis.required_skills.contains(&"database".to_owned()));

    let tasks = analysis.generate_tasks(&json!({"issue": 9}));
    let kinds: Vec<(TaskType, TaskPriority)> = tasks
        .iter()
        .map(|task| (task.task_type(), task.priority()))
        .collect();
    assert_eq!(kinds, vec![(TaskType::SecurityReview, TaskPriority::Critical)]);
}

#[rstest]
fn documentation_issue_can_be_generated() {
    let analysis = analyze_issue("Docs: the README should list every config setting", &[]);

    assert_eq!(analysis.issue_type, IssueType::Documentation);
    assert!(analysis.can_auto_generate);
    let tasks = analysis.generate_tasks(&json!({}));
    assert_eq!(
        tasks.iter().map(|task| task.task_type()).collect::<Vec<_>>(),
        vec![TaskType::DocumentationGeneration]
    );
}

#[rstest]
fn design_work_across_systems_is_complex() {
    let text = "Refactor the architecture so the api, the database and the frontend share one \
                deployment pipeline. We should migrate every service.";
    let analysis = analyze_issue(text, &labels(&["enhancement"]));

    assert!(analysis.complexity.is_complex());
    assert!(analysis.requires_human_review);
    assert!(analysis.triage_labels().contains(&"complex".to_owned()));
    assert!(analysis.triage_labels().contains(&format!("size-{}", analysis.size())));
}

#[rstest]
fn checkbox_lines_become_acceptance_criteria() {
    let text = "Add CSV export\n\nThe export should:\n- [ ] include headers\n- [x] quote commas";
    let analysis = analyze_issue(text, &[]);

    assert_eq!(
        analysis.acceptance_criteria,
        vec!["include headers".to_owned(), "quote commas".to_owned()]
    );
}

#[rstest]
fn classification_is_deterministic() {
    let text = "Login fails with error 500 after upgrading\nSteps to reproduce: sign in.";
    let first = analyze_issue(text, &[]);
    let second = analyze_issue(text, &[]);

    assert_eq!(first, second);
    let payload = json!({"issue": 4});
    let first_tasks: Vec<TaskType> = first.generate_tasks(&payload).iter().map(|task| task.task_type()).collect();
    let second_tasks: Vec<TaskType> = second.generate_tasks(&payload).iter().map(|task| task.task_type()).collect();
    assert_eq!(first_tasks, second_tasks);
}

#[rstest]
fn triage_labels_for_a_critical_bug() {
    let analysis = analyze_issue("bug: app crashes in production", &[]);

    assert_eq!(
        analysis.triage_labels(),
        vec![
            "bug".to_owned(),
            "priority-critical".to_owned(),
            "size-small".to_owned(),
            "needs-info".to_owned(),
            "human-review".to_owned(),
        ]
    );
}

#[rstest]
fn triage_comment_lists_the_estimate() {
    let analysis = analyze_issue("bug: app crashes in production", &[]);

    let comment = analysis
        .triage_comment()
        .unwrap_or_else(|err| panic!("triage comment should render: {err}"));

    assert!(comment.contains("| Type | bug |"));
    assert!(comment.contains("| Priority | critical |"));
    assert!(comment.contains("3h (small)"));
    assert!(analysis.information_request().contains("steps to reproduce"));
}

#[rstest]
#[case("Login button is broken on mobile", true, 75)]
#[case("Add dark mode", false, 0)]
#[case("login BUTTON broken!", true, 100)]
fn titles_compare_without_stopwords(
    #[case] other: &str,
    #[case] duplicate: bool,
    #[case] percent: usize,
) {
    let similarity = TitleSimilarity::between("Login button broken", other);

    assert_eq!(similarity.is_duplicate(), duplicate);
    assert_eq!(similarity.percent(), percent);
}

#[rstest]
fn empty_titles_are_never_duplicates() {
    let similarity = TitleSimilarity::between("", "the a");

    assert!(!similarity.is_duplicate());
    assert_eq!(similarity.percent(), 0);
}

#[rstest]
fn search_prefix_keeps_fifty_characters() {
    let title = "x".repeat(80);

    assert_eq!(search_prefix(&title).chars().count(), 50);
    assert_eq!(search_prefix("  short  "), "short");
}
