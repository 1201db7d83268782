//! Then steps for issue triage BDD scenarios.

use super::world::{ISSUE_NUMBER, TriageWorld};
use eyre::{ensure, eyre};
use rstest_bdd_macros::then;

#[then(r#"the issue is labelled "{label}""#)]
fn labelled(world: &TriageWorld, label: String) -> Result<(), eyre::Report> {
    ensure!(world.status.is_some(), "issue pipeline did not finish");
    let labels = world.github.labels_on(ISSUE_NUMBER);
    ensure!(labels.contains(&label), "expected {label} in {labels:?}");
    Ok(())
}

#[then(r#"the issue is not labelled "{label}""#)]
fn not_labelled(world: &TriageWorld, label: String) -> Result<(), eyre::Report> {
    let labels = world.github.labels_on(ISSUE_NUMBER);
    ensure!(!labels.contains(&label), "unexpected {label} in {labels:?}");
    Ok(())
}

#[then(r#"the triage comment mentions "{text}""#)]
fn triage_comment_mentions(world: &TriageWorld, text: String) -> Result<(), eyre::Report> {
    let comments = world.github.comments_on(ISSUE_NUMBER);
    let triage = comments
        .first()
        .ok_or_else(|| eyre!("no triage comment posted"))?;
    ensure!(
        triage.to_lowercase().contains(&text),
        "triage comment lacks {text}: {triage}"
    );
    Ok(())
}

#[then("a comment references issue #{number}")]
fn comment_references(world: &TriageWorld, number: u64) -> Result<(), eyre::Report> {
    let reference = format!("#{number}");
    let comments = world.github.comments_on(ISSUE_NUMBER);
    ensure!(
        comments.iter().any(|body| body.contains(&reference)),
        "no comment references {reference}: {comments:?}"
    );
    Ok(())
}
