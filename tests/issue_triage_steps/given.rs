//! Given steps for issue triage BDD scenarios.

use super::world::{ISSUE_NUMBER, TriageWorld};
use forgewatch::workflow::domain::Issue;
use rstest_bdd_macros::given;

#[given(r#"an issue titled "{title}" with body "{body}""#)]
fn pending_issue(world: &mut TriageWorld, title: String, body: String) {
    world.pending_issue = Some(Issue::new(ISSUE_NUMBER, title, body));
}

#[given(r#"an open issue #{number} titled "{title}""#)]
fn open_issue(world: &mut TriageWorld, number: u64, title: String) {
    world.github = world.github.clone().with_issue(Issue::new(
        number,
        title,
        "Reported by several users this week.",
    ));
}
