//! When steps for issue triage BDD scenarios.

use super::world::{TriageWorld, run_async};
use eyre::eyre;
use rstest_bdd_macros::when;

#[when("the issue is opened")]
fn open_issue(world: &mut TriageWorld) -> Result<(), eyre::Report> {
    let issue = world
        .pending_issue
        .clone()
        .ok_or_else(|| eyre!("missing pending issue in scenario world"))?;
    let service = world.service();

    world.status = run_async(service.process_new_issue(&issue, &world.repository, Some("bdd")));
    Ok(())
}
