//! Comment rendering.

use super::WorkflowDomainError;
use minijinja::Environment;
use serde::Serialize;

pub(super) fn render<S: Serialize>(
    name: &'static str,
    template: &str,
    context: S,
) -> Result<String, WorkflowDomainError> {
    let mut environment = Environment::new();
    environment.set_trim_blocks(true);
    environment.set_lstrip_blocks(true);
    environment
        .render_str(template, context)
        .map_err(|error| WorkflowDomainError::Render {
            template: name,
            reason: error.to_string(),
        })
}
