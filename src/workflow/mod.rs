//! Pull request and issue workflows driven by GitHub webhooks.
//!
//! A delivery is parsed into a [`domain::WebhookEvent`] and handed to the
//! [`services::WebhookRouter`], which dispatches it to the pull request or
//! issue engine. Engines analyse the item, generate tasks from fixed rule
//! tables, delegate them, and report the outcome back to GitHub through the
//! resilient [`ports::GitHubClient`] decorator.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Workflow services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
