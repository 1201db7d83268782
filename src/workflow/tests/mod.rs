//! Unit tests for the pull request and issue workflows.

mod classifier_tests;
mod pr_service_tests;
mod resilient_tests;
mod support;
