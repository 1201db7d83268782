//! Unit tests for task delegation.

mod domain_tests;
