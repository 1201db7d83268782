//! Unit tests for breaker and retry decorators.

mod retry_tests;
