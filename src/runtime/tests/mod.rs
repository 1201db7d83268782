//! Unit tests for shutdown, admission, and operations.

mod shutdown_tests;
