//! Tests for the executor
//!
//! Organized by feature area; every test runs a complete wrapped script.

mod builtin_tests;
mod control_flow_tests;
mod function_tests;
mod helpers;
mod method_tests;
