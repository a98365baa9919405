//! Integration test entry point

mod cli_test;
mod engine_test;
mod store_test;
