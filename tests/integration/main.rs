//! Integration tests for the `hse` binary and the file-backed pipeline.

mod cli;
mod live_store;
