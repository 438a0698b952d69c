//! Expose stitchmd's command internals for integration tests. The stable
//! library surface lives in `stitchmd-core`.
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod run;
