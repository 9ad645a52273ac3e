//! Orchestration state machine for single-item labeling runs.

pub mod runner;
pub mod state;

pub use runner::{LOCAL_DECODE_ATTEMPTS, PipelineRunner};
pub use state::{RunState, Stage};
