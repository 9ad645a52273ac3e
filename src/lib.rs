pub mod batch;
pub mod config;
pub mod decode;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod queue;
pub mod rubric;
pub mod ui;
