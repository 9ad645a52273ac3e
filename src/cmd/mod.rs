//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module  | Commands handled                          |
//! |---------|-------------------------------------------|
//! | `label` | `Label` — one item through the pipeline   |
//! | `batch` | `Batch` — a JSONL file of items           |
//! | `queue` | `Queue` — review-queue maintenance        |

pub mod batch;
pub mod label;
pub mod queue;

pub use batch::cmd_batch;
pub use label::cmd_label;
pub use queue::cmd_queue;
