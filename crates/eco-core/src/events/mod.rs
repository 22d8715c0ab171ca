//! Event recording: the per-tick buffer and the JSONL log it drains into.

pub mod logger;

pub use logger::{EventLogger, TickEvents};
