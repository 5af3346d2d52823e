//! Streaming motion detection and redaction.
//!
//! Three stage workers connected by bounded channels:
//! `frame source → motion detector → presenter`, started and torn down by
//! [`pipeline::orchestrator::Pipeline`].

pub mod annotation;
pub mod blurring;
pub mod detection;
pub mod display;
pub mod pipeline;
pub mod shared;
pub mod video;
