//! Domain logic for the comment moderation pipeline.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the pipeline stages, and the worker alike.

pub mod conversation;
pub mod error;
pub mod outcome;
pub mod retry;
pub mod types;
pub mod verdict;
