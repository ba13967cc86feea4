//! Background worker: claims tasks from the durable queue and runs the
//! pipeline stages against them.

pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod sweeper;
