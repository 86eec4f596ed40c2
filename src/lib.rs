// ABOUTME: Library root for gantry - an embeddable deployment orchestration engine.
// ABOUTME: Discovers structure of nested containers, runs staged deployers, reports incompleteness.

pub mod complete;
pub mod config;
pub mod container;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod scheduler;
pub mod structure;
pub mod types;
pub mod unit;

pub use error::{Error, Result};
pub use pipeline::Pipeline;
