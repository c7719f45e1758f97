//! Core decision logic: parsing, matching, state tracking, trailer
//! selection, title healing and the per-folder pipeline.

pub mod healer;
pub mod matcher;
pub mod parser;
pub mod pipeline;
pub mod state;
pub mod trailer;
