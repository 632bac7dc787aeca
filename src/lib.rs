//! Weekly class timetable generation for a college department.
//!
//! Fixed slots are placed first and collisions between them are reported;
//! subject hour quotas are then filled first-fit with a qualified, available
//! teacher and a free room. Problems never abort a run: they come back as
//! conflict messages in the [`data::GenerationResult`].

pub mod config;
pub mod data;
pub mod export;
pub mod ingest;
pub mod occupancy;
pub mod server;
pub mod solver;
pub mod stats;
pub mod storage;
pub mod validation;

pub use data::{GenerationResult, TimetableInput};
pub use solver::{GeneratorOptions, TimetableGenerator};
