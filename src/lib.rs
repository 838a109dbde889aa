//! Client for the JobTracker service: paginated job search, save/apply
//! actions with per-job serialization, and the saved/applied review list.

pub mod actions;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod screen;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AppError;
