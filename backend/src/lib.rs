//! # splan
//!
//! Backend for a student timetable planner.
//!
//! Students keep one or more weekly timetables of courses. Every course
//! mutation reruns conflict detection for the affected timetable, so the
//! stored conflict set always reflects the current course set.
//!
//! ## Features
//!
//! - **Conflict detection**: pairwise overlap sweep per weekday with
//!   shared-room marking
//! - **Timetables**: CRUD, activation, duplication and read-only sharing
//! - **Views**: week layout and aggregate statistics
//! - **Notifications**: manual notifications and generated course reminders
//! - **Import/Export**: JSON and CSV documents
//! - **HTTP API**: axum REST endpoints
//!
//! ## Architecture
//!
//! - [`algorithms`]: the conflict detector
//! - [`models`]: domain types
//! - [`api`]: public re-exports and id types
//! - [`db`]: repository traits, the in-memory repository and core services
//! - [`services`]: week view, statistics, reminders and import/export
//! - [`config`]: TOML and environment configuration
//! - [`http`]: axum router and handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
