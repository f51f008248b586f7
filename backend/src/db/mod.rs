//! Persistence layer for timetables.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Business Logic           │
//! │  - Validation                                            │
//! │  - Conflict recomputation after every course mutation    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The store is always an explicit object: build one with
//! [`RepositoryFactory`] or [`repositories::LocalRepository::new`] and pass
//! it to the service functions.
//!
//! ```
//! use splan::db::{services, repositories::LocalRepository};
//! use splan::models::NewTimetable;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let repo = LocalRepository::new();
//!     services::create_timetable(&repo, NewTimetable::named("Winter 2024")).await.unwrap();
//!     assert_eq!(services::list_timetables(&repo).await.unwrap().len(), 1);
//! });
//! ```

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repositories;
pub mod repository;
pub mod services;


pub use factory::{RepositoryFactory, RepositoryType};
pub use repository::{
    ErrorContext, FullRepository, RepositoryError, RepositoryResult, TimetableLock,
};
