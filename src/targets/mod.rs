//! Platform integrations
//!
//! One module per publishing platform. Each pairs a thin HTTP client trait
//! with an executor that drives the per-target workflow; tests swap the
//! client for an in-memory fake.

pub mod curseforge;
pub mod github;
pub mod modrinth;

pub use curseforge::CurseforgeExecutor;
pub use github::GithubExecutor;
pub use modrinth::ModrinthExecutor;
