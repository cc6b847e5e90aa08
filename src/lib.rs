//! Multi-target mod release publisher
//!
//! Describes one release (artifact, version, changelog, game versions,
//! loaders, credentials) and publishes it to CurseForge, Modrinth and GitHub
//! Releases in one invocation. Targets are opted into by configuring their
//! API credential; each runs independently, so one platform failing never
//! blocks the others.

pub mod core;
pub mod normalize;
pub mod orchestration;
pub mod security;
pub mod targets;
pub mod validation;

pub use crate::core::{PublishError, ReleaseDescriptor, ReleaseReport, Target};
pub use crate::orchestration::Orchestrator;
