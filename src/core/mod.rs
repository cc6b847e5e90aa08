pub mod config;
pub mod config_loader;
pub mod descriptor;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod state_machine;
pub mod traits;

pub use config::ReleaseConfig;
pub use config_loader::ConfigLoader;
pub use descriptor::{ReleaseDescriptor, Target};
pub use error::PublishError;
pub use resolver::ValueResolver;
pub use retry::{RetryManager, RetryOptions};
pub use state_machine::{PublishPhase, PublishTracker};
pub use traits::{PublishTarget, ReleaseReport, TargetOutcome, TargetReport};
