pub mod archive_validator;
pub mod eligibility;
pub mod version_compare;

pub use archive_validator::check_loader_manifests;
pub use eligibility::{check_required_values, resolve};
