pub mod credentials;
pub mod scanner;

pub use credentials::{CredentialStore, mask_token};
pub use scanner::{CommandScanner, ContentScanner};
