pub mod models;
pub mod provider;
pub mod source;

pub use models::{CertificateBundle, JsonWebKey, KeyBundle, SecretBundle};
pub use provider::{MountResult, Provider};
pub use source::{DirectorySource, VaultObjectSource};
