pub mod cert;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod object;
pub mod utils;
pub mod vault;

// Re-export specific items to avoid conflicts
pub use cert::{assemble_chain, extract_pkcs12, CertificateChain};
pub use config::ProviderConfig;
pub use crypto::{build_public_key_pem, normalize_private_key};
pub use object::{decode_content, parse_objects, KeyVaultObject, ObjectType};
pub use utils::errors::{ProviderError, Result};
pub use utils::pem::PemBundle;
pub use vault::{DirectorySource, MountResult, Provider, VaultObjectSource};
