pub mod private_key;
pub mod public_key;

pub use private_key::{normalize_private_key, PrivateKey};
pub use public_key::{build_public_key_pem, EcCurve, KeyComponents, KeyType};
