pub mod chain;
pub mod parser;
pub mod pfx;
pub mod pkcs12;

pub use self::pkcs12::{extract_pkcs12, extract_pkcs12_der};
pub use chain::{assemble_chain, CertificateChain};
pub use parser::{format_key_id, CertificateIdentity, CertificateParser};
pub use pfx::{decode_pfx, PfxBag};
