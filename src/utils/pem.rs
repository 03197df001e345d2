use crate::utils::errors::{ProviderError, Result};
use pem::{EncodeConfig, LineEnding, Pem};

pub const CERTIFICATE_TAG: &str = "CERTIFICATE";
pub const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
pub const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

const ENCODE_CONFIG: EncodeConfig = EncodeConfig::new().set_line_ending(LineEnding::LF);

/// Build a PEM block with no headers
pub fn pem_block(tag: &str, der: impl Into<Vec<u8>>) -> Pem {
    Pem::new(tag, der)
}

/// Encode a single block with unix line endings
pub fn encode_block(block: &Pem) -> String {
    pem::encode_config(block, ENCODE_CONFIG)
}

/// Encode blocks back to back, without blank lines between them
pub fn encode_blocks(blocks: &[Pem]) -> String {
    blocks.iter().map(encode_block).collect()
}

/// Parse every PEM block found in the input
pub fn parse_blocks(data: impl AsRef<[u8]>) -> Result<Vec<Pem>> {
    pem::parse_many(data).map_err(|e| ProviderError::Parse(format!("PEM decode error: {e}")))
}

/// Key and certificate blocks extracted from a container.
///
/// Output order is always keys first, then certificates.
#[derive(Debug, Clone, Default)]
pub struct PemBundle {
    keys: Vec<Pem>,
    certificates: Vec<Pem>,
}

impl PemBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a private key block; headers are dropped
    pub fn add_key(&mut self, der: impl Into<Vec<u8>>) {
        self.keys.push(pem_block(PRIVATE_KEY_TAG, der));
    }

    /// Add a certificate block; headers are dropped
    pub fn add_certificate(&mut self, der: impl Into<Vec<u8>>) {
        self.certificates.push(pem_block(CERTIFICATE_TAG, der));
    }

    pub fn keys(&self) -> &[Pem] {
        &self.keys
    }

    pub fn certificates(&self) -> &[Pem] {
        &self.certificates
    }

    pub fn replace_certificates(&mut self, certificates: Vec<Pem>) {
        self.certificates = certificates;
    }

    /// All blocks in output order
    pub fn blocks(&self) -> impl Iterator<Item = &Pem> {
        self.keys.iter().chain(self.certificates.iter())
    }

    /// PEM text of the keys followed by the certificates
    pub fn to_pem(&self) -> String {
        self.blocks().map(encode_block).collect()
    }
}
