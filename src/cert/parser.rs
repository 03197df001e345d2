use crate::utils::errors::{ProviderError, Result};
use ::pem::Pem;
use x509_parser::der_parser::oid;
use x509_parser::prelude::*;

// X.509 Extension OIDs
const SUBJECT_KEY_IDENTIFIER_OID: oid::Oid = oid!(2.5.29 .14);
const AUTHORITY_KEY_IDENTIFIER_OID: oid::Oid = oid!(2.5.29 .35);

/// The parts of a certificate needed to link it to its issuer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateIdentity {
    pub der: Vec<u8>,
    pub subject: String,
    pub issuer: String,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
}

impl CertificateIdentity {
    pub fn subject_key_id_hex(&self) -> String {
        self.subject_key_id
            .as_deref()
            .map(format_key_id)
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn authority_key_id_hex(&self) -> String {
        self.authority_key_id
            .as_deref()
            .map(format_key_id)
            .unwrap_or_else(|| "-".to_string())
    }
}

pub struct CertificateParser;

impl CertificateParser {
    /// Parse a PEM certificate block
    pub fn parse_block(block: &Pem) -> Result<CertificateIdentity> {
        Self::parse_der(block.contents())
    }

    /// Parse DER certificate bytes
    pub fn parse_der(der: &[u8]) -> Result<CertificateIdentity> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| ProviderError::Parse(format!("failed to parse certificate: {e}")))?;

        let subject = common_name(cert.subject()).unwrap_or_else(|| cert.subject().to_string());
        let issuer = common_name(cert.issuer()).unwrap_or_else(|| cert.issuer().to_string());

        let mut subject_key_id = None;
        let mut authority_key_id = None;
        for ext in cert.extensions() {
            if ext.oid == SUBJECT_KEY_IDENTIFIER_OID {
                let (_rem, ski) = KeyIdentifier::from_der(ext.value).map_err(|e| {
                    ProviderError::Parse(format!("invalid subject key identifier: {e}"))
                })?;
                subject_key_id = non_empty(ski.0);
            } else if ext.oid == AUTHORITY_KEY_IDENTIFIER_OID {
                let (_rem, aki) = AuthorityKeyIdentifier::from_der(ext.value).map_err(|e| {
                    ProviderError::Parse(format!("invalid authority key identifier: {e}"))
                })?;
                authority_key_id = aki.key_identifier.and_then(|id| non_empty(id.0));
            }
        }

        Ok(CertificateIdentity {
            der: der.to_vec(),
            subject,
            issuer,
            subject_key_id,
            authority_key_id,
        })
    }
}

fn common_name(name: &X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn non_empty(id: &[u8]) -> Option<Vec<u8>> {
    (!id.is_empty()).then(|| id.to_vec())
}

/// Colon separated upper-case hex, the way openssl prints key identifiers
pub fn format_key_id(id: &[u8]) -> String {
    id.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
