use crate::utils::errors::{ProviderError, Result};
use pkcs8::{der::Decode, AssociatedOid, EncodePrivateKey, ObjectIdentifier, PrivateKeyInfo};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::RsaPrivateKey;
use sec1::EcPrivateKey;

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// A private key decoded from one of the legacy or modern DER encodings
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl PrivateKey {
    /// Decode a DER private key.
    ///
    /// Tried in order: PKCS#1 (RSA only), PKCS#8, SEC1 (EC only). The first
    /// encoding that parses wins.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = RsaPrivateKey::from_pkcs1_der(der) {
            tracing::debug!("parsed private key as pkcs1");
            return Ok(PrivateKey::Rsa(Box::new(key)));
        }
        match Self::from_pkcs8_der(der) {
            Ok(key) => {
                tracing::debug!("parsed private key as pkcs8");
                return Ok(key);
            }
            Err(e) => tracing::trace!("not a pkcs8 private key: {e}"),
        }
        match Self::from_sec1_der(der) {
            Ok(key) => {
                tracing::debug!("parsed private key as sec1");
                Ok(key)
            }
            Err(e) => {
                tracing::trace!("not a sec1 private key: {e}");
                Err(ProviderError::Parse(
                    "failed to parse key for type pkcs1, pkcs8 or ec".to_string(),
                ))
            }
        }
    }

    fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::from_der(der)
            .map_err(|e| ProviderError::Parse(format!("PKCS#8 decode error: {e}")))?;
        let pkcs8_error = |e: pkcs8::Error| ProviderError::Parse(format!("PKCS#8 key error: {e}"));

        if info.algorithm.oid == OID_RSA_ENCRYPTION {
            let key = RsaPrivateKey::try_from(info).map_err(pkcs8_error)?;
            return Ok(PrivateKey::Rsa(Box::new(key)));
        }
        if info.algorithm.oid != OID_EC_PUBLIC_KEY {
            return Err(ProviderError::UnsupportedKeyType(format!(
                "private key algorithm {}",
                info.algorithm.oid
            )));
        }

        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|e| ProviderError::Parse(format!("EC key without named curve: {e}")))?;
        if curve == p256::NistP256::OID {
            Ok(PrivateKey::P256(p256::SecretKey::try_from(info).map_err(pkcs8_error)?))
        } else if curve == p384::NistP384::OID {
            Ok(PrivateKey::P384(p384::SecretKey::try_from(info).map_err(pkcs8_error)?))
        } else if curve == p521::NistP521::OID {
            Ok(PrivateKey::P521(p521::SecretKey::try_from(info).map_err(pkcs8_error)?))
        } else {
            Err(ProviderError::UnsupportedKeyType(format!("curve {curve}")))
        }
    }

    fn from_sec1_der(der: &[u8]) -> Result<Self> {
        let key = EcPrivateKey::from_der(der)
            .map_err(|e| ProviderError::Parse(format!("SEC1 decode error: {e}")))?;
        let sec1_error = |e: sec1::der::Error| ProviderError::Parse(format!("SEC1 key error: {e}"));

        let curve = key.parameters.and_then(|params| params.named_curve());
        let private_len = key.private_key.len();
        match curve {
            Some(oid) if oid == p256::NistP256::OID => {
                Ok(PrivateKey::P256(p256::SecretKey::try_from(key).map_err(sec1_error)?))
            }
            Some(oid) if oid == p384::NistP384::OID => {
                Ok(PrivateKey::P384(p384::SecretKey::try_from(key).map_err(sec1_error)?))
            }
            Some(oid) if oid == p521::NistP521::OID => {
                Ok(PrivateKey::P521(p521::SecretKey::try_from(key).map_err(sec1_error)?))
            }
            Some(oid) => Err(ProviderError::UnsupportedKeyType(format!("curve {oid}"))),
            // No parameters: fall back to the scalar size
            None => match private_len {
                32 => Ok(PrivateKey::P256(p256::SecretKey::try_from(key).map_err(sec1_error)?)),
                48 => Ok(PrivateKey::P384(p384::SecretKey::try_from(key).map_err(sec1_error)?)),
                66 => Ok(PrivateKey::P521(p521::SecretKey::try_from(key).map_err(sec1_error)?)),
                len => Err(ProviderError::Parse(format!(
                    "cannot infer curve of a {len} byte EC private key"
                ))),
            },
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => "RSA",
            PrivateKey::P256(_) => "EC P-256",
            PrivateKey::P384(_) => "EC P-384",
            PrivateKey::P521(_) => "EC P-521",
        }
    }

    /// Encode as PKCS#8 PrivateKeyInfo DER
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            PrivateKey::Rsa(key) => key.to_pkcs8_der(),
            PrivateKey::P256(key) => key.to_pkcs8_der(),
            PrivateKey::P384(key) => key.to_pkcs8_der(),
            PrivateKey::P521(key) => key.to_pkcs8_der(),
        }
        .map_err(|e| ProviderError::Parse(format!("failed to marshal pkcs8 private key: {e}")))?;
        Ok(document.as_bytes().to_vec())
    }
}

/// Re-encode any supported private key DER as PKCS#8
pub fn normalize_private_key(der: &[u8]) -> Result<Vec<u8>> {
    let key = PrivateKey::from_der(der)?;
    tracing::debug!(algorithm = key.algorithm(), "normalizing private key to pkcs8");
    key.to_pkcs8_der()
}
