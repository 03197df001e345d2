use crate::utils::errors::{ProviderError, Result};
use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use cms::{content_info::ContentInfo, encrypted_data::EncryptedData};
use der::asn1::{ContextSpecific, ObjectIdentifier, OctetString};
use der::{Any, Decode, Encode};
use des::TdesEde3;
use hmac::{digest::Digest, Mac};
use pkcs12::authenticated_safe::AuthenticatedSafe;
use pkcs12::cert_type::CertBag;
use pkcs12::kdf::{self, Pkcs12KeyType};
use pkcs12::mac_data::MacData;
use pkcs12::pbe_params::{EncryptedPrivateKeyInfo, Pkcs12PbeParams};
use pkcs12::pfx::{Pfx, Version};
use pkcs12::safe_bag::SafeContents;
use pkcs8::spki::AlgorithmIdentifierOwned;
use rc2::Rc2;
use sha1::Sha1;
use sha2::Sha256;

const OID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const OID_ENCRYPTED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.6");
const OID_PBES2: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.5.13");
const OID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const OID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

/// One safe bag of a PKCS#12 container, decrypted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PfxBag {
    /// PrivateKeyInfo DER, from a key bag or a shrouded key bag
    Key(Vec<u8>),
    /// X.509 certificate DER
    Certificate(Vec<u8>),
}

impl PfxBag {
    pub fn kind(&self) -> &'static str {
        match self {
            PfxBag::Key(_) => "key",
            PfxBag::Certificate(_) => "certificate",
        }
    }
}

fn asn1_error(e: der::Error) -> ProviderError {
    ProviderError::Parse(format!("malformed PKCS#12 structure: {e}"))
}

/// Decode every safe bag of a PKCS#12 container in container order.
///
/// The MAC is checked when present. Bag types other than key, shrouded key
/// and X.509 certificate bags are rejected.
pub fn decode_pfx(data: &[u8], password: &str) -> Result<Vec<PfxBag>> {
    let pfx = Pfx::from_der(data).map_err(asn1_error)?;
    if pfx.version != Version::V3 {
        return Err(ProviderError::Parse(
            "unsupported PKCS#12 version".to_string(),
        ));
    }
    if pfx.auth_safe.content_type != OID_DATA {
        return Err(ProviderError::Parse(format!(
            "unsupported PKCS#12 content type {}",
            pfx.auth_safe.content_type
        )));
    }

    let auth_safe = OctetString::from_der(&pfx.auth_safe.content.to_der().map_err(asn1_error)?)
        .map_err(asn1_error)?;
    if let Some(mac_data) = &pfx.mac_data {
        verify_mac(mac_data, password, auth_safe.as_bytes())?;
    } else {
        tracing::debug!("PKCS#12 container has no MAC");
    }

    let safes: AuthenticatedSafe = AuthenticatedSafe::from_der(auth_safe.as_bytes())
        .map_err(asn1_error)?;
    let mut bags = Vec::new();
    for (idx, safe) in safes.iter().enumerate() {
        let contents = safe_contents(safe, password)?;
        tracing::trace!("safe {}: {} bags", idx, contents.len());
        for bag in contents {
            bags.push(decode_bag(bag.bag_id, &bag.bag_value, password)?);
        }
    }
    Ok(bags)
}

macro_rules! mac_matches {
    ($digest:ty, $mac_data:expr, $password:expr, $data:expr) => {{
        let key = kdf::derive_key_utf8::<$digest>(
            $password,
            $mac_data.mac_salt.as_bytes(),
            Pkcs12KeyType::Mac,
            $mac_data.iterations,
            <$digest>::output_size(),
        )
        .map_err(asn1_error)?;
        let mut mac = <hmac::Hmac<$digest> as Mac>::new_from_slice(&key)
            .map_err(|e| ProviderError::Parse(format!("invalid PKCS#12 MAC key: {e}")))?;
        mac.update($data);
        mac.verify_slice($mac_data.mac.digest.as_bytes()).is_ok()
    }};
}

fn verify_mac(mac_data: &MacData, password: &str, data: &[u8]) -> Result<()> {
    let algorithm = mac_data.mac.algorithm.oid;
    let verified = if algorithm == OID_SHA1 {
        mac_matches!(Sha1, mac_data, password, data)
    } else if algorithm == OID_SHA256 {
        mac_matches!(Sha256, mac_data, password, data)
    } else {
        return Err(ProviderError::Parse(format!(
            "unsupported PKCS#12 MAC algorithm {algorithm}"
        )));
    };

    if verified {
        Ok(())
    } else {
        Err(ProviderError::Parse(
            "PKCS#12 MAC verification failed, password is not empty".to_string(),
        ))
    }
}

fn safe_contents(safe: &ContentInfo, password: &str) -> Result<SafeContents> {
    let content = safe.content.to_der().map_err(asn1_error)?;
    let data = if safe.content_type == OID_DATA {
        OctetString::from_der(&content)
            .map_err(asn1_error)?
            .into_bytes()
    } else if safe.content_type == OID_ENCRYPTED_DATA {
        let encrypted = EncryptedData::from_der(&content).map_err(asn1_error)?;
        match &encrypted.enc_content_info.encrypted_content {
            Some(ciphertext) => decrypt(
                &encrypted.enc_content_info.content_enc_alg,
                ciphertext.as_bytes(),
                password,
            )?,
            None => return Ok(Vec::new()),
        }
    } else {
        return Err(ProviderError::Parse(format!(
            "unsupported PKCS#12 safe content type {}",
            safe.content_type
        )));
    };
    SafeContents::from_der(&data).map_err(asn1_error)
}

fn decode_bag(bag_id: ObjectIdentifier, value: &[u8], password: &str) -> Result<PfxBag> {
    if bag_id == pkcs12::PKCS_12_CERT_BAG_OID {
        let bag = ContextSpecific::<CertBag>::from_der(value).map_err(asn1_error)?;
        if bag.value.cert_id != pkcs12::PKCS_12_X509_CERT_OID {
            return Err(ProviderError::Parse(format!(
                "unsupported certificate type {} in PKCS#12 cert bag",
                bag.value.cert_id
            )));
        }
        Ok(PfxBag::Certificate(bag.value.cert_value.into_bytes()))
    } else if bag_id == pkcs12::PKCS_12_PKCS8_KEY_BAG_OID {
        let bag = ContextSpecific::<EncryptedPrivateKeyInfo>::from_der(value).map_err(asn1_error)?;
        let key = decrypt(
            &bag.value.encryption_algorithm,
            bag.value.encrypted_data.as_bytes(),
            password,
        )?;
        Ok(PfxBag::Key(key))
    } else if bag_id == pkcs12::PKCS_12_KEY_BAG_OID {
        let bag = ContextSpecific::<Any>::from_der(value).map_err(asn1_error)?;
        Ok(PfxBag::Key(bag.value.to_der().map_err(asn1_error)?))
    } else {
        Err(ProviderError::Parse(format!(
            "don't know how to convert a safe bag of type {bag_id}"
        )))
    }
}

fn decrypt(algorithm: &AlgorithmIdentifierOwned, data: &[u8], password: &str) -> Result<Vec<u8>> {
    let params = algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| {
            ProviderError::Parse(format!("missing parameters for {}", algorithm.oid))
        })?
        .to_der()
        .map_err(asn1_error)?;

    if algorithm.oid == OID_PBES2 {
        let params = pkcs5::pbes2::Parameters::from_der(&params).map_err(asn1_error)?;
        return params
            .decrypt(password.as_bytes(), data)
            .map_err(|e| ProviderError::Parse(format!("failed to decrypt PKCS#12 content: {e}")));
    }

    let params = Pkcs12PbeParams::from_der(&params).map_err(asn1_error)?;
    let salt = params.salt.as_bytes();
    if algorithm.oid == pkcs12::PKCS_12_PBE_WITH_SHAAND3_KEY_TRIPLE_DES_CBC {
        pbes1_decrypt::<TdesEde3>(data, password, salt, params.iterations, 24)
    } else if algorithm.oid == pkcs12::PKCS_12_PBEWITH_SHAAND40_BIT_RC2_CBC {
        pbes1_decrypt::<Rc2>(data, password, salt, params.iterations, 5)
    } else {
        Err(ProviderError::Parse(format!(
            "unsupported PKCS#12 encryption scheme {}",
            algorithm.oid
        )))
    }
}

/// PKCS#12 password based encryption (RFC 7292 appendix C)
fn pbes1_decrypt<C>(
    data: &[u8],
    password: &str,
    salt: &[u8],
    iterations: i32,
    key_len: usize,
) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    let key = kdf::derive_key_utf8::<Sha1>(
        password,
        salt,
        Pkcs12KeyType::EncryptionKey,
        iterations,
        key_len,
    )
    .map_err(asn1_error)?;
    let iv = kdf::derive_key_utf8::<Sha1>(password, salt, Pkcs12KeyType::Iv, iterations, 8)
        .map_err(asn1_error)?;

    let cipher = cbc::Decryptor::<C>::new_from_slices(&key, &iv)
        .map_err(|e| ProviderError::Parse(format!("invalid PKCS#12 cipher key: {e}")))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| ProviderError::Parse("failed to decrypt PKCS#12 content".to_string()))
}
