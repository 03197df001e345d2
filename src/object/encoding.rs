use crate::object::descriptor::ObjectType;
use crate::utils::errors::{ProviderError, Result};
use base64::{engine::general_purpose, Engine as _};
use std::fmt;

/// Requested output format of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    Pem,
    Pfx,
}

/// Encoding of a secret value as stored in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectEncoding {
    Hex,
    Base64,
    Utf8,
}

impl ObjectFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectFormat::Pem => "pem",
            ObjectFormat::Pfx => "pfx",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("pem") {
            Some(ObjectFormat::Pem)
        } else if value.eq_ignore_ascii_case("pfx") {
            Some(ObjectFormat::Pfx)
        } else {
            None
        }
    }
}

impl ObjectEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectEncoding::Hex => "hex",
            ObjectEncoding::Base64 => "base64",
            ObjectEncoding::Utf8 => "utf-8",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        [ObjectEncoding::Hex, ObjectEncoding::Base64, ObjectEncoding::Utf8]
            .into_iter()
            .find(|encoding| value.eq_ignore_ascii_case(encoding.as_str()))
    }
}

impl fmt::Display for ObjectFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ObjectEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check the object format is known and allowed for the object type.
///
/// An empty format is accepted and means "provider default" (PEM).
pub fn validate_format(format: &str, object_type: ObjectType) -> Result<Option<ObjectFormat>> {
    let format = format.trim();
    if format.is_empty() {
        return Ok(None);
    }
    let parsed = ObjectFormat::parse(format).ok_or_else(|| {
        ProviderError::InvalidFormat(format!("{format}, should be PEM or PFX"))
    })?;

    // The vault only returns binary container content for secrets; keys and
    // certificates are always produced as PEM
    if parsed == ObjectFormat::Pfx && object_type != ObjectType::Secret {
        return Err(ProviderError::InvalidFormat(
            "PFX format only supported for objectType: secret".to_string(),
        ));
    }
    Ok(Some(parsed))
}

/// Check the object encoding is known and allowed for the object type
pub fn validate_encoding(encoding: &str, object_type: ObjectType) -> Result<Option<ObjectEncoding>> {
    let encoding = encoding.trim();
    if encoding.is_empty() {
        return Ok(None);
    }
    if object_type != ObjectType::Secret {
        return Err(ProviderError::InvalidEncoding(
            "objectEncoding only supported for objectType: secret".to_string(),
        ));
    }
    ObjectEncoding::parse(encoding).map(Some).ok_or_else(|| {
        ProviderError::InvalidEncoding(format!("{encoding}, should be hex, base64 or utf-8"))
    })
}

/// Turn fetched content into the bytes handed back to the caller.
///
/// Only secrets are ever decoded; keys and certificates are already PEM text.
pub fn decode_content(content: &str, object_type: ObjectType, encoding: &str) -> Result<Vec<u8>> {
    let encoding = encoding.trim();
    if object_type != ObjectType::Secret || encoding.is_empty() {
        return Ok(content.as_bytes().to_vec());
    }

    match ObjectEncoding::parse(encoding) {
        Some(ObjectEncoding::Utf8) => Ok(content.as_bytes().to_vec()),
        Some(ObjectEncoding::Base64) => {
            general_purpose::STANDARD
                .decode(content)
                .map_err(|e| ProviderError::Decode {
                    encoding: encoding.to_string(),
                    reason: e.to_string(),
                })
        }
        Some(ObjectEncoding::Hex) => hex::decode(content).map_err(|e| ProviderError::Decode {
            encoding: encoding.to_string(),
            reason: e.to_string(),
        }),
        None => Err(ProviderError::InvalidEncoding(format!(
            "{encoding}, should be utf-8, base64, or hex"
        ))),
    }
}
