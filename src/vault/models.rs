use serde::{Deserialize, Serialize};

/// Content type of a secret backing a PEM certificate
pub const CONTENT_TYPE_PEM: &str = "application/x-pem-file";
/// Content type of a secret backing a PKCS#12 certificate
pub const CONTENT_TYPE_PFX: &str = "application/x-pkcs12";

/// Secret as returned by the vault
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBundle {
    pub value: Option<String>,
    pub id: Option<String>,
    pub content_type: Option<String>,
    /// Set when the secret is the private half of a certificate
    pub kid: Option<String>,
}

/// Key as returned by the vault; only public material is present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyBundle {
    pub key: Option<JsonWebKey>,
}

/// JSON web key; numeric fields are unpadded URL-safe base64
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kid: Option<String>,
    pub kty: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
    pub crv: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Certificate as returned by the vault
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateBundle {
    pub id: Option<String>,
    /// DER bytes, standard base64 on the wire
    pub cer: Option<String>,
}

impl SecretBundle {
    /// Whether the secret holds the exportable form of a certificate
    pub fn is_certificate_backed(&self) -> bool {
        self.kid.as_deref().is_some_and(|kid| !kid.is_empty())
    }
}
