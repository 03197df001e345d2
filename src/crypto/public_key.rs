use crate::utils::errors::{ProviderError, Result};
use crate::utils::pem::{pem_block, PUBLIC_KEY_TAG};
use crate::vault::models::JsonWebKey;
use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose},
    Engine as _,
};
use pem::Pem;
use pkcs8::EncodePublicKey;
use rsa::{BigUint, RsaPublicKey};
use std::fmt;
use std::str::FromStr;

/// URL-safe alphabet, padding optional
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Key types the vault reports for keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    RsaHsm,
    Ec,
    EcHsm,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Rsa => "RSA",
            KeyType::RsaHsm => "RSA-HSM",
            KeyType::Ec => "EC",
            KeyType::EcHsm => "EC-HSM",
        }
    }
}

impl FromStr for KeyType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RSA" => Ok(KeyType::Rsa),
            "RSA-HSM" => Ok(KeyType::RsaHsm),
            "EC" => Ok(KeyType::Ec),
            "EC-HSM" => Ok(KeyType::EcHsm),
            other => Err(ProviderError::UnsupportedKeyType(format!(
                "key type '{other}' currently not supported"
            ))),
        }
    }
}

/// Named curves supported for EC keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
        }
    }

    /// Size in bytes of one affine coordinate
    pub fn coordinate_len(&self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcCurve {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P-256" => Ok(EcCurve::P256),
            "P-384" => Ok(EcCurve::P384),
            "P-521" => Ok(EcCurve::P521),
            other => Err(ProviderError::UnsupportedKeyType(format!(
                "curve {other} is not supported"
            ))),
        }
    }
}

/// Raw public coordinates, unsigned big-endian
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyComponents {
    Rsa { n: Vec<u8>, e: Vec<u8> },
    Ec { curve: EcCurve, x: Vec<u8>, y: Vec<u8> },
}

impl KeyComponents {
    /// Decode the coordinates of a JSON web key
    pub fn from_jwk(jwk: &JsonWebKey) -> Result<Self> {
        let kty = jwk.kty.as_deref().unwrap_or_default();
        match kty.parse::<KeyType>()? {
            KeyType::Rsa | KeyType::RsaHsm => Ok(KeyComponents::Rsa {
                n: decode_component("n", jwk.n.as_deref())?,
                e: decode_component("e", jwk.e.as_deref())?,
            }),
            KeyType::Ec | KeyType::EcHsm => {
                let x = decode_component("x", jwk.x.as_deref())?;
                let y = decode_component("y", jwk.y.as_deref())?;
                let curve = jwk.crv.as_deref().unwrap_or_default().parse()?;
                Ok(KeyComponents::Ec { curve, x, y })
            }
        }
    }

    /// SubjectPublicKeyInfo DER encoding of the key
    pub fn to_public_key_der(&self) -> Result<Vec<u8>> {
        match self {
            KeyComponents::Rsa { n, e } => rsa_public_key_der(n, e),
            KeyComponents::Ec { curve, x, y } => ec_public_key_der(*curve, x, y),
        }
    }

    /// "PUBLIC KEY" PEM block without headers
    pub fn to_pem(&self) -> Result<Pem> {
        Ok(pem_block(PUBLIC_KEY_TAG, self.to_public_key_der()?))
    }
}

/// Rebuild the public key PEM of a vault key
pub fn build_public_key_pem(jwk: &JsonWebKey) -> Result<Pem> {
    KeyComponents::from_jwk(jwk)?.to_pem()
}

fn decode_component(name: &str, value: Option<&str>) -> Result<Vec<u8>> {
    let value = value.ok_or_else(|| ProviderError::MalformedComponent {
        component: name.to_string(),
        reason: "missing".to_string(),
    })?;
    URL_SAFE_LENIENT
        .decode(value)
        .map_err(|e| ProviderError::MalformedComponent {
            component: name.to_string(),
            reason: e.to_string(),
        })
}

fn rsa_public_key_der(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    // The exponent is carried as a machine integer; only the low 64 bits count
    let e = e
        .iter()
        .skip(e.len().saturating_sub(8))
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));

    let key = RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from(e)).map_err(|err| {
        ProviderError::MalformedComponent {
            component: "n".to_string(),
            reason: err.to_string(),
        }
    })?;
    key.to_public_key_der()
        .map(|doc| doc.into_vec())
        .map_err(|err| ProviderError::Parse(format!("failed to marshal RSA public key: {err}")))
}

fn ec_public_key_der(curve: EcCurve, x: &[u8], y: &[u8]) -> Result<Vec<u8>> {
    let size = curve.coordinate_len();
    let mut point = Vec::with_capacity(1 + 2 * size);
    point.push(0x04);
    for (name, coordinate) in [("x", x), ("y", y)] {
        // Leading zero bytes may have been stripped by the vault
        let significant = strip_leading_zeros(coordinate);
        if significant.len() > size {
            return Err(ProviderError::MalformedComponent {
                component: name.to_string(),
                reason: format!("{} bytes exceeds {} coordinate size", significant.len(), curve),
            });
        }
        point.resize(point.len() + size - significant.len(), 0);
        point.extend_from_slice(significant);
    }

    let invalid_point = |err: p256::elliptic_curve::Error| ProviderError::MalformedComponent {
        component: "x,y".to_string(),
        reason: format!("not a point on {curve}: {err}"),
    };
    let document = match curve {
        EcCurve::P256 => p256::PublicKey::from_sec1_bytes(&point)
            .map_err(invalid_point)?
            .to_public_key_der(),
        EcCurve::P384 => p384::PublicKey::from_sec1_bytes(&point)
            .map_err(invalid_point)?
            .to_public_key_der(),
        EcCurve::P521 => p521::PublicKey::from_sec1_bytes(&point)
            .map_err(invalid_point)?
            .to_public_key_der(),
    };
    document
        .map(|doc| doc.into_vec())
        .map_err(|err| ProviderError::Parse(format!("failed to marshal EC public key: {err}")))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pem::encode_block;
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use pkcs8::{DecodePrivateKey, DecodePublicKey};
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::traits::PublicKeyParts;

    const RSA_PKCS1: &str = include_str!("../../tests/fixtures/rsa_pkcs1.pem");
    const EC_P256: &str = include_str!("../../tests/fixtures/ec_p256_pkcs8.pem");
    const EC_P384: &str = include_str!("../../tests/fixtures/ec_p384_pkcs8.pem");
    const EC_P521: &str = include_str!("../../tests/fixtures/ec_p521_pkcs8.pem");

    fn b64url(bytes: &[u8]) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    fn ec_jwk(crv: &str, x: &[u8], y: &[u8]) -> JsonWebKey {
        JsonWebKey {
            kty: Some("EC".to_string()),
            crv: Some(crv.to_string()),
            x: Some(b64url(x)),
            y: Some(b64url(y)),
            ..Default::default()
        }
    }

    #[test]
    fn test_rsa_round_trip() {
        let private = rsa::RsaPrivateKey::from_pkcs1_pem(RSA_PKCS1).unwrap();
        let jwk = JsonWebKey {
            kty: Some("RSA-HSM".to_string()),
            n: Some(b64url(&private.n().to_bytes_be())),
            e: Some(b64url(&private.e().to_bytes_be())),
            ..Default::default()
        };

        let block = build_public_key_pem(&jwk).unwrap();
        assert_eq!(block.tag(), "PUBLIC KEY");
        assert!(block.headers().iter().next().is_none());

        let public = RsaPublicKey::from_public_key_pem(&encode_block(&block)).unwrap();
        assert_eq!(public.n(), private.n());
        assert_eq!(public.e(), &BigUint::from(65537u32));
    }

    #[test]
    fn test_rsa_accepts_padded_base64() {
        let private = rsa::RsaPrivateKey::from_pkcs1_pem(RSA_PKCS1).unwrap();
        let n = general_purpose::URL_SAFE.encode(private.n().to_bytes_be());
        let components = KeyComponents::from_jwk(&JsonWebKey {
            kty: Some("RSA".to_string()),
            n: Some(n),
            e: Some("AQAB".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(components, KeyComponents::Rsa { ref e, .. } if e == &[1, 0, 1]));
    }

    #[test]
    fn test_ec_round_trip_p256() {
        let secret = p256::SecretKey::from_pkcs8_pem(EC_P256).unwrap();
        let point = secret.public_key().to_encoded_point(false);
        let jwk = ec_jwk("P-256", point.x().unwrap(), point.y().unwrap());

        let der = KeyComponents::from_jwk(&jwk).unwrap().to_public_key_der().unwrap();
        let rebuilt = p256::PublicKey::from_public_key_der(&der).unwrap();
        assert_eq!(rebuilt.to_encoded_point(false), point);
    }

    #[test]
    fn test_ec_round_trip_p384() {
        let secret = p384::SecretKey::from_pkcs8_pem(EC_P384).unwrap();
        let point = secret.public_key().to_encoded_point(false);
        let jwk = ec_jwk("P-384", point.x().unwrap(), point.y().unwrap());

        let der = KeyComponents::from_jwk(&jwk).unwrap().to_public_key_der().unwrap();
        let rebuilt = p384::PublicKey::from_public_key_der(&der).unwrap();
        assert_eq!(rebuilt.to_encoded_point(false), point);
    }

    #[test]
    fn test_ec_round_trip_p521() {
        let secret = p521::SecretKey::from_pkcs8_pem(EC_P521).unwrap();
        let point = secret.public_key().to_encoded_point(false);
        let x = point.x().unwrap();
        let y = point.y().unwrap();
        // Coordinates arrive without leading zero bytes
        let jwk = ec_jwk("P-521", strip_leading_zeros(x), strip_leading_zeros(y));

        let der = KeyComponents::from_jwk(&jwk).unwrap().to_public_key_der().unwrap();
        let rebuilt = p521::PublicKey::from_public_key_der(&der).unwrap();
        assert_eq!(rebuilt.to_encoded_point(false), point);
    }

    #[test]
    fn test_unsupported_key_type_and_curve() {
        let jwk = JsonWebKey {
            kty: Some("oct".to_string()),
            ..Default::default()
        };
        match build_public_key_pem(&jwk) {
            Err(ProviderError::UnsupportedKeyType(msg)) => assert!(msg.contains("oct")),
            other => panic!("unexpected result: {other:?}"),
        }

        let jwk = ec_jwk("P-256K", &[1; 32], &[2; 32]);
        match build_public_key_pem(&jwk) {
            Err(ProviderError::UnsupportedKeyType(msg)) => assert!(msg.contains("P-256K")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_components() {
        let jwk = JsonWebKey {
            kty: Some("RSA".to_string()),
            n: Some("not base64!".to_string()),
            e: Some("AQAB".to_string()),
            ..Default::default()
        };
        match build_public_key_pem(&jwk) {
            Err(ProviderError::MalformedComponent { component, .. }) => assert_eq!(component, "n"),
            other => panic!("unexpected result: {other:?}"),
        }

        let jwk = JsonWebKey {
            kty: Some("EC".to_string()),
            crv: Some("P-256".to_string()),
            x: Some(b64url(&[1; 32])),
            ..Default::default()
        };
        match build_public_key_pem(&jwk) {
            Err(ProviderError::MalformedComponent { component, .. }) => assert_eq!(component, "y"),
            other => panic!("unexpected result: {other:?}"),
        }

        // Right sizes, but not a point on the curve
        let jwk = ec_jwk("P-256", &[1; 32], &[2; 32]);
        assert!(matches!(
            build_public_key_pem(&jwk),
            Err(ProviderError::MalformedComponent { .. })
        ));

        let jwk = ec_jwk("P-256", &[1; 33], &[2; 32]);
        assert!(matches!(
            build_public_key_pem(&jwk),
            Err(ProviderError::MalformedComponent { .. })
        ));
    }
}
