use crate::cert::pkcs12::extract_pkcs12;
use crate::config::ProviderConfig;
use crate::crypto::public_key::build_public_key_pem;
use crate::object::{
    decode_content, object_uid, object_version, validate_file_name, KeyVaultObject,
    ObjectDescriptor, ObjectFormat, ObjectType,
};
use crate::utils::errors::{ProviderError, Result};
use crate::utils::pem::{encode_block, pem_block, CERTIFICATE_TAG};
use crate::vault::models::{CONTENT_TYPE_PEM, CONTENT_TYPE_PFX};
use crate::vault::source::VaultObjectSource;
use base64::{engine::general_purpose, Engine as _};
use std::collections::BTreeMap;

/// Files to write and the versions they came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountResult {
    /// File name (alias or object name) to content
    pub files: BTreeMap<String, Vec<u8>>,
    /// `<type>/<name>` to the version actually fetched
    pub object_versions: BTreeMap<String, String>,
}

/// Fetches vault objects and turns them into file content
pub struct Provider<S> {
    source: S,
    config: ProviderConfig,
}

impl<S: VaultObjectSource> Provider<S> {
    pub fn new(source: S, config: ProviderConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> ProviderConfig {
        self.config
    }

    /// Fetch every object and build the file set.
    ///
    /// The first failing object aborts the whole mount.
    pub fn mount(&self, objects: &[KeyVaultObject]) -> Result<MountResult> {
        let mut result = MountResult::default();

        for object in objects {
            let descriptor = object.descriptor().map_err(|e| object.context(e))?;
            let file_name = object.file_name();
            validate_file_name(file_name).map_err(|e| object.context(e))?;

            let (content, version) = self.get_object_content(object, &descriptor)?;
            let uid = object_uid(&object.object_name, &object.object_type);
            tracing::info!("fetched {} version {}", uid, version);
            result.object_versions.insert(uid, version);

            let bytes = decode_content(&content, descriptor.object_type, &object.object_encoding)
                .map_err(|e| object.context(e))?;
            if result.files.insert(file_name.to_string(), bytes).is_some() {
                tracing::warn!("file '{}' written by more than one object, last one wins", file_name);
            }
        }

        Ok(result)
    }

    /// Content of one object as text, with the version that was fetched
    pub fn get_object_content(
        &self,
        object: &KeyVaultObject,
        descriptor: &ObjectDescriptor,
    ) -> Result<(String, String)> {
        let fetched = match descriptor.object_type {
            ObjectType::Secret => self.secret_content(object, descriptor),
            ObjectType::Key => self.key_content(object),
            ObjectType::Certificate => self.certificate_content(object),
        };
        fetched.map_err(|e| object.context(e))
    }

    fn secret_content(
        &self,
        object: &KeyVaultObject,
        descriptor: &ObjectDescriptor,
    ) -> Result<(String, String)> {
        let secret = self
            .source
            .get_secret(&object.object_name, &object.object_version)?;
        let value = secret
            .value
            .as_deref()
            .ok_or_else(|| ProviderError::MissingField("secret value".to_string()))?;
        let id = secret
            .id
            .as_deref()
            .ok_or_else(|| ProviderError::MissingField("secret id".to_string()))?;
        let version = object_version(id).to_string();

        if !secret.is_certificate_backed() {
            return Ok((value.to_string(), version));
        }

        let content_type = secret.content_type.as_deref().unwrap_or_default();
        match content_type {
            CONTENT_TYPE_PEM => Ok((value.to_string(), version)),
            CONTENT_TYPE_PFX if descriptor.format == Some(ObjectFormat::Pfx) => {
                tracing::debug!("returning PKCS#12 secret {} unconverted", object.object_name);
                Ok((value.to_string(), version))
            }
            CONTENT_TYPE_PFX => {
                let bundle = extract_pkcs12(value, &self.config)?;
                Ok((bundle.to_pem(), version))
            }
            other => Err(ProviderError::UnknownContentType(other.to_string())),
        }
    }

    fn key_content(&self, object: &KeyVaultObject) -> Result<(String, String)> {
        let bundle = self
            .source
            .get_key(&object.object_name, &object.object_version)?;
        let jwk = bundle
            .key
            .ok_or_else(|| ProviderError::MissingField("key".to_string()))?;
        let kid = jwk
            .kid
            .as_deref()
            .ok_or_else(|| ProviderError::MissingField("key id".to_string()))?;
        let version = object_version(kid).to_string();

        let public_key = build_public_key_pem(&jwk)?;
        Ok((encode_block(&public_key), version))
    }

    fn certificate_content(&self, object: &KeyVaultObject) -> Result<(String, String)> {
        let bundle = self
            .source
            .get_certificate(&object.object_name, &object.object_version)?;
        let cer = bundle
            .cer
            .as_deref()
            .ok_or_else(|| ProviderError::MissingField("certificate value".to_string()))?;
        let id = bundle
            .id
            .as_deref()
            .ok_or_else(|| ProviderError::MissingField("certificate id".to_string()))?;
        let version = object_version(id).to_string();

        let der = general_purpose::STANDARD
            .decode(cer)
            .map_err(|e| ProviderError::Decode {
                encoding: "base64".to_string(),
                reason: e.to_string(),
            })?;
        Ok((encode_block(&pem_block(CERTIFICATE_TAG, der)), version))
    }
}
