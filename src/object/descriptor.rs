use crate::object::encoding::{validate_encoding, validate_format, ObjectEncoding, ObjectFormat};
use crate::utils::errors::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of vault object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Secret,
    Key,
    Certificate,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Secret => "secret",
            ObjectType::Key => "key",
            ObjectType::Certificate => "cert",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        [ObjectType::Secret, ObjectType::Key, ObjectType::Certificate]
            .into_iter()
            .find(|t| s.eq_ignore_ascii_case(t.as_str()))
            .ok_or_else(|| {
                ProviderError::InvalidObject(
                    "Invalid vaultObjectTypes. Should be secret, key, or cert".to_string(),
                )
            })
    }
}

/// One entry of the objects array, as written by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyVaultObject {
    pub object_name: String,
    pub object_alias: String,
    pub object_version: String,
    pub object_type: String,
    pub object_format: String,
    pub object_encoding: String,
}

/// Validated type, format and encoding of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub object_type: ObjectType,
    pub format: Option<ObjectFormat>,
    pub encoding: Option<ObjectEncoding>,
}

#[derive(Debug, Deserialize)]
struct StringArray {
    #[serde(default)]
    array: Vec<String>,
}

impl KeyVaultObject {
    /// Trim surrounding whitespace from every field
    pub fn normalize(&mut self) {
        self.object_name = self.object_name.trim().to_string();
        self.object_alias = self.object_alias.trim().to_string();
        self.object_version = self.object_version.trim().to_string();
        self.object_type = self.object_type.trim().to_string();
        self.object_format = self.object_format.trim().to_string();
        self.object_encoding = self.object_encoding.trim().to_string();
    }

    pub fn object_type(&self) -> Result<ObjectType> {
        self.object_type.parse()
    }

    /// Validate type, format and encoding together
    pub fn descriptor(&self) -> Result<ObjectDescriptor> {
        let object_type = self.object_type()?;
        let format = validate_format(&self.object_format, object_type)?;
        let encoding = validate_encoding(&self.object_encoding, object_type)?;
        Ok(ObjectDescriptor {
            object_type,
            format,
            encoding,
        })
    }

    /// Name of the file the content is delivered as
    pub fn file_name(&self) -> &str {
        if self.object_alias.is_empty() {
            &self.object_name
        } else {
            &self.object_alias
        }
    }

    /// Wrap an error with this object's identity
    pub fn context(&self, err: ProviderError) -> ProviderError {
        err.for_object(&self.object_type, &self.object_name, &self.object_version)
    }
}

/// Parse the objects attribute: a YAML `array` of YAML-encoded objects
pub fn parse_objects(objects: &str) -> Result<Vec<KeyVaultObject>> {
    if objects.trim().is_empty() {
        return Err(ProviderError::InvalidObject("objects is not set".to_string()));
    }

    let list: StringArray = serde_yaml::from_str(objects)?;
    tracing::debug!("unmarshaled objects yaml array: {:?}", list.array);

    let mut parsed = Vec::with_capacity(list.array.len());
    for (index, entry) in list.array.iter().enumerate() {
        let mut object: KeyVaultObject = serde_yaml::from_str(entry).map_err(|e| {
            ProviderError::InvalidObject(format!(
                "unmarshal failed for keyVaultObjects at index {index}, error: {e}"
            ))
        })?;
        object.normalize();
        parsed.push(object);
    }

    if parsed.is_empty() {
        return Err(ProviderError::InvalidObject(
            "objects array is empty".to_string(),
        ));
    }

    tracing::info!(count = parsed.len(), "unmarshaled key vault objects");
    Ok(parsed)
}

/// Make sure a file name stays inside the target directory
pub fn validate_file_name(file_name: &str) -> Result<()> {
    if file_name.is_empty() {
        return Err(ProviderError::InvalidObject(
            "file name must not be empty".to_string(),
        ));
    }
    if Path::new(file_name).is_absolute() || file_name.starts_with('/') {
        return Err(ProviderError::InvalidObject(
            "file name must be a relative path".to_string(),
        ));
    }
    let has_backstep = file_name
        .replace('\\', "/")
        .split('/')
        .any(|part| part == "..");
    if has_backstep || file_name.contains("..") {
        return Err(ProviderError::InvalidObject(
            "file name must not contain '..'".to_string(),
        ));
    }
    Ok(())
}

/// Unique identifier shown to users: `<object type>/<object name>`
pub fn object_uid(object_name: &str, object_type: &str) -> String {
    format!("{object_type}/{object_name}")
}

/// Version of a fetched object, taken from the last segment of its id.
///
/// e.g. `https://kindkv.vault.azure.net/secrets/actual/1f304204f3624873aab40231241243eb`
pub fn object_version(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_parse() {
        assert_eq!("secret".parse::<ObjectType>().unwrap(), ObjectType::Secret);
        assert_eq!(" KEY ".parse::<ObjectType>().unwrap(), ObjectType::Key);
        assert_eq!("Cert".parse::<ObjectType>().unwrap(), ObjectType::Certificate);
        assert!(matches!(
            "certificate".parse::<ObjectType>(),
            Err(ProviderError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_parse_objects_trims_every_field() {
        let objects = r#"
array:
  - |
    objectName: "  secret1 "
    objectAlias: " alias1"
    objectType: "secret  "
    objectVersion: " v1 "
    objectFormat: " pfx"
    objectEncoding: "base64 "
  - |
    objectName: key1
    objectType: key
"#;
        let parsed = parse_objects(objects).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed[0],
            KeyVaultObject {
                object_name: "secret1".to_string(),
                object_alias: "alias1".to_string(),
                object_version: "v1".to_string(),
                object_type: "secret".to_string(),
                object_format: "pfx".to_string(),
                object_encoding: "base64".to_string(),
            }
        );
        assert_eq!(parsed[1].object_name, "key1");
        assert_eq!(parsed[1].object_alias, "");
        assert_eq!(parsed[1].file_name(), "key1");
        assert_eq!(parsed[0].file_name(), "alias1");
    }

    #[test]
    fn test_parse_objects_errors() {
        assert!(parse_objects("").is_err());
        assert!(matches!(
            parse_objects("array: []"),
            Err(ProviderError::InvalidObject(_))
        ));
        assert!(matches!(
            parse_objects("array:\n  - \"objectName: [unterminated\""),
            Err(ProviderError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_descriptor_validation() {
        let object = KeyVaultObject {
            object_name: "cert1".to_string(),
            object_type: "cert".to_string(),
            object_format: "pfx".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            object.descriptor(),
            Err(ProviderError::InvalidFormat(_))
        ));

        let object = KeyVaultObject {
            object_name: "secret1".to_string(),
            object_type: "secret".to_string(),
            object_format: "PFX".to_string(),
            object_encoding: "Base64".to_string(),
            ..Default::default()
        };
        let descriptor = object.descriptor().unwrap();
        assert_eq!(descriptor.object_type, ObjectType::Secret);
        assert_eq!(descriptor.format, Some(ObjectFormat::Pfx));
        assert_eq!(descriptor.encoding, Some(ObjectEncoding::Base64));
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("secret1").is_ok());
        assert!(validate_file_name("dir/secret1").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("/etc/passwd").is_err());
        assert!(validate_file_name("../secret1").is_err());
        assert!(validate_file_name("dir/../../secret1").is_err());
        assert!(validate_file_name("dir\\..\\secret1").is_err());
        assert!(validate_file_name("secret..1").is_err());
    }

    #[test]
    fn test_object_version_and_uid() {
        assert_eq!(
            object_version("https://kindkv.vault.azure.net/secrets/actual/1f304204f3624873aab40231241243eb"),
            "1f304204f3624873aab40231241243eb"
        );
        assert_eq!(object_version("plain"), "plain");
        assert_eq!(object_version("trailing/"), "");
        assert_eq!(object_uid("secret1", "secret"), "secret/secret1");
    }
}
