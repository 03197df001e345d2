pub mod descriptor;
pub mod encoding;

pub use descriptor::{
    object_uid, object_version, parse_objects, validate_file_name, KeyVaultObject,
    ObjectDescriptor, ObjectType,
};
pub use encoding::{
    decode_content, validate_encoding, validate_format, ObjectEncoding, ObjectFormat,
};
