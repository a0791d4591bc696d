//! S3 bucket naming rules
//!
//! Names are checked before any request so an obviously bad override
//! (say `MINIO_BUCKET_DOCUMENTS=My Docs`) fails with a readable reason
//! instead of a signature or URI error from the HTTP layer.

use std::net::Ipv4Addr;

pub const MIN_BUCKET_NAME_LEN: usize = 3;
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// Validate a bucket name, returning the violated rule on failure
pub fn validate_bucket_name(name: &str) -> Result<(), &'static str> {
    if name.len() < MIN_BUCKET_NAME_LEN || name.len() > MAX_BUCKET_NAME_LEN {
        return Err("must be between 3 and 63 characters long");
    }

    if !name
        .bytes()
        .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-'))
    {
        return Err("may only contain lowercase letters, digits, '.' and '-'");
    }

    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return Err("must start and end with a letter or digit");
    }

    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err("must not contain '..', '.-' or '-.'");
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err("must not be formatted as an IP address");
    }

    Ok(())
}
