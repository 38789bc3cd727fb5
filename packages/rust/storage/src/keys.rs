//! Object key generation.
//!
//! Keys look like `uploads/1718000000000-k3j9x2ab.jpg`. The timestamp plus a
//! random suffix makes collisions unlikely; nothing enforces global
//! uniqueness, and uploads never overwrite, so a collision surfaces as a
//! rejected upload.

use std::path::Path;

use crate::{StorageError, StorageResult};

/// Length of the base36 random component.
const RANDOM_LEN: usize = 8;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build a fresh object key under `prefix` for a file named `file_name`.
///
/// The extension comes from the file name, falling back to the media type's
/// subtype (`image/png` → `png`), then to `bin`.
pub fn object_key(prefix: &str, file_name: &str, media_type: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = random_base36(RANDOM_LEN);
    let ext = extension_for(file_name, media_type);
    let prefix = prefix.trim_matches('/');

    if prefix.is_empty() {
        format!("{millis}-{random}.{ext}")
    } else {
        format!("{prefix}/{millis}-{random}.{ext}")
    }
}

/// Reject keys that could escape the bucket.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn extension_for(file_name: &str, media_type: &str) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(sanitize_ext);

    from_name
        .or_else(|| {
            media_type
                .split_once('/')
                .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype))
                .and_then(sanitize_ext)
        })
        .unwrap_or_else(|| "bin".to_string())
}

fn sanitize_ext(raw: &str) -> Option<String> {
    let ext = raw.trim().to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

fn random_base36(len: usize) -> String {
    let mut n: u64 = rand::random();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_has_prefix_timestamp_random_and_extension() {
        let key = object_key("uploads", "selfie.JPG", "image/jpeg");
        let rest = key.strip_prefix("uploads/").expect("prefix");
        let (stem, ext) = rest.rsplit_once('.').expect("extension");
        assert_eq!(ext, "jpg");

        let (millis, random) = stem.split_once('-').expect("dash");
        assert!(millis.parse::<i64>().expect("millis") > 1_600_000_000_000);
        assert_eq!(random.len(), RANDOM_LEN);
        assert!(random.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn extension_falls_back_to_media_type() {
        assert!(object_key("uploads", "camera-upload", "image/png").ends_with(".png"));
        assert!(object_key("uploads", "drawing", "image/svg+xml").ends_with(".svg"));
        assert!(object_key("uploads", "blob", "weird").ends_with(".bin"));
    }

    #[test]
    fn prefix_slashes_are_normalized() {
        let key = object_key("/uploads/", "a.webp", "image/webp");
        assert!(key.starts_with("uploads/"));
        assert!(!key.contains("//"));
    }

    #[test]
    fn consecutive_keys_differ() {
        let a = object_key("uploads", "a.png", "image/png");
        let b = object_key("uploads", "a.png", "image/png");
        assert_ne!(a, b);
    }

    #[test]
    fn traversal_keys_rejected() {
        assert!(validate_key("uploads/a.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path.png").is_err());
        assert!(validate_key("").is_err());
    }
}
