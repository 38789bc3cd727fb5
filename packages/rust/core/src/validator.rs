//! Input validation: the first gate of every attempt.

use skinscan_shared::{SourceFile, ValidationError};

/// Media type prefix every accepted file must carry.
const IMAGE_PREFIX: &str = "image/";

/// Accept only files whose declared media type is an image type.
pub fn validate(file: &SourceFile) -> Result<(), ValidationError> {
    let declared = file.media_type.trim().to_ascii_lowercase();
    if declared.starts_with(IMAGE_PREFIX) && declared.len() > IMAGE_PREFIX.len() {
        return Ok(());
    }

    Err(ValidationError::NotAnImage {
        media_type: file.media_type.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(media_type: &str) -> SourceFile {
        SourceFile::new("upload", media_type, vec![1, 2, 3])
    }

    #[test]
    fn accepts_image_types() {
        for t in ["image/jpeg", "image/png", "IMAGE/WEBP", " image/heic"] {
            assert!(validate(&file(t)).is_ok(), "{t} should be accepted");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for t in ["text/plain", "application/pdf", "video/mp4", "", "image/", "imagex/png"] {
            let err = validate(&file(t)).unwrap_err();
            assert_eq!(
                err,
                ValidationError::NotAnImage {
                    media_type: t.to_string()
                }
            );
        }
    }
}
