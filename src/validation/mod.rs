use serde::Serialize;
use std::fmt;

/// Number of characters in a YouTube video ID
pub const VIDEO_ID_LENGTH: usize = 11;

/// Reasons a raw string is not a well-formed video ID
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("video ID must be exactly 11 characters, got {length}")]
    BadLength { length: usize },

    #[error("video ID contains invalid character {character:?}")]
    BadCharset { character: char },
}

/// A syntactically valid YouTube video ID.
///
/// The only way to obtain one is [`VideoId::parse`], so anything holding a
/// `VideoId` has already passed the shape check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Validate raw request input
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let length = raw.chars().count();
        if length != VIDEO_ID_LENGTH {
            return Err(ValidationError::BadLength { length });
        }

        if let Some(character) = raw.chars().find(|c| !is_id_char(*c)) {
            return Err(ValidationError::BadCharset { character });
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed_ids() {
        for raw in ["dQw4w9WgXcQ", "eK_KWWxU6gY", "_NuH3D4SN-c", "-----------", "AAAAAAAAAAA"] {
            let id = VideoId::parse(raw).unwrap();
            assert_eq!(id.as_str(), raw);
            assert_eq!(id.to_string(), raw);
        }
    }

    #[test]
    fn test_rejects_wrong_length() {
        for raw in ["", "short", "dQw4w9WgXc", "dQw4w9WgXcQQ", "https://youtu.be/dQw4w9WgXcQ"] {
            assert_eq!(
                VideoId::parse(raw),
                Err(ValidationError::BadLength { length: raw.chars().count() }),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_rejects_bad_characters() {
        assert_eq!(
            VideoId::parse("dQw4w9WgXc!"),
            Err(ValidationError::BadCharset { character: '!' })
        );
        assert_eq!(
            VideoId::parse("dQw4 9WgXcQ"),
            Err(ValidationError::BadCharset { character: ' ' })
        );
        assert_eq!(
            VideoId::parse("dQw4w9WgX/Q"),
            Err(ValidationError::BadCharset { character: '/' })
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 11 characters, 12 bytes
        let raw = "dQw4w9WgXcé";
        assert_eq!(raw.chars().count(), 11);
        assert_eq!(
            VideoId::parse(raw),
            Err(ValidationError::BadCharset { character: 'é' })
        );
    }

    #[test]
    fn test_length_checked_before_charset() {
        assert_eq!(
            VideoId::parse("bad!"),
            Err(ValidationError::BadLength { length: 4 })
        );
    }
}
