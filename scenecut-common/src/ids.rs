//! Deterministic identifier derivation
//!
//! The consuming editor binds a media UID permanently to a logical piece
//! of media the first time it imports it. Re-adding the same file under
//! a different UID is rejected, so UIDs must be a pure function of the
//! file's base name — never of its directory, creation order, or any
//! other transient state. Everything here is a salted one-way hash with
//! no I/O and no randomness.

use md5::{Digest, Md5};

/// Salt prefixed to every hashed identity.
const UID_SALT: &str = "scenecut_media_";

/// Derive the permanent UID for a media file from its base name.
///
/// Hashes only the file name, not the path: the same file added from a
/// different working directory must resolve to the same UID. The digest
/// is formatted as an uppercase 8-4-4-4-12 hex group so it reads like a
/// standard UUID, but it is fully deterministic.
///
/// # Examples
///
/// ```rust
/// use scenecut_common::ids::media_uid;
///
/// assert_eq!(media_uid("clip.mov"), media_uid("clip.mov"));
/// assert_ne!(media_uid("a.png"), media_uid("b.png"));
/// ```
pub fn media_uid(file_name: &str) -> String {
    let hex = salted_digest(file_name);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Derive a text-style definition ID unique per (text, context) pair.
///
/// Style definitions live in one flat namespace per document. A constant
/// ID collides as soon as a second overlay is added, so the ID is hashed
/// from both the text and the placement context that created it.
pub fn text_style_id(text: &str, context: &str) -> String {
    let hex = salted_digest(&format!("text_{context}_{text}"));
    format!("ts{}", &hex[0..8])
}

/// Format a resource ID from a registry counter value.
pub fn resource_id(index: usize) -> String {
    format!("r{index}")
}

fn salted_digest(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(UID_SALT.as_bytes());
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in digest {
        hex.push_str(&format!("{byte:02X}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_uid_is_deterministic() {
        assert_eq!(media_uid("speech1.mov"), media_uid("speech1.mov"));
    }

    #[test]
    fn test_media_uid_shape() {
        let uid = media_uid("cs.pitt.edu.png");
        let groups: Vec<&str> = uid.split('-').collect();
        assert_eq!(groups.len(), 5);
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        assert_eq!(lengths, vec![8, 4, 4, 4, 12]);
        assert!(uid
            .chars()
            .all(|c| c == '-' || c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_media_uid_differs_by_name() {
        assert_ne!(media_uid("a.png"), media_uid("b.png"));
    }

    #[test]
    fn test_text_style_id_shape() {
        let id = text_style_id("Hello", "line_0");
        assert!(id.starts_with("ts"));
        assert_eq!(id.len(), 10);
    }

    #[test]
    fn test_text_style_id_unique_per_text_and_context() {
        let a = text_style_id("Hello", "line_0");
        let b = text_style_id("World", "line_0");
        let c = text_style_id("Hello", "line_1");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_resource_id_format() {
        assert_eq!(resource_id(1), "r1");
        assert_eq!(resource_id(42), "r42");
    }
}
