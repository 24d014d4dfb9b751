//! Password and content digests used by the account store

use md5::Md5;
use sha1::{Digest, Sha1};

/// Digest stored for a password: hex-encoded SHA-1 of the password followed by the salt.
pub fn password_digest(password: &str, salt: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hex-encoded MD5 of serialized content, used as the suffix of revision tokens.
///
/// Only distinguishes successive revisions; it is not an integrity check.
pub fn content_hash(serialized: &str) -> String {
    hex::encode(Md5::digest(serialized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_password_digest_known_vector() {
        // SHA-1("abc")
        assert_eq!(
            password_digest("ab", "c"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_password_digest_depends_on_salt() {
        assert_ne!(
            password_digest("secret", "salt-1"),
            password_digest("secret", "salt-2")
        );
    }

    #[test]
    fn test_content_hash_known_vectors() {
        assert_eq!(content_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    proptest! {
        #[test]
        fn test_password_digest_is_concatenation(
            password in "[ -~]{0,32}",
            salt in "[ -~]{0,32}"
        ) {
            let joined = format!("{password}{salt}");
            prop_assert_eq!(password_digest(&password, &salt), password_digest(&joined, ""));
        }

        #[test]
        fn test_digests_are_lowercase_hex(input in ".{0,64}") {
            let sha = password_digest(&input, "");
            let md5 = content_hash(&input);

            prop_assert_eq!(sha.len(), 40);
            prop_assert_eq!(md5.len(), 32);
            prop_assert!(sha.chars().chain(md5.chars()).all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }
}
