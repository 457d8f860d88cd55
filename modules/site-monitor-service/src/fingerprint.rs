//! Content fingerprints.
//!
//! The fetched representation is hashed verbatim: no whitespace, markup or
//! metadata normalization happens first. Any byte-level difference in what
//! the fetcher returns counts as a change, including incidental formatting
//! from the crawler. MD5 keeps digests compatible with existing tracking
//! files.

use md5::{Digest, Md5};

/// Lower-case hex MD5 of the content's UTF-8 bytes (32 characters).
pub fn fingerprint(content: &str) -> String {
    hex::encode(Md5::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_values() {
        assert_eq!(fingerprint(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(fingerprint("hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let content = "<html><body>Pre-K standards</body></html>";
        assert_eq!(fingerprint(content), fingerprint(content));
        assert_eq!(fingerprint(content).len(), 32);
    }

    #[test]
    fn test_whitespace_changes_the_fingerprint() {
        assert_ne!(fingerprint("a b"), fingerprint("a  b"));
        assert_ne!(fingerprint("page"), fingerprint("page\n"));
    }
}
