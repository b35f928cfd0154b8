use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 of a byte slice.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_deterministic() {
        let h1 = hash_bytes(b"src/Foo.java");
        let h2 = hash_bytes(b"src/Foo.java");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // SHA-256 hex is 64 chars
    }

    #[test]
    fn hash_bytes_different_for_different_input() {
        let h1 = hash_bytes(b"src/Foo.java");
        let h2 = hash_bytes(b"src/foo.java");
        assert_ne!(h1, h2);
    }
}
