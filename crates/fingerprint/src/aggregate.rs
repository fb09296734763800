//! Aggregate hash over the fingerprints of several properties
//!
//! Layout, for each property in name order: the property name, then for each
//! entry in path order the normalized path, the one-byte type tag and the
//! content hash. Strings and hashes are length-prefixed by the [`Hasher`].
//!
//! [`Hasher`]: stamp_core::Hasher

use crate::fingerprint::PropertyFingerprints;
use stamp_core::{HashAlgorithm, HashCode};

pub fn combine(algorithm: HashAlgorithm, properties: &PropertyFingerprints) -> HashCode {
    let mut hasher = algorithm.hasher();
    for (name, collection) in properties {
        hasher.put_str(name);
        for entry in collection.iter() {
            hasher.put_str(entry.normalized_path.as_str());
            hasher.put_u8(entry.file_type.tag());
            hasher.put_hash(&entry.normalized_content_hash);
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{FileCollectionFingerprint, FileSystemLocationFingerprint};
    use stamp_core::NormalizedPath;
    use stamp_snapshot::FileType;

    fn collection(entries: &[(&str, &[u8])]) -> FileCollectionFingerprint {
        entries
            .iter()
            .map(|(path, content)| {
                FileSystemLocationFingerprint::new(
                    NormalizedPath::new(*path),
                    FileType::RegularFile,
                    HashAlgorithm::Sha256.hash_bytes(content),
                )
            })
            .collect()
    }

    #[test]
    fn test_layout_is_bit_exact() {
        let mut properties = PropertyFingerprints::new();
        properties.insert("sources".to_string(), collection(&[("Foo.java", b"class Foo {}")]));

        let content = HashAlgorithm::Sha256.hash_bytes(b"class Foo {}");
        let mut expected = Vec::new();
        expected.extend_from_slice(&7u32.to_le_bytes());
        expected.extend_from_slice(b"sources");
        expected.extend_from_slice(&8u32.to_le_bytes());
        expected.extend_from_slice(b"Foo.java");
        expected.push(0);
        expected.extend_from_slice(&32u32.to_le_bytes());
        expected.extend_from_slice(content.as_bytes());

        assert_eq!(
            combine(HashAlgorithm::Sha256, &properties),
            HashAlgorithm::Sha256.hash_bytes(&expected)
        );
    }

    #[test]
    fn test_deterministic_and_content_sensitive() {
        let build = |content: &[u8]| {
            let mut properties = PropertyFingerprints::new();
            properties.insert("b".to_string(), collection(&[("x", b"x"), ("y", content)]));
            properties.insert("a".to_string(), collection(&[("z", b"z")]));
            combine(HashAlgorithm::Xxh3_128, &properties)
        };
        assert_eq!(build(b"y"), build(b"y"));
        assert_ne!(build(b"y"), build(b"y2"));
    }

    #[test]
    fn test_property_name_takes_part() {
        let mut left = PropertyFingerprints::new();
        left.insert("a".to_string(), collection(&[("x", b"x")]));
        let mut right = PropertyFingerprints::new();
        right.insert("b".to_string(), collection(&[("x", b"x")]));
        assert_ne!(
            combine(HashAlgorithm::Sha256, &left),
            combine(HashAlgorithm::Sha256, &right)
        );
    }
}
