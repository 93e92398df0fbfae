//! On-disk layout of the user directory.
//!
//! ```text
//! metadata: "version" -> [SCHEMA_VERSION]
//! users:    username  -> raw X25519 public key
//! ```

/// Namespace holding the schema marker.
pub const METADATA_NAMESPACE: &str = "metadata";

/// Namespace holding the credential records.
pub const USERS_NAMESPACE: &str = "users";

/// Every namespace the directory opens.
pub const NAMESPACES: &[&str] = &[METADATA_NAMESPACE, USERS_NAMESPACE];

/// Key of the schema marker.
pub const VERSION_KEY: &[u8] = b"version";

/// Current schema version.
pub const SCHEMA_VERSION: u8 = 0;

/// Outcome of inspecting a stored version marker.
#[derive(Debug, PartialEq, Eq)]
pub enum VersionCheck {
    /// No marker: freshly created store.
    Absent,
    /// Marker present and equal to ours.
    Compatible,
    /// Marker present with any other value or length.
    Incompatible(Vec<u8>),
}

pub fn check_version(stored: Option<Vec<u8>>) -> VersionCheck {
    match stored {
        None => VersionCheck::Absent,
        Some(v) if v.as_slice() == [SCHEMA_VERSION] => VersionCheck::Compatible,
        Some(v) => VersionCheck::Incompatible(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_version() {
        assert_eq!(check_version(None), VersionCheck::Absent);
        assert_eq!(check_version(Some(vec![0])), VersionCheck::Compatible);
        assert_eq!(
            check_version(Some(vec![1])),
            VersionCheck::Incompatible(vec![1])
        );
        assert_eq!(
            check_version(Some(vec![0, 0])),
            VersionCheck::Incompatible(vec![0, 0])
        );
        assert_eq!(check_version(Some(vec![])), VersionCheck::Incompatible(vec![]));
    }
}
