//! Errors raised by the lifecycle itself, independent of any remote API.

/// Remote errors a controller can surface.
///
/// The lifecycle only needs to recognise one condition: the remote system
/// reporting that an entity does not exist.
pub trait RemoteFailure: std::error::Error {
    /// Whether the remote reported the entity as missing.
    fn is_not_found(&self) -> bool;
}

/// Lifecycle misuse detected before or after talking to the remote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The import identifier could not be parsed. Raised before any remote call.
    #[error("invalid id {input:?} specified, should be in format {expected:?} for import")]
    ImportFormat {
        /// The identifier as given.
        input: String,
        /// The accepted format.
        expected: &'static str,
    },

    /// The import identifier parsed but the remote has no such entity.
    #[error("cannot import {resource_type} {id:?}: no such remote object")]
    ImportMissing {
        /// Resource type being imported.
        resource_type: &'static str,
        /// The identifier as given.
        id: String,
    },

    /// An operation that needs a remote id was called on an absent record.
    #[error("cannot {operation} {resource_type}: record has no remote id")]
    MissingId {
        /// Resource type.
        resource_type: &'static str,
        /// Operation attempted.
        operation: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_format_message() {
        let err = LifecycleError::ImportFormat {
            input: "noslash".to_string(),
            expected: "spaceId/keyId",
        };
        assert_eq!(
            err.to_string(),
            r#"invalid id "noslash" specified, should be in format "spaceId/keyId" for import"#
        );
    }

    #[test]
    fn test_missing_id_message() {
        let err = LifecycleError::MissingId {
            resource_type: "space",
            operation: "update",
        };
        assert!(err.to_string().contains("cannot update space"));
    }
}
