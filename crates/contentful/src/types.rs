//! Entity types of the Contentful Management API.
//!
//! Field names follow the API's camelCase JSON. Every entity carries a
//! [`Sys`] block with its remote-assigned id and version.

use serde::{Deserialize, Serialize};

/// Default locale for new spaces.
pub const DEFAULT_LOCALE: &str = "en";

/// System metadata attached to every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    /// Remote-assigned identifier (empty until created).
    #[serde(default)]
    pub id: String,
    /// Entity type ("Space", "ApiKey", ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Optimistic-concurrency counter, bumped by the API on every mutation.
    #[serde(default)]
    pub version: u64,
    /// Owning space, for sub-resources of a space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Link>,
    /// Creation timestamp (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Sys {
    /// Whether the entity has not been created remotely yet.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }
}

/// A reference to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link metadata.
    pub sys: LinkSys,
}

/// Metadata of a [`Link`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    /// Id of the linked entity.
    pub id: String,
    /// Always "Link".
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Type of the linked entity ("Space").
    #[serde(default)]
    pub link_type: String,
}

impl Link {
    /// Create a link to a space.
    #[must_use]
    pub fn space(id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                id: id.into(),
                kind: "Link".to_string(),
                link_type: "Space".to_string(),
            },
        }
    }
}

/// A space: the top-level content container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Display name.
    pub name: String,
    /// Default locale; only honoured by the API at creation time.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_locale: String,
}

impl Space {
    /// Create a space that does not exist remotely yet.
    #[must_use]
    pub fn new(name: impl Into<String>, default_locale: impl Into<String>) -> Self {
        Self {
            sys: Sys::default(),
            name: name.into(),
            default_locale: default_locale.into(),
        }
    }
}

/// A delivery API key scoped to a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// System metadata; `sys.space` links the owning space.
    #[serde(default)]
    pub sys: Sys,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Delivery API token, generated by the API.
    #[serde(default)]
    pub access_token: String,
}

impl ApiKey {
    /// Create an API key that does not exist remotely yet.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            sys: Sys::default(),
            name: name.into(),
            description: description.into(),
            access_token: String::new(),
        }
    }

    /// Id of the owning space, from the nested space link.
    #[must_use]
    pub fn space_id(&self) -> Option<&str> {
        self.sys.space.as_ref().map(|link| link.sys.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_from_api_json() {
        let json = r#"{
            "sys": {
                "type": "Space",
                "id": "abc123",
                "version": 3,
                "createdAt": "2024-01-15T00:00:00Z"
            },
            "name": "Marketing"
        }"#;

        let space: Space = serde_json::from_str(json).unwrap();
        assert_eq!(space.sys.id, "abc123");
        assert_eq!(space.sys.kind, "Space");
        assert_eq!(space.sys.version, 3);
        assert_eq!(space.name, "Marketing");
        assert_eq!(space.default_locale, "");
        assert!(!space.sys.is_new());
    }

    #[test]
    fn test_api_key_from_api_json() {
        let json = r#"{
            "sys": {
                "type": "ApiKey",
                "id": "key456",
                "version": 1,
                "space": { "sys": { "type": "Link", "linkType": "Space", "id": "abc123" } }
            },
            "name": "Website",
            "description": "Delivery key for the website",
            "accessToken": "tok_123",
            "policies": [{ "effect": "allow", "actions": "all" }]
        }"#;

        let key: ApiKey = serde_json::from_str(json).unwrap();
        assert_eq!(key.sys.id, "key456");
        assert_eq!(key.space_id(), Some("abc123"));
        assert_eq!(key.description, "Delivery key for the website");
        assert_eq!(key.access_token, "tok_123");
    }

    #[test]
    fn test_api_key_without_description() {
        let json = r#"{ "sys": { "id": "k" }, "name": "bare" }"#;
        let key: ApiKey = serde_json::from_str(json).unwrap();
        assert_eq!(key.description, "");
        assert_eq!(key.space_id(), None);
    }

    #[test]
    fn test_new_entities_have_no_id() {
        assert!(Space::new("Docs", DEFAULT_LOCALE).sys.is_new());
        assert!(ApiKey::new("Docs", "").sys.is_new());
    }

    #[test]
    fn test_space_link() {
        let link = Link::space("abc123");
        assert_eq!(link.sys.id, "abc123");
        assert_eq!(link.sys.link_type, "Space");
    }
}
