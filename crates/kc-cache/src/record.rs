//! Stored records and their binary encoding.
//!
//! Values are stored as opaque bytes. Identity records are reduced to their
//! identifying fields before encoding: caches only need to know *who* a
//! credential belongs to, and the full user is reloaded from storage on use.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::{CacheError, CacheResult};

/// A user identity attached to a cached credential.
///
/// Only `id` and `realm_id` are persisted. The remaining fields are dropped
/// when the record is stored and come back empty on read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    /// User ID.
    pub id: Uuid,
    /// Realm the user belongs to.
    pub realm_id: Uuid,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Custom user attributes.
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

impl Identity {
    /// Creates an identity with only its identifying fields set.
    #[must_use]
    pub fn new(id: Uuid, realm_id: Uuid) -> Self {
        Self {
            id,
            realm_id,
            ..Self::default()
        }
    }

    /// Returns the identity as it survives a round trip through the cache.
    #[must_use]
    pub fn stripped(&self) -> Self {
        Self::new(self.id, self.realm_id)
    }
}

/// A value held in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A user identity, stored in reduced form.
    Identity(Identity),
    /// Any other payload, stored as-is.
    Data(serde_json::Value),
}

impl Record {
    /// Creates a data record from any serializable value.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::Serialization` if the value cannot be represented.
    pub fn data<T: Serialize>(value: &T) -> CacheResult<Self> {
        Ok(Self::Data(serde_json::to_value(value)?))
    }

    /// Converts a data record back into a typed value.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::Serialization` if this is an identity record or the
    /// payload does not fit `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> CacheResult<T> {
        match self {
            Self::Data(value) => Ok(serde_json::from_value(value)?),
            Self::Identity(_) => Err(CacheError::Serialization(
                "identity record cannot be read as data".to_string(),
            )),
        }
    }

    /// Returns the identity, if this is an identity record.
    #[must_use]
    pub const fn as_identity(&self) -> Option<&Identity> {
        match self {
            Self::Identity(identity) => Some(identity),
            Self::Data(_) => None,
        }
    }
}

impl From<Identity> for Record {
    fn from(identity: Identity) -> Self {
        Self::Identity(identity)
    }
}

impl From<serde_json::Value> for Record {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

#[derive(Serialize, Deserialize)]
struct IdentityRef {
    id: Uuid,
    realm_id: Uuid,
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum StoredRef<'a> {
    Identity(IdentityRef),
    Data(&'a serde_json::Value),
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum Stored {
    Identity(IdentityRef),
    Data(serde_json::Value),
}

/// Encodes a record for storage.
///
/// ## Errors
///
/// Returns `CacheError::Serialization` if encoding fails.
pub fn serialize(record: &Record) -> CacheResult<Vec<u8>> {
    let stored = match record {
        Record::Identity(identity) => StoredRef::Identity(IdentityRef {
            id: identity.id,
            realm_id: identity.realm_id,
        }),
        Record::Data(value) => StoredRef::Data(value),
    };
    Ok(serde_json::to_vec(&stored)?)
}

/// Decodes a stored record.
///
/// ## Errors
///
/// Returns `CacheError::Serialization` if the bytes were not produced by
/// [`serialize`].
pub fn deserialize(bytes: &[u8]) -> CacheResult<Record> {
    let record = match serde_json::from_slice(bytes)? {
        Stored::Identity(IdentityRef { id, realm_id }) => {
            Record::Identity(Identity::new(id, realm_id))
        }
        Stored::Data(value) => Record::Data(value),
    };
    Ok(record)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            realm_id: Uuid::new_v4(),
            username: Some("alice".to_string()),
            email: Some("alice@example.com".to_string()),
            attributes: HashMap::from([("dept".to_string(), vec!["eng".to_string()])]),
        }
    }

    #[test]
    fn data_round_trip() {
        let records = [
            Record::Data(json!({"token": "abc", "scopes": ["openid", "profile"]})),
            Record::Data(json!(42)),
            Record::Data(json!(null)),
            Record::Data(json!("plain")),
        ];
        for record in records {
            let bytes = serialize(&record).unwrap();
            assert_eq!(deserialize(&bytes).unwrap(), record);
        }
    }

    #[test]
    fn identity_keeps_only_identifying_fields() {
        let identity = full_identity();
        let bytes = serialize(&Record::Identity(identity.clone())).unwrap();

        let stored: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            stored["value"].as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["id", "realm_id"]
        );

        let decoded = deserialize(&bytes).unwrap();
        assert_eq!(decoded, Record::Identity(identity.stripped()));
        assert_ne!(decoded, Record::Identity(identity));
    }

    #[test]
    fn identity_shaped_data_is_not_stripped() {
        let record = Record::data(&full_identity()).unwrap();
        let decoded = deserialize(&serialize(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
        let back: Identity = decoded.into_data().unwrap();
        assert_eq!(back.username.as_deref(), Some("alice"));
    }

    #[test]
    fn invalid_bytes_fail_to_decode() {
        assert!(matches!(
            deserialize(b"not json"),
            Err(CacheError::Serialization(_))
        ));
        assert!(matches!(
            deserialize(br#"{"kind":"unknown","value":1}"#),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn identity_is_not_data() {
        let record = Record::from(Identity::new(Uuid::nil(), Uuid::nil()));
        assert!(record.as_identity().is_some());
        assert!(record.into_data::<serde_json::Value>().is_err());
    }
}
