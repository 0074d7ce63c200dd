//! Registered gateway clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mqgate_core::{ClientId, DomainError, DomainResult, Entity};

/// Lookup secret a client exchanges for a bearer token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Fresh random key (UUIDv4, not time-ordered).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Identity record used for credential lookup and issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: ClientId,
    pub name: String,
    pub api_key: ApiKey,
}

impl ClientRecord {
    /// New record with a generated id and API key.
    pub fn register(name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: ClientId::new(),
            name: normalize_name(name)?,
            api_key: ApiKey::generate(),
        })
    }

    /// Rename and rotate the API key.
    pub fn renamed(&self, name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: self.id,
            name: normalize_name(name)?,
            api_key: ApiKey::generate(),
        })
    }
}

impl Entity for ClientRecord {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_trims_name_and_generates_key() {
        let record = ClientRecord::register("  SolutionTech ").unwrap();
        assert_eq!(record.name, "SolutionTech");
        assert!(Uuid::parse_str(record.api_key.as_str()).is_ok());
    }

    #[test]
    fn register_rejects_blank_name() {
        assert!(matches!(
            ClientRecord::register("   "),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn rename_keeps_id_and_rotates_key() {
        let original = ClientRecord::register("acme").unwrap();
        let renamed = original.renamed("acme-2").unwrap();
        assert_eq!(renamed.id, original.id);
        assert_eq!(renamed.name, "acme-2");
        assert_ne!(renamed.api_key, original.api_key);
    }

    #[test]
    fn serializes_with_camel_case_api_key() {
        let record = ClientRecord::register("acme").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["apiKey"], record.api_key.as_str());
        assert_eq!(json["id"], record.id.to_string());
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::from_string("15048f9e-0b12-4661-8d53-22e06871eeba");
        assert!(!format!("{key:?}").contains("15048f9e"));
    }
}
