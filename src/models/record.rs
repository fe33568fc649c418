//! Record and identifier models
//!
//! This module defines the abandoned-cart input record and the typed
//! identifiers used to address contacts, tags, and custom fields on the
//! marketing platform.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier assigned by the marketing platform
///
/// The platform hands out identifiers either as JSON numbers or as strings
/// depending on the endpoint. The JSON shape is kept so that values are
/// echoed back exactly as they were received or configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlatformId {
    /// Numeric identifier
    Number(u64),
    /// String identifier
    Text(String),
}

impl PlatformId {
    /// Parse a raw value, preferring the numeric form
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => PlatformId::Number(n),
            Err(_) => PlatformId::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformId::Number(n) => write!(f, "{}", n),
            PlatformId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for PlatformId {
    fn from(value: u64) -> Self {
        PlatformId::Number(value)
    }
}

impl From<&str> for PlatformId {
    fn from(value: &str) -> Self {
        PlatformId::Text(value.to_string())
    }
}

macro_rules! platform_id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub PlatformId);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<PlatformId> for $name {
            fn from(value: PlatformId) -> Self {
                Self(value)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(PlatformId::Number(value))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(PlatformId::Text(value.to_string()))
            }
        }
    };
}

platform_id_newtype!(
    /// Contact identifier resolved from an identity key
    ContactId
);

platform_id_newtype!(
    /// Tag marking a contact as having an abandoned cart
    TagId
);

platform_id_newtype!(
    /// Custom field identifier
    FieldId
);

/// One abandoned-cart entry produced by the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Value matched against the correlation custom field
    #[serde(alias = "user_id")]
    pub identity_key: String,

    /// Cart value written to the cart-value custom field
    #[serde(alias = "product_quantity_price", deserialize_with = "string_or_number")]
    pub cart_value: String,
}

impl InputRecord {
    /// Create a new input record
    pub fn new(identity_key: impl Into<String>, cart_value: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            cart_value: cart_value.into(),
        }
    }
}

/// Accept either a JSON string or a JSON number, keeping the textual form
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
