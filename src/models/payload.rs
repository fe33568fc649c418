//! Wire payloads for the marketing platform API
//!
//! Request and response bodies for the `/fieldValues` and `/contactTags`
//! endpoints.

use serde::{Deserialize, Serialize};

use super::record::{ContactId, FieldId, TagId};

/// Response of `GET /fieldValues`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldValuesResponse {
    /// Matching field-value records, in platform order
    #[serde(default, rename = "fieldValues")]
    pub field_values: Vec<FieldValueRecord>,
}

impl FieldValuesResponse {
    /// Contact of the first matching record, if any
    pub fn first_contact(&self) -> Option<&ContactId> {
        self.field_values.first().and_then(|fv| fv.contact.as_ref())
    }
}

/// A single field-value record returned by the platform
///
/// Only the owning contact is read. The record's `field` and `value` may come
/// back in any JSON shape and are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldValueRecord {
    /// Owning contact
    #[serde(default)]
    pub contact: Option<ContactId>,
}

/// Body of `POST /contactTags`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactTagRequest {
    /// Contact/tag association
    #[serde(rename = "contactTag")]
    pub contact_tag: ContactTag,
}

/// Contact/tag association
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactTag {
    pub contact: ContactId,
    pub tag: TagId,
}

impl ContactTagRequest {
    /// Build a tag request for a contact
    pub fn new(contact: ContactId, tag: TagId) -> Self {
        Self {
            contact_tag: ContactTag { contact, tag },
        }
    }
}

/// Body of `POST /fieldValues`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValueRequest {
    /// Field value to create or update
    #[serde(rename = "fieldValue")]
    pub field_value: FieldValueWrite,
}

/// Field value to create or update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValueWrite {
    pub contact: ContactId,
    pub field: FieldId,
    pub value: String,
}

impl FieldValueRequest {
    /// Build a field-value write for a contact
    pub fn new(contact: ContactId, field: FieldId, value: impl Into<String>) -> Self {
        Self {
            field_value: FieldValueWrite {
                contact,
                field,
                value: value.into(),
            },
        }
    }
}
