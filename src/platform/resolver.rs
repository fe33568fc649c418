//! Contact resolution by custom-field value
//!
//! Looks up `GET /fieldValues?filters[fieldid]=..&filters[val]=..` and takes
//! the contact of the first returned field value.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::FIELD_VALUES_PATH;
use crate::error::ApiError;
use crate::models::{ContactId, FieldId, FieldValuesResponse};
use crate::sync::RateLimitedClient;

/// Resolves identity keys to platform contacts
#[derive(Debug, Clone)]
pub struct ContactResolver {
    client: Arc<RateLimitedClient>,
    correlation_field: FieldId,
}

impl ContactResolver {
    /// Create a resolver matching against the given correlation field
    pub fn new(client: Arc<RateLimitedClient>, correlation_field: FieldId) -> Self {
        Self {
            client,
            correlation_field,
        }
    }

    /// Resolve an identity key to a contact
    ///
    /// Returns `None` both when no contact matches and when the lookup fails;
    /// use [`lookup`](Self::lookup) to tell the two apart.
    pub async fn resolve(&self, identity_key: &str) -> Option<ContactId> {
        match self.lookup(identity_key).await {
            Ok(contact) => contact,
            Err(err) => {
                warn!(
                    identity_key = identity_key,
                    error = %err,
                    "Contact lookup failed, treating as not found"
                );
                None
            }
        }
    }

    /// Look up the contact owning `identity_key` in the correlation field
    pub async fn lookup(&self, identity_key: &str) -> Result<Option<ContactId>, ApiError> {
        let query = [
            ("filters[fieldid]", self.correlation_field.to_string()),
            ("filters[val]", identity_key.to_string()),
        ];

        let response: FieldValuesResponse =
            self.client.get_json(FIELD_VALUES_PATH, &query).await?;

        match response.first_contact() {
            Some(contact) => {
                debug!(
                    identity_key = identity_key,
                    contact_id = %contact,
                    matches = response.field_values.len(),
                    "Contact resolved"
                );
                Ok(Some(contact.clone()))
            }
            None => {
                info!(
                    field_id = %self.correlation_field,
                    identity_key = identity_key,
                    "No contact found for field value"
                );
                Ok(None)
            }
        }
    }
}
