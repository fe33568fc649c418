//! Cart-value custom field writes

use std::sync::Arc;
use tracing::{error, info};

use super::FIELD_VALUES_PATH;
use crate::error::ApiError;
use crate::models::{ContactId, FieldId, FieldValueRequest};
use crate::sync::RateLimitedClient;

/// Creates or updates the cart-value field on contacts
#[derive(Debug, Clone)]
pub struct AttributeWriter {
    client: Arc<RateLimitedClient>,
    field: FieldId,
}

impl AttributeWriter {
    pub fn new(client: Arc<RateLimitedClient>, field: FieldId) -> Self {
        Self { client, field }
    }

    /// Write `value` into the cart-value field via `POST /fieldValues`
    pub async fn write(&self, contact: &ContactId, value: &str) -> Result<(), ApiError> {
        let request = FieldValueRequest::new(contact.clone(), self.field.clone(), value);

        match self.client.post(FIELD_VALUES_PATH, &request).await {
            Ok(_) => {
                info!(
                    field_id = %self.field,
                    contact_id = %contact,
                    "Created/updated field value for contact"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    field_id = %self.field,
                    contact_id = %contact,
                    error = %err,
                    "Failed to create field value"
                );
                Err(err)
            }
        }
    }
}
