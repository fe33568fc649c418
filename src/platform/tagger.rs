//! Abandoned-cart tag application

use std::sync::Arc;
use tracing::{error, info};

use super::CONTACT_TAGS_PATH;
use crate::error::ApiError;
use crate::models::{ContactId, ContactTagRequest, TagId};
use crate::sync::RateLimitedClient;

/// Attaches the configured tag to contacts
#[derive(Debug, Clone)]
pub struct TagApplier {
    client: Arc<RateLimitedClient>,
    tag: TagId,
}

impl TagApplier {
    pub fn new(client: Arc<RateLimitedClient>, tag: TagId) -> Self {
        Self { client, tag }
    }

    /// Tag a contact via `POST /contactTags`
    ///
    /// The outcome is logged here; callers may ignore the returned result.
    pub async fn apply(&self, contact: &ContactId) -> Result<(), ApiError> {
        let request = ContactTagRequest::new(contact.clone(), self.tag.clone());

        match self.client.post(CONTACT_TAGS_PATH, &request).await {
            Ok(_) => {
                info!(tag_id = %self.tag, contact_id = %contact, "Tag added to contact");
                Ok(())
            }
            Err(err) => {
                error!(
                    tag_id = %self.tag,
                    contact_id = %contact,
                    error = %err,
                    "Failed to add tag"
                );
                Err(err)
            }
        }
    }
}
