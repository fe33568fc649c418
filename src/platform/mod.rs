//! Marketing platform operations
//!
//! Each component wraps one platform endpoint and routes its traffic through
//! the shared [`RateLimitedClient`](crate::sync::RateLimitedClient).
//!
//! - [`resolver`]: maps an identity key to a contact via a custom-field lookup
//! - [`tagger`]: attaches the abandoned-cart tag to a contact
//! - [`attributes`]: writes the cart value into a contact custom field

pub mod attributes;
pub mod resolver;
pub mod tagger;

pub use attributes::AttributeWriter;
pub use resolver::ContactResolver;
pub use tagger::TagApplier;

/// Path of the field-value collection
pub const FIELD_VALUES_PATH: &str = "fieldValues";

/// Path of the contact-tag collection
pub const CONTACT_TAGS_PATH: &str = "contactTags";
