//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cart_sync::config::{FieldsConfig, PlatformConfig, RateLimitConfig, RetryConfig, SyncConfig};
use cart_sync::models::{FieldId, TagId};
use cart_sync::sync::{RateLimitedClient, Sleeper, SyncOrchestrator};

pub const CORRELATION_FIELD: u64 = 4;
pub const CART_VALUE_FIELD: u64 = 823;
pub const ABANDONED_CART_TAG: u64 = 6443;

/// Sleeper that records requested durations and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Create a platform configuration pointing at a mock server
pub fn create_test_platform_config(uri: &str) -> PlatformConfig {
    PlatformConfig {
        base_url: uri.to_string(),
        api_token: "test-token".to_string(),
        request_timeout_secs: 5,
    }
}

/// Field and tag identifiers used across tests
pub fn create_test_fields_config() -> FieldsConfig {
    FieldsConfig {
        correlation_field_id: FieldId::from(CORRELATION_FIELD),
        cart_value_field_id: FieldId::from(CART_VALUE_FIELD),
        tag_id: TagId::from(ABANDONED_CART_TAG),
    }
}

/// Create a platform client with a recording sleeper
pub fn create_test_client(
    uri: &str,
    max_concurrent: usize,
    sleeper: Arc<RecordingSleeper>,
) -> Arc<RateLimitedClient> {
    let client = RateLimitedClient::with_sleeper(
        &create_test_platform_config(uri),
        RetryConfig::default(),
        RateLimitConfig {
            min_interval_ms: 0,
            max_concurrent,
        },
        sleeper,
    )
    .expect("Failed to create test client");
    Arc::new(client)
}

/// Create an orchestrator against a mock server
pub fn create_test_orchestrator(
    uri: &str,
    max_concurrent_records: usize,
    sleeper: Arc<RecordingSleeper>,
) -> SyncOrchestrator {
    let client = create_test_client(uri, max_concurrent_records, sleeper);
    SyncOrchestrator::with_client(
        client,
        &create_test_fields_config(),
        SyncConfig {
            max_concurrent_records,
        },
    )
}
