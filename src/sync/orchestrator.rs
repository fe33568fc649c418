//! Per-record reconciliation pipeline
//!
//! For every abandoned-cart record the orchestrator resolves the owning
//! contact, then tags it and writes the cart value. A record whose contact
//! cannot be resolved is skipped. Tagging and the attribute write are both
//! attempted once a contact is known, and no failure stops the run.
//!
//! Record lifecycle:
//!
//! ```text
//! RESOLVING -> RESOLVED -> WRITING -> DONE
//!           \-> UNRESOLVED -> SKIPPED
//! ```

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::{Config, FieldsConfig, SyncConfig};
use crate::error::{ApiError, AppError};
use crate::models::{ContactId, InputRecord};
use crate::platform::{AttributeWriter, ContactResolver, TagApplier};
use crate::source::CartSource;
use crate::sync::RateLimitedClient;

/// Stage of a record in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStage {
    Resolving,
    Resolved,
    Unresolved,
    Writing,
    Done,
    Skipped,
}

impl RecordStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStage::Resolving => "resolving",
            RecordStage::Resolved => "resolved",
            RecordStage::Unresolved => "unresolved",
            RecordStage::Writing => "writing",
            RecordStage::Done => "done",
            RecordStage::Skipped => "skipped",
        }
    }
}

/// Final outcome of one record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// No contact was resolved; nothing was written
    Skipped,
    /// Contact resolved; tag and attribute were both attempted
    Done {
        contact: ContactId,
        tag: Result<(), ApiError>,
        attribute: Result<(), ApiError>,
    },
}

impl RecordOutcome {
    /// Terminal pipeline stage of this outcome
    pub fn stage(&self) -> RecordStage {
        match self {
            RecordOutcome::Skipped => RecordStage::Skipped,
            RecordOutcome::Done { .. } => RecordStage::Done,
        }
    }
}

/// Counts of record outcomes for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub total: usize,
    pub done: usize,
    pub skipped: usize,
    pub tag_failures: usize,
    pub attribute_failures: usize,
}

impl SyncSummary {
    /// Fold one outcome into the summary
    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.total += 1;
        match outcome {
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Done { tag, attribute, .. } => {
                self.done += 1;
                if tag.is_err() {
                    self.tag_failures += 1;
                }
                if attribute.is_err() {
                    self.attribute_failures += 1;
                }
            }
        }
    }
}

/// Drives resolution, tagging, and attribute writes for a record set
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    resolver: ContactResolver,
    tagger: TagApplier,
    writer: AttributeWriter,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        resolver: ContactResolver,
        tagger: TagApplier,
        writer: AttributeWriter,
        config: SyncConfig,
    ) -> Self {
        Self {
            resolver,
            tagger,
            writer,
            config,
        }
    }

    /// Build all components around one shared client
    pub fn with_client(
        client: Arc<RateLimitedClient>,
        fields: &FieldsConfig,
        config: SyncConfig,
    ) -> Self {
        Self::new(
            ContactResolver::new(Arc::clone(&client), fields.correlation_field_id.clone()),
            TagApplier::new(Arc::clone(&client), fields.tag_id.clone()),
            AttributeWriter::new(client, fields.cart_value_field_id.clone()),
            config,
        )
    }

    /// Build the orchestrator and its client from application configuration
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = RateLimitedClient::new(
            &config.platform,
            config.retry.clone(),
            config.rate_limit.clone(),
        )?;
        Ok(Self::with_client(
            Arc::new(client),
            &config.fields,
            config.sync.clone(),
        ))
    }

    /// Run one record through the pipeline
    pub async fn process_record(&self, record: &InputRecord) -> RecordOutcome {
        debug!(stage = RecordStage::Resolving.as_str(), "Resolving contact");

        let outcome = match self.resolver.resolve(&record.identity_key).await {
            Some(contact) => {
                debug!(
                    stage = RecordStage::Resolved.as_str(),
                    contact_id = %contact,
                    "Contact resolved"
                );
                self.write(contact, &record.cart_value).await
            }
            None => {
                debug!(stage = RecordStage::Unresolved.as_str(), "Contact not resolved");
                RecordOutcome::Skipped
            }
        };

        debug!(stage = outcome.stage().as_str(), "Record finished");
        outcome
    }

    async fn write(&self, contact: ContactId, cart_value: &str) -> RecordOutcome {
        debug!(
            stage = RecordStage::Writing.as_str(),
            contact_id = %contact,
            "Tagging contact and writing cart value"
        );

        let tag = self.tagger.apply(&contact).await;
        let attribute = self.writer.write(&contact, cart_value).await;

        RecordOutcome::Done {
            contact,
            tag,
            attribute,
        }
    }

    /// Process every record and summarize the outcomes
    ///
    /// Records run one after another unless `max_concurrent_records` is
    /// above one.
    pub async fn run(&self, records: Vec<InputRecord>) -> SyncSummary {
        info!(
            records = records.len(),
            max_concurrent_records = self.config.max_concurrent_records,
            "Starting abandoned cart sync"
        );

        let summary = if self.config.max_concurrent_records > 1 {
            self.run_concurrent(records).await
        } else {
            self.run_sequential(records).await
        };

        info!(
            total = summary.total,
            done = summary.done,
            skipped = summary.skipped,
            tag_failures = summary.tag_failures,
            attribute_failures = summary.attribute_failures,
            "Abandoned cart sync finished"
        );
        summary
    }

    /// Fetch records from a source and run them
    pub async fn run_source(&self, source: &dyn CartSource) -> Result<SyncSummary, AppError> {
        let records = source.fetch().await?;
        info!(
            source = source.name(),
            records = records.len(),
            "Retrieved abandoned cart records"
        );
        Ok(self.run(records).await)
    }

    async fn run_sequential(&self, records: Vec<InputRecord>) -> SyncSummary {
        let mut summary = SyncSummary::default();

        for (index, record) in records.iter().enumerate() {
            let span = record_span(index, record);
            let outcome = self.process_record(record).instrument(span).await;
            summary.record(&outcome);
        }

        summary
    }

    async fn run_concurrent(&self, records: Vec<InputRecord>) -> SyncSummary {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_records));
        let mut tasks = JoinSet::new();
        let mut summary = SyncSummary::default();

        for (index, record) in records.into_iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Record limiter closed, stopping dispatch");
                    break;
                }
            };

            let this = self.clone();
            let span = record_span(index, &record);
            tasks.spawn(
                async move {
                    let _permit = permit;
                    this.process_record(&record).await
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => error!(error = %e, "Record task failed"),
            }
        }

        summary
    }
}

fn record_span(index: usize, record: &InputRecord) -> tracing::Span {
    info_span!(
        "record",
        index = index,
        identity_key = %record.identity_key
    )
}
