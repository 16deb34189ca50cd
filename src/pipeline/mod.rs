//! Ingestion pipeline: producer, worker pool, orchestration.

pub mod context;
pub mod orchestrator;
pub mod producer;
pub mod worker;

pub use context::{PipelineChannels, WorkerContext, create_pipeline_channels};
pub use orchestrator::{Pipeline, ingest_archive, log_summary};
pub use producer::{ProducerSummary, run_producer, spawn_producer};
pub use worker::{process_entry, spawn_workers};
