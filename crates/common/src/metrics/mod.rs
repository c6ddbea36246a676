//! Metrics and observability utilities
//!
//! Metric descriptions for the `metrics` facade plus the optional Prometheus
//! exporter. Recording happens at the call sites with the `metrics` macros.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        "docindex_errors_total",
        Unit::Count,
        "Error responses by kind (client, server)"
    );

    // Ingestion metrics
    describe_counter!(
        "docindex_documents_indexed_total",
        Unit::Count,
        "Documents written to the index"
    );

    describe_counter!(
        "docindex_documents_unchanged_total",
        Unit::Count,
        "Uploads skipped because the same content was already indexed"
    );

    describe_counter!(
        "docindex_chunks_created_total",
        Unit::Count,
        "Chunks written to the vector store"
    );

    describe_histogram!(
        "docindex_ingestion_duration_seconds",
        Unit::Seconds,
        "Document extraction, embedding and indexing latency"
    );

    // Query metrics
    describe_counter!(
        "docindex_queries_total",
        Unit::Count,
        "Total number of queries"
    );

    describe_histogram!(
        "docindex_query_duration_seconds",
        Unit::Seconds,
        "Query latency including retrieval and synthesis"
    );

    describe_histogram!(
        "docindex_synthesis_duration_seconds",
        Unit::Seconds,
        "LLM answer synthesis latency"
    );

    // Embedding metrics
    describe_counter!(
        "docindex_embedding_requests_total",
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        "docindex_embedding_duration_seconds",
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    describe_counter!(
        "docindex_embedding_errors_total",
        Unit::Count,
        "Total embedding API errors"
    );
}

/// Install the Prometheus exporter on `0.0.0.0:<port>`; port 0 leaves metrics unexported
pub fn install_prometheus(port: u16) -> anyhow::Result<()> {
    if port == 0 {
        tracing::debug!("Prometheus exporter disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
