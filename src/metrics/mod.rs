//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transfer lifecycle counts
//! - Transaction submissions
//! - Error rates by kind

use crate::error::TransferResult;

use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, CounterVec, Encoder, Gauge, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Transfer metrics
    pub static ref TRANSFERS_STARTED: CounterVec = register_counter_vec!(
        "shardflow_transfers_started_total",
        "Total transfers started",
        &["kind"]
    ).unwrap();

    pub static ref TRANSFERS_COMPLETED: CounterVec = register_counter_vec!(
        "shardflow_transfers_completed_total",
        "Total transfers completed",
        &[]
    ).unwrap();

    pub static ref TRANSFERS_FAILED: CounterVec = register_counter_vec!(
        "shardflow_transfers_failed_total",
        "Total transfer operations failed by error kind",
        &["kind"]
    ).unwrap();

    pub static ref HOPS_SUBMITTED: CounterVec = register_counter_vec!(
        "shardflow_hops_submitted_total",
        "Total intermediate hop transactions submitted",
        &[]
    ).unwrap();

    pub static ref SETTLEMENTS_SUBMITTED: CounterVec = register_counter_vec!(
        "shardflow_settlements_submitted_total",
        "Total settlement transactions submitted",
        &[]
    ).unwrap();

    // Transaction metrics
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "shardflow_transactions_submitted_total",
        "Total raw transactions sent to the node",
        &[]
    ).unwrap();

    // Session metrics
    pub static ref PENDING_TRANSFERS: Gauge = register_gauge!(
        "shardflow_pending_transfers",
        "Transfers currently tracked in the session store"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> TransferResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();

        Ok(())
    }
}

async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

// Helper functions to record metrics

pub fn record_transfer_started(cross_chain: bool) {
    let kind = if cross_chain { "cross_chain" } else { "same_chain" };
    TRANSFERS_STARTED.with_label_values(&[kind]).inc();
    PENDING_TRANSFERS.inc();
}

pub fn record_transfer_completed() {
    TRANSFERS_COMPLETED.with_label_values(&[]).inc();
    PENDING_TRANSFERS.dec();
}

pub fn record_transfer_abandoned() {
    PENDING_TRANSFERS.dec();
}

pub fn record_transfer_failed(kind: &str) {
    TRANSFERS_FAILED.with_label_values(&[kind]).inc();
}

pub fn record_hop_submitted() {
    HOPS_SUBMITTED.with_label_values(&[]).inc();
}

pub fn record_settlement_submitted() {
    SETTLEMENTS_SUBMITTED.with_label_values(&[]).inc();
}

pub fn record_tx_submitted() {
    TX_SUBMITTED.with_label_values(&[]).inc();
}
