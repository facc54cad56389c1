//! Prometheus metrics for the answer pipeline.
//!
//! Exposes:
//! - `graph_rag_stage_duration_seconds` (histogram by stage)
//! - `graph_rag_pipeline_total` (counter with status)
//! - `graph_rag_pipeline_inflight` (gauge)
//! - `graph_rag_degraded_total` (counter by reason)
//! - process metrics via `process` collector

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 10ms up to ~80 seconds.
    let buckets =
        prometheus::exponential_buckets(0.01, 2.0, 14).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "graph_rag_stage_duration_seconds",
        "Pipeline stage duration in seconds",
        &["stage"],
        buckets
    )
    .expect("failed to register stage duration histogram")
});

static PIPELINE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "graph_rag_pipeline_total",
        "Total answered questions by status",
        &["status"]
    )
    .expect("failed to register pipeline counter")
});

static PIPELINE_INFLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "graph_rag_pipeline_inflight",
        "Number of questions being answered"
    )
    .expect("failed to register inflight gauge")
});

static DEGRADED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "graph_rag_degraded_total",
        "Requests answered with a degraded stage, by reason",
        &["reason"]
    )
    .expect("failed to register degraded counter")
});

/// Ensure collectors are registered.
fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&STAGE_DURATION);
    Lazy::force(&PIPELINE_TOTAL);
    Lazy::force(&PIPELINE_INFLIGHT);
    Lazy::force(&DEGRADED_TOTAL);
}

/// Increment the inflight gauge.
pub fn record_pipeline_start() {
    init_collectors();
    PIPELINE_INFLIGHT.inc();
}

/// Record completion of a whole request.
pub fn record_pipeline_result(duration: Duration, success: bool) {
    init_collectors();
    PIPELINE_INFLIGHT.dec();
    STAGE_DURATION
        .with_label_values(&["total"])
        .observe(duration.as_secs_f64());
    PIPELINE_TOTAL
        .with_label_values(&[if success { "ok" } else { "error" }])
        .inc();
}

/// Record how long one stage took.
pub fn record_stage(stage: &'static str, duration: Duration) {
    init_collectors();
    STAGE_DURATION
        .with_label_values(&[stage])
        .observe(duration.as_secs_f64());
}

/// Count a degraded request (`condensation`, `graph`, `vector`).
pub fn record_degraded(reason: &'static str) {
    init_collectors();
    DEGRADED_TOTAL.with_label_values(&[reason]).inc();
}

async fn metrics_response() -> Result<Response<Full<Bytes>>, Infallible> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", err);
        let mut response = Response::new(Full::from("encode error"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return Ok(response);
    }

    let mut response = Response::new(Full::from(buffer));
    if let Ok(value) = hyper::header::HeaderValue::from_str(encoder.format_type()) {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, value);
    }
    Ok(response)
}

async fn handle_request(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => metrics_response().await,
        _ => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::NOT_FOUND;
            Ok(response)
        }
    }
}

async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Prometheus metrics endpoint started");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service_fn(handle_request);
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "Metrics connection error: {}", err);
            }
        });
    }
}

/// Spawn the metrics HTTP endpoint on the given address.
pub fn spawn_metrics_server(addr: SocketAddr) {
    init_collectors();
    tokio::spawn(async move {
        if let Err(err) = serve(addr).await {
            error!(%addr, "Metrics server failed: {}", err);
        }
    });
}
