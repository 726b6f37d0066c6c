//! Prometheus metrics.
//!
//! Metrics are recorded through the `metrics` facade. The exporter, when
//! enabled, serves them from its own listener so the viewer's routing table
//! stays limited to the page, static assets and the render proxy.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

use crate::routing::RouteKind;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

pub fn record_request(route: &RouteKind) {
    counter!("viewer_requests_total", "kind" => route.label()).increment(1);
}

pub fn record_render(duration: Duration, success: bool) {
    histogram!("viewer_render_duration_seconds").record(duration.as_secs_f64());
    if !success {
        counter!("viewer_render_errors_total").increment(1);
    }
}
