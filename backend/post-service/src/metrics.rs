//! Prometheus metrics for post-service.
//!
//! Collectors are registered in the default registry and rendered by `/metrics`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Wall time spent assembling a feed.
    pub static ref FEED_BUILD_DURATION_SECONDS: Histogram = register_histogram!(
        "post_feed_build_duration_seconds",
        "Time spent assembling a personalized feed"
    )
    .expect("failed to register post_feed_build_duration_seconds");

    /// Posts that made it into a feed, segmented by source (organic, campaign).
    pub static ref FEED_POSTS_RETURNED: HistogramVec = register_histogram_vec!(
        "post_feed_posts_returned",
        "Posts returned per feed request segmented by source",
        &["source"],
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]
    )
    .expect("failed to register post_feed_posts_returned");

    /// Failed notifications to external services, segmented by target.
    pub static ref NOTIFIER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_notifier_failures_total",
        "Failed calls to external notification endpoints",
        &["target"]
    )
    .expect("failed to register post_notifier_failures_total");

    /// Promotion activation outcomes (activated, missing).
    pub static ref PROMOTIONS_ACTIVATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_promotions_activated_total",
        "Promotion activation results segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register post_promotions_activated_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
