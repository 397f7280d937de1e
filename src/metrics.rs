// Metrics and observability module
// This file handles collection and reporting of violation, confirmation
// and merit recovery counters for the service
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

pub static SAMPLES_INGESTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "speedguard_samples_ingested_total",
        "speed samples received from devices",
        &["outcome"]
    )
    .unwrap()
});

pub static VIOLATIONS_RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "speedguard_violations_recorded_total",
        "violations recorded by severity tier",
        &["severity"]
    )
    .unwrap()
});

pub static VIOLATIONS_CONFIRMED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "speedguard_violations_confirmed_total",
        "violations confirmed by officers"
    )
    .unwrap()
});

pub static MERIT_POINTS_DEDUCTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "speedguard_merit_points_deducted_total",
        "merit points removed by confirmed violations"
    )
    .unwrap()
});

pub static MERIT_POINTS_RECOVERED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "speedguard_merit_points_recovered_total",
        "merit points credited by weekly recovery"
    )
    .unwrap()
});

/// Render the default registry in the Prometheus text format.
pub fn render() -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
