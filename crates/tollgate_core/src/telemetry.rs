//! OpenTelemetry integration for tracing admission decisions.

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
};
use opentelemetry_stdout::SpanExporter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a tracing subscriber that logs to stderr and exports spans to stdout.
///
/// Spans are tagged with `service.name = service_name` so output from several
/// process instances sharing one counter backend can be told apart. Both
/// layers honour `RUST_LOG`.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_telemetry(service_name: &'static str) -> Result<(), Box<dyn std::error::Error>> {
    let provider = TracerProvider::builder()
        .with_simple_exporter(SpanExporter::default())
        .with_id_generator(RandomIdGenerator::default())
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name,
        )]))
        .build();

    let tracer = provider.tracer(service_name);
    // Registered globally so shutdown_telemetry can flush it.
    opentelemetry::global::set_tracer_provider(provider);

    let otel_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(EnvFilter::from_default_env());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending spans and tear down the global tracer provider.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
