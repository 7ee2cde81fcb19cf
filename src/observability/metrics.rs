//! Prometheus metrics.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Address to bind the scrape listener.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings.
    #[must_use]
    pub const fn from_settings(settings: &MetricsSettings) -> Self {
        Self {
            enabled: settings.enabled,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), settings.port),
        }
    }
}

/// Handle to the installed Prometheus recorder.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
}

impl MetricsHandle {
    /// Renders the current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the Prometheus recorder and, when `expose` is set, its HTTP listener.
///
/// Returns `None` when metrics are disabled; the `metrics` macros are then no-ops.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed or the
/// listener cannot be started.
pub fn install_prometheus(config: &MetricsConfig, expose: bool) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let builder = PrometheusBuilder::new();
    let prometheus = if expose {
        install_listener(builder.with_http_listener(config.listen_addr))?
    } else {
        builder
            .install_recorder()
            .map_err(|e| Error::OperationFailed {
                operation: "metrics_recorder_install".to_string(),
                cause: e.to_string(),
            })?
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        expose,
        "Prometheus metrics recorder installed"
    );
    Ok(Some(MetricsHandle { prometheus }))
}

fn install_listener(builder: PrometheusBuilder) -> Result<PrometheusHandle> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        return install_with_runtime(builder, &handle);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_runtime_init".to_string(),
            cause: e.to_string(),
        })?;
    let handle = runtime.handle().clone();
    let prometheus = install_with_runtime(builder, &handle)?;
    thread::Builder::new()
        .name("metrics-exporter-prometheus-http".to_string())
        .spawn(move || runtime.block_on(std::future::pending::<()>()))
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_runtime_thread".to_string(),
            cause: e.to_string(),
        })?;
    Ok(prometheus)
}

fn install_with_runtime(
    builder: PrometheusBuilder,
    runtime_handle: &tokio::runtime::Handle,
) -> Result<PrometheusHandle> {
    let (recorder, exporter) = {
        let _guard = runtime_handle.enter();
        builder.build().map_err(|e| Error::OperationFailed {
            operation: "metrics_exporter_build".to_string(),
            cause: e.to_string(),
        })?
    };
    let handle = recorder.handle();
    set_global_recorder(recorder)?;
    runtime_handle.spawn(exporter);
    Ok(handle)
}

fn set_global_recorder(recorder: PrometheusRecorder) -> Result<()> {
    metrics::set_global_recorder(recorder).map_err(|e| Error::OperationFailed {
        operation: "metrics_recorder_install".to_string(),
        cause: e.to_string(),
    })
}
