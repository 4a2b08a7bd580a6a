// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 启动 Prometheus 指标导出器
///
/// 未配置监听地址时不做任何事，指标宏在没有记录器时为空操作。
pub fn init_metrics(settings: &MetricsSettings) -> anyhow::Result<()> {
    let Some(listen_addr) = settings.listen_addr.as_deref() else {
        return Ok(());
    };
    let addr: SocketAddr = listen_addr.parse()?;

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return Ok(());
    }

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
