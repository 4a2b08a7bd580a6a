// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use fetchpool::config::settings::{OutputFormat, Settings};
use fetchpool::domain::models::WorkItem;
use fetchpool::engines::reqwest_engine::ReqwestFetcher;
use fetchpool::pipeline::{Pipeline, PipelineConfig, RunSignal};
use fetchpool::utils::telemetry;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::{info, warn};

/// 主函数
///
/// 加载配置，运行一次抓取流水线并按完成顺序打印结果
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.logging);
    fetchpool::infrastructure::metrics::init_metrics(&settings.metrics)?;

    // 3. Build the pipeline
    let fetcher = Arc::new(ReqwestFetcher::new(&settings.fetcher)?);
    let config = PipelineConfig::from(&settings.pipeline);
    let pipeline = Pipeline::new(config.clone(), fetcher)?;

    // Positional arguments replace the configured target list
    let args: Vec<String> = std::env::args().skip(1).collect();
    let targets = if args.is_empty() {
        settings.pipeline.urls.clone()
    } else {
        args
    };
    let items: Vec<WorkItem> = targets.into_iter().map(WorkItem::from).collect();

    // 4. Run, cancelling on Ctrl-C
    let run_signal = RunSignal::with_budget(config.deadline);
    let interrupt = run_signal.clone();
    let watcher = tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.cancelled() => {}
            result = signal::ctrl_c() => match result {
                Ok(()) => {
                    warn!("Shutdown signal received, cancelling run");
                    interrupt.cancel();
                }
                Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
            },
        }
    });

    let report = pipeline.run_with_signal(items, run_signal.clone()).await;
    watcher.abort();

    // 5. Print results in completion order
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in &report.results {
        match settings.output.format {
            OutputFormat::Text => writeln!(out, "{}", result)?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(result)?)?,
        }
    }
    out.flush()?;

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Elapsed time: {:?}",
        start.elapsed()
    );

    Ok(())
}
