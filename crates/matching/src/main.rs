// Copyright 2025 itscheems
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

//! Matching engine service entry point
//!
//! Wires up the engine with a file trade log and drives it with the
//! simulated order flow until the flow completes or Ctrl-C arrives:
//! - Trade Writer (trade log persistence)
//! - Matching Loop (single-threaded core)
//! - Intake Gateway (shared by all simulated clients)

use std::time::Instant;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use forge_matching::{
	FileTradeSink, MatchingEngine,
	config::{MatchingConfig, SimulationConfig},
	simulation::run_simulated_clients,
};

#[tokio::main]
async fn main() -> Result<()> {
	// Initialize logging first
	forge_matching::logging::init_logging()?;

	let config = MatchingConfig::from_env().unwrap_or_else(|e| {
		warn!(target: "server", error = %e, "Invalid configuration, using defaults");
		MatchingConfig::default()
	});
	let simulation = SimulationConfig::from_env().unwrap_or_else(|e| {
		warn!(target: "server", error = %e, "Invalid simulation settings, using defaults");
		SimulationConfig::default()
	});

	info!(target: "server", "Starting Forge Matching Engine");
	info!(target: "server", "Ingress queue size: {}", config.queue_capacity);
	info!(target: "server", "Trade log: {}", config.trade_log_path.display());
	info!(
		target: "server",
		"Simulated clients: {} x {} orders",
		simulation.clients, simulation.requests_per_client
	);

	let sink = if config.trade_log_append {
		FileTradeSink::append(&config.trade_log_path)
	} else {
		FileTradeSink::create(&config.trade_log_path)
	}
	.with_context(|| format!("Failed to open trade log {}", config.trade_log_path.display()))?;

	let engine = MatchingEngine::open(config.engine_config(), Box::new(sink))
		.context("Failed to start matching engine")?;
	let gateway = engine.gateway();

	let started = Instant::now();
	tokio::select! {
		summary = run_simulated_clients(gateway.clone(), simulation, config.submit_timeout()) => {
			info!(
				target: "server",
				completed = summary.completed,
				failed = summary.failed,
				filled_volume = summary.filled_volume,
				"Processing took {} milliseconds",
				started.elapsed().as_millis()
			);
		}
		_ = signal::ctrl_c() => {
			info!(target: "server", "Shutting down...");
		}
	}

	match gateway
		.book_stats(tokio::time::Instant::now() + config.submit_timeout())
		.await
	{
		Ok(stats) => info!(
			target: "server",
			stats = %serde_json::to_string(&stats).unwrap_or_default(),
			"Final book state"
		),
		Err(e) => warn!(target: "server", error = %e, "Could not read final book state"),
	}

	let report = engine
		.close()
		.await
		.context("Matching engine did not shut down cleanly")?;

	info!(
		target: "server",
		orders_processed = report.orders_processed,
		trades_written = report.trades_written,
		"Shutdown complete"
	);
	Ok(())
}
