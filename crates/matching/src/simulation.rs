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

//! Simulated order flow
//!
//! Many concurrent clients, each submitting random limit orders through
//! the intake gateway. Even-numbered clients buy, odd-numbered ones sell.

use std::time::Duration;

use forge_sdk::types::{OrderRequest, Side};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{config::SimulationConfig, gateway::IntakeGateway};

/// Aggregate outcome of a simulation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationSummary {
	/// Orders that received a result
	pub completed: u64,
	/// Orders that got no result (deadline or closed engine)
	pub failed: u64,
	/// Quantity executed by completed orders as aggressors
	pub filled_volume: u64,
}

impl SimulationSummary {
	fn merge(&mut self, other: SimulationSummary) {
		self.completed += other.completed;
		self.failed += other.failed;
		self.filled_volume += other.filled_volume;
	}
}

/// Run every simulated client to completion
///
/// Each submission gets `timeout` as its own deadline. Failed submissions
/// are logged and the client carries on with its next order.
pub async fn run_simulated_clients(
	gateway: IntakeGateway,
	config: SimulationConfig,
	timeout: Duration,
) -> SimulationSummary {
	let mut clients = JoinSet::new();

	for client_id in 0..config.clients {
		let gateway = gateway.clone();
		let config = config.clone();
		clients.spawn(async move { simulate_client(client_id, &gateway, &config, timeout).await });
	}

	let mut summary = SimulationSummary::default();
	while let Some(joined) = clients.join_next().await {
		match joined {
			Ok(client_summary) => summary.merge(client_summary),
			Err(e) => warn!(target: "server", error = %e, "Simulated client task failed"),
		}
	}
	summary
}

async fn simulate_client(
	client_id: u32,
	gateway: &IntakeGateway,
	config: &SimulationConfig,
	timeout: Duration,
) -> SimulationSummary {
	let side = if client_id % 2 == 0 {
		Side::Buy
	} else {
		Side::Sell
	};
	let mut rng = match config.seed {
		Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(client_id))),
		None => StdRng::from_entropy(),
	};
	let mut summary = SimulationSummary::default();

	for i in 0..config.requests_per_client {
		let user_id = client_id
			.wrapping_mul(config.requests_per_client)
			.wrapping_add(i);
		let amount = rng.gen_range(1..=config.max_amount);
		let price = rng.gen_range(1..=config.max_price);

		match gateway
			.submit_with_timeout(OrderRequest::limit(user_id, side, amount, price), timeout)
			.await
		{
			Ok(result) => {
				summary.completed += 1;
				summary.filled_volume += result.filled;
			}
			Err(e) => {
				summary.failed += 1;
				debug!(target: "server", client_id, error = %e, "Simulated client could not send order");
			}
		}
	}

	summary
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		engine::{EngineConfig, MatchingEngine},
		trade::MemoryTradeSink,
	};

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_simulation_completes_every_order() {
		let sink = MemoryTradeSink::new();
		let engine = MatchingEngine::open(
			EngineConfig {
				queue_capacity: 8,
				..Default::default()
			},
			Box::new(sink.clone()),
		)
		.unwrap();

		let config = SimulationConfig {
			clients: 20,
			requests_per_client: 25,
			max_amount: 20,
			max_price: 50,
			seed: Some(42),
		};
		let summary =
			run_simulated_clients(engine.gateway(), config, Duration::from_secs(10)).await;

		assert_eq!(summary.completed, 500);
		assert_eq!(summary.failed, 0);

		let report = engine.close().await.unwrap();
		assert_eq!(report.orders_processed, 500);

		let traded: u64 = sink.trades().iter().map(|t| t.amount).sum();
		assert_eq!(traded, summary.filled_volume);
	}
}
