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

use std::{
	path::{Path, PathBuf},
	time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{engine::EngineConfig, trade::TradeWriterConfig};

/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Component name for log files: {LOG_DIR}/matching/matching.YYYY-MM-DD.log
pub const LOG_COMPONENT_NAME: &str = "matching";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Matching service configuration
///
/// Sources, later ones winning: built-in defaults, an optional file, then
/// `MATCHING_*` environment variables (e.g. `MATCHING_QUEUE_CAPACITY=64`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
	/// Ingress queue capacity
	pub queue_capacity: usize,
	/// Trade log file
	pub trade_log_path: PathBuf,
	/// Keep an existing trade log instead of truncating it
	pub trade_log_append: bool,
	/// Executions buffered between matching loop and trade writer
	pub trade_buffer_size: usize,
	pub trade_push_timeout_ms: u64,
	pub writer_batch_size: usize,
	/// Default deadline for a submission, enqueue and reply together
	pub submit_timeout_ms: u64,
	/// Log every order and every trade batch at debug level
	pub verbose_logging: bool,
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 32,
			trade_log_path: PathBuf::from("trades.log"),
			trade_log_append: false,
			trade_buffer_size: 4096,
			trade_push_timeout_ms: 50,
			writer_batch_size: 100,
			submit_timeout_ms: 5000,
			verbose_logging: false,
		}
	}
}

impl MatchingConfig {
	/// Load configuration from `.env` and environment variables
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenv::dotenv().ok();
		Self::load(None)
	}

	/// Load configuration from file, with environment overrides
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		Self::load(Some(path.as_ref()))
	}

	fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut builder = Config::builder();
		if let Some(path) = path {
			builder = builder.add_source(File::from(path));
		}

		let config: Self = builder
			.add_source(Environment::with_prefix("MATCHING").try_parsing(true))
			.build()?
			.try_deserialize()?;

		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		self.engine_config()
			.validate()
			.map_err(|e| ConfigError::Message(e.to_string()))?;

		if self.submit_timeout_ms == 0 {
			return Err(ConfigError::Message(
				"submit_timeout_ms must be greater than 0".to_string(),
			));
		}
		Ok(())
	}

	/// The part of the configuration the engine itself consumes
	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			queue_capacity: self.queue_capacity,
			trade_buffer_size: self.trade_buffer_size,
			trade_push_timeout_ms: self.trade_push_timeout_ms,
			writer: TradeWriterConfig {
				batch_size: self.writer_batch_size,
				verbose_logging: self.verbose_logging,
			},
			verbose_logging: self.verbose_logging,
		}
	}

	pub fn submit_timeout(&self) -> Duration {
		Duration::from_millis(self.submit_timeout_ms)
	}
}

/// Load profile for the built-in order flow simulation
///
/// Read from `SIM_*` environment variables (e.g. `SIM_CLIENTS=10`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Concurrent simulated clients; even ones buy, odd ones sell
	pub clients: u32,
	pub requests_per_client: u32,
	/// Amounts are drawn from 1..=max_amount
	pub max_amount: u64,
	/// Prices are drawn from 1..=max_price
	pub max_price: u64,
	/// Fixed seed for a reproducible order flow
	pub seed: Option<u64>,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			clients: 1000,
			requests_per_client: 100,
			max_amount: 20,
			max_price: 500,
			seed: None,
		}
	}
}

impl SimulationConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenv::dotenv().ok();

		let config: Self = Config::builder()
			.add_source(Environment::with_prefix("SIM").try_parsing(true))
			.build()?
			.try_deserialize()?;

		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_amount == 0 || self.max_price == 0 {
			return Err(ConfigError::Message(
				"max_amount and max_price must be greater than 0".to_string(),
			));
		}
		Ok(())
	}

	pub fn total_requests(&self) -> u64 {
		u64::from(self.clients) * u64::from(self.requests_per_client)
	}
}
