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

mod control;
mod processor;
mod state;

pub use control::EngineCommand;
pub use processor::{LoopReport, OrderProcessor};
pub use state::{InvariantViolation, MatchingEngineState};

use std::{
	io,
	thread::{self, JoinHandle},
	time::Duration,
};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
	gateway::IntakeGateway,
	queue::{IngressQueue, QueueSender},
	trade::{TradeBuffer, TradeSink, TradeWriter, TradeWriterConfig, TradeWriterReport},
};

/// Error types for matching engine lifecycle operations
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Invalid engine configuration: {0}")]
	InvalidConfig(String),
	#[error("Failed to spawn {name} thread: {source}")]
	Spawn {
		name: &'static str,
		#[source]
		source: io::Error,
	},
	#[error("Matching loop panicked")]
	WorkerPanicked,
	#[error("Trade log incomplete: {0}")]
	TradeLog(String),
}

/// Configuration for the matching engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Ingress queue capacity; callers wait for a free slot when it is full
	pub queue_capacity: usize,
	/// Executions buffered between the matching loop and the trade writer
	pub trade_buffer_size: usize,
	/// Longest the matching loop waits for trade buffer space per execution
	pub trade_push_timeout_ms: u64,
	pub writer: TradeWriterConfig,
	pub verbose_logging: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 32,
			trade_buffer_size: 4096,
			trade_push_timeout_ms: 50,
			writer: TradeWriterConfig::default(),
			verbose_logging: false,
		}
	}
}

impl EngineConfig {
	pub fn validate(&self) -> Result<(), EngineError> {
		if self.queue_capacity == 0 {
			return Err(EngineError::InvalidConfig(
				"queue_capacity must be greater than 0".to_string(),
			));
		}
		if self.trade_buffer_size == 0 {
			return Err(EngineError::InvalidConfig(
				"trade_buffer_size must be greater than 0".to_string(),
			));
		}
		if self.writer.batch_size == 0 {
			return Err(EngineError::InvalidConfig(
				"writer batch_size must be greater than 0".to_string(),
			));
		}
		Ok(())
	}
}

/// Summary returned by a clean shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReport {
	pub orders_processed: u64,
	pub trades_written: u64,
	/// Executions the matching loop could not hand to the trade writer
	pub trades_dropped: u64,
}

/// Main matching engine with single-threaded matching loop
///
/// Runs the matching loop on a dedicated `matching-loop` thread, consuming
/// commands from the ingress queue, and the trade writer on a
/// `trade-writer` thread.
///
/// Architecture:
/// - Single-threaded matching: every book mutation happens on one thread
/// - FIFO: commands are processed in the order they were enqueued
/// - Trade log I/O is off the matching thread
///
/// Callers reach the engine only through an [`IntakeGateway`].
pub struct MatchingEngine {
	queue_sender: QueueSender,
	loop_handle: Option<JoinHandle<LoopReport>>,
	writer: Option<TradeWriter>,
}

impl MatchingEngine {
	/// Start the trade writer and the matching loop
	pub fn open(config: EngineConfig, sink: Box<dyn TradeSink>) -> Result<Self, EngineError> {
		config.validate()?;

		let (queue_sender, queue_receiver) = IngressQueue::new(config.queue_capacity).split();
		let (trade_producer, trade_consumer) = TradeBuffer::new(config.trade_buffer_size).split();

		let writer = TradeWriter::start(trade_consumer, sink, config.writer.clone()).map_err(
			|source| EngineError::Spawn {
				name: "trade-writer",
				source,
			},
		)?;

		let processor = OrderProcessor::new(
			trade_producer,
			Duration::from_millis(config.trade_push_timeout_ms),
			config.verbose_logging,
		);

		// A failed spawn drops the processor, which stops the writer
		let loop_handle = thread::Builder::new()
			.name("matching-loop".to_string())
			.spawn(move || processor.run(queue_receiver))
			.map_err(|source| EngineError::Spawn {
				name: "matching-loop",
				source,
			})?;

		info!(
			target: "engine",
			queue_capacity = config.queue_capacity,
			trade_buffer_size = config.trade_buffer_size,
			"Matching engine opened"
		);

		Ok(Self {
			queue_sender,
			loop_handle: Some(loop_handle),
			writer: Some(writer),
		})
	}

	/// A new handle for submitting orders
	pub fn gateway(&self) -> IntakeGateway {
		IntakeGateway::new(self.queue_sender.clone())
	}

	/// Stop the engine after everything already queued has been processed
	///
	/// Waits for the matching loop to drain the queue and for the trade
	/// writer to flush. Fails if the loop panicked or if any trade could
	/// not be written.
	pub async fn close(mut self) -> Result<EngineReport, EngineError> {
		info!(target: "engine", "Closing matching engine");

		// Queued behind every command already admitted
		if self.queue_sender.send(EngineCommand::Shutdown).await.is_err() {
			warn!(target: "engine", "Matching loop had already stopped");
		}

		let loop_handle = self.loop_handle.take();
		let writer = self.writer.take();

		let (loop_report, writer_report) = tokio::task::spawn_blocking(move || {
			let loop_report = match loop_handle {
				Some(handle) => handle.join().map_err(|_| EngineError::WorkerPanicked),
				None => Ok(LoopReport::default()),
			};
			// The writer stops once the loop's trade producer is dropped
			let report = writer.map(TradeWriter::finish).unwrap_or_default();
			(loop_report, report)
		})
		.await
		.map_err(|_| EngineError::WorkerPanicked)?;

		let LoopReport {
			orders_processed,
			trades_dropped,
		} = loop_report.inspect_err(|_| {
			error!(target: "engine", "Matching loop panicked before shutdown");
		})?;

		let TradeWriterReport {
			written,
			failed,
			first_error,
		} = writer_report;

		if trades_dropped > 0 || first_error.is_some() {
			error!(
				target: "engine",
				written,
				failed,
				trades_dropped,
				error = first_error.as_deref().unwrap_or("none"),
				"Trade log incomplete"
			);
			let mut reason = format!(
				"{} trade record(s) not written ({trades_dropped} never reached the writer, {failed} failed in the sink)",
				trades_dropped + failed
			);
			if let Some(first_error) = first_error {
				reason.push_str(&format!(", first sink error: {first_error}"));
			}
			return Err(EngineError::TradeLog(reason));
		}

		info!(
			target: "engine",
			orders_processed,
			trades_written = written,
			"Matching engine closed"
		);

		Ok(EngineReport {
			orders_processed,
			trades_written: written,
			trades_dropped,
		})
	}
}

impl Drop for MatchingEngine {
	fn drop(&mut self) {
		if self.loop_handle.is_some() {
			// Best effort: the threads finish on their own once it lands
			let _ = self.queue_sender.try_enqueue(EngineCommand::Shutdown);
			warn!(target: "engine", "Matching engine dropped without close, worker threads detached");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::trade::MemoryTradeSink;

	#[test]
	fn test_default_config_is_valid() {
		assert!(EngineConfig::default().validate().is_ok());
	}

	#[test]
	fn test_zero_capacities_are_rejected() {
		let config = EngineConfig {
			queue_capacity: 0,
			..Default::default()
		};
		assert!(matches!(
			config.validate(),
			Err(EngineError::InvalidConfig(_))
		));

		let config = EngineConfig {
			trade_buffer_size: 0,
			..Default::default()
		};
		assert!(matches!(
			MatchingEngine::open(config, Box::new(MemoryTradeSink::new())),
			Err(EngineError::InvalidConfig(_))
		));
	}

	#[tokio::test]
	async fn test_open_and_close_idle_engine() {
		let engine =
			MatchingEngine::open(EngineConfig::default(), Box::new(MemoryTradeSink::new())).unwrap();

		let report = engine.close().await.unwrap();

		assert_eq!(
			report,
			EngineReport {
				orders_processed: 0,
				trades_written: 0,
				trades_dropped: 0,
			}
		);
	}
}
