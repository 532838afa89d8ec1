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
	io,
	thread::{self, JoinHandle},
	time::Instant,
};

use tracing::{debug, error, info, warn};

use super::{
	buffer::{TradeBufferError, TradeConsumer},
	sink::{SinkError, TradeSink},
};
use crate::types::Match;

/// Configuration for the Trade Writer
#[derive(Debug, Clone)]
pub struct TradeWriterConfig {
	/// Maximum number of executions written before an explicit flush
	pub batch_size: usize,
	/// Whether to log every committed batch
	pub verbose_logging: bool,
}

impl Default for TradeWriterConfig {
	fn default() -> Self {
		Self {
			batch_size: 100,
			verbose_logging: false,
		}
	}
}

/// What the writer managed to persist over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeWriterReport {
	pub written: u64,
	pub failed: u64,
	/// First failure seen, if any
	pub first_error: Option<String>,
}

impl TradeWriterReport {
	fn note_failure(&mut self, error: &SinkError) {
		if self.first_error.is_none() {
			self.first_error = Some(error.to_string());
		}
	}
}

/// Trade Writer - consumes executions from the buffer and appends them to
/// the trade sink
///
/// Runs on its own thread so a slow or failing sink never stalls the
/// matching loop. A failed record is logged and counted, and the writer
/// moves on to the next one.
///
/// The writer stops once the producer end of the buffer is dropped and
/// every buffered execution has been written, then flushes the sink one
/// last time.
pub struct TradeWriter {
	thread_handle: JoinHandle<TradeWriterReport>,
}

impl TradeWriter {
	/// Start the trade writer on a background thread
	pub fn start(
		consumer: TradeConsumer,
		mut sink: Box<dyn TradeSink>,
		config: TradeWriterConfig,
	) -> io::Result<Self> {
		let thread_handle = thread::Builder::new()
			.name("trade-writer".to_string())
			.spawn(move || {
				info!(target: "trade_writer", "Trade writer started");
				let report = Self::run_writer_loop(&consumer, sink.as_mut(), &config);
				info!(
					target: "trade_writer",
					written = report.written,
					failed = report.failed,
					"Trade writer stopped"
				);
				report
			})?;

		Ok(Self { thread_handle })
	}

	/// Wait for the writer to finish and collect its report
	///
	/// Only returns after the producer end has been dropped.
	pub fn finish(self) -> TradeWriterReport {
		match self.thread_handle.join() {
			Ok(report) => report,
			Err(_) => {
				error!(target: "trade_writer", "Trade writer thread panicked");
				TradeWriterReport {
					first_error: Some("trade writer thread panicked".to_string()),
					..Default::default()
				}
			}
		}
	}

	fn run_writer_loop(
		consumer: &TradeConsumer,
		sink: &mut dyn TradeSink,
		config: &TradeWriterConfig,
	) -> TradeWriterReport {
		let batch_size = config.batch_size.max(1);
		let mut report = TradeWriterReport::default();
		let mut batch = Vec::with_capacity(batch_size);

		loop {
			match consumer.recv() {
				Ok(trade) => batch.push(trade),
				Err(TradeBufferError::Disconnected) => break,
				Err(e) => {
					warn!(target: "trade_writer", error = %e, "Unexpected trade buffer error");
					continue;
				}
			}
			batch.extend(consumer.drain(batch_size - 1));

			Self::commit_batch(sink, &batch, config, &mut report);
			batch.clear();
		}

		if let Err(e) = sink.flush() {
			error!(target: "trade_writer", error = %e, "Failed to flush trade log on shutdown");
			report.note_failure(&e);
		}

		report
	}

	/// Write one batch, then flush
	fn commit_batch(
		sink: &mut dyn TradeSink,
		trades: &[Match],
		config: &TradeWriterConfig,
		report: &mut TradeWriterReport,
	) {
		let start = Instant::now();

		for trade in trades {
			match sink.record(trade) {
				Ok(()) => report.written += 1,
				Err(e) => {
					error!(
						target: "trade_writer",
						trade = %trade,
						error = %e,
						"Failed to record trade"
					);
					report.failed += 1;
					report.note_failure(&e);
				}
			}
		}

		if let Err(e) = sink.flush() {
			error!(target: "trade_writer", batch_size = trades.len(), error = %e, "Failed to flush trade batch");
			report.note_failure(&e);
		}

		if config.verbose_logging {
			debug!(
				target: "trade_writer",
				batch_size = trades.len(),
				latency_us = start.elapsed().as_micros() as u64,
				"Batch committed"
			);
		} else if trades.len() > 50 {
			info!(
				target: "trade_writer",
				batch_size = trades.len(),
				latency_us = start.elapsed().as_micros() as u64,
				"Large batch committed"
			);
		}
	}
}
