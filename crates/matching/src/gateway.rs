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

//! Intake gateway: the only way callers reach the matching loop
//!
//! A submission passes through two suspension points, both bounded by the
//! caller's deadline:
//! 1. waiting for a free slot in the ingress queue
//! 2. waiting for the matching loop's reply
//!
//! Running out of time at (1) leaves no trace in the books. Running out of
//! time at (2) only stops the waiting: the order is already queued and will
//! still be matched.

use std::time::Duration;

use forge_sdk::types::{OrderRequest, OrderResult};
use thiserror::Error;
use tokio::{
	sync::oneshot,
	time::{Instant, timeout_at},
};
use tracing::{Instrument, Span, debug, field, warn};

use crate::{
	engine::EngineCommand,
	queue::{QueueError, QueueSender},
	types::{BookStats, OrderCommand},
};

/// Why a submission produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
	/// Nothing was queued
	#[error("Deadline exceeded while waiting for queue capacity")]
	EnqueueTimeout,
	/// The order was queued and may still execute
	#[error("Deadline exceeded while waiting for the order result")]
	ResultTimeout,
	#[error("Matching engine is closed")]
	EngineClosed,
}

/// Cloneable submission handle shared by any number of callers
#[derive(Clone)]
pub struct IntakeGateway {
	queue_sender: QueueSender,
}

impl IntakeGateway {
	pub(crate) fn new(queue_sender: QueueSender) -> Self {
		Self { queue_sender }
	}

	/// Submit an order and wait for its result until `deadline`
	///
	/// Invalid requests are answered with a rejected result right here and
	/// never reach the queue.
	pub async fn submit(
		&self,
		request: OrderRequest,
		deadline: Instant,
	) -> Result<OrderResult, SubmitError> {
		let span = tracing::info_span!(
			"submit_order",
			user_id = request.user_id,
			side = %request.side,
			order_type = %request.order_type,
			amount = request.amount,
			price = request.price,
			order_id = field::Empty,
			status = field::Empty,
			latency_us = field::Empty
		);

		self.submit_in_span(request, deadline)
			.instrument(span)
			.await
	}

	/// Submit with a deadline `timeout` from now
	pub async fn submit_with_timeout(
		&self,
		request: OrderRequest,
		timeout: Duration,
	) -> Result<OrderResult, SubmitError> {
		self.submit(request, Instant::now() + timeout).await
	}

	async fn submit_in_span(
		&self,
		request: OrderRequest,
		deadline: Instant,
	) -> Result<OrderResult, SubmitError> {
		let start = Instant::now();

		if let Err(e) = request.validate() {
			record_outcome(start, "rejected");
			warn!(target: "gateway", reason = %e, "Order rejected");
			return Ok(OrderResult::rejected(e.to_string()));
		}

		if start >= deadline {
			record_outcome(start, "enqueue_timeout");
			warn!(target: "gateway", "Deadline already passed, order not queued");
			return Err(SubmitError::EnqueueTimeout);
		}

		let (cmd, reply) = OrderCommand::new(request);
		self.enqueue(EngineCommand::Submit(cmd), deadline, start)
			.await?;

		match timeout_at(deadline, reply).await {
			Ok(Ok(result)) => {
				if let Some(order_id) = result.order_id {
					Span::current().record("order_id", order_id);
				}
				record_outcome(start, &format!("{:?}", result.status));
				debug!(
					target: "gateway",
					filled = result.filled,
					remaining = result.remaining,
					"Order processed"
				);
				Ok(result)
			}
			Ok(Err(_)) => {
				record_outcome(start, "engine_closed");
				warn!(target: "gateway", "Matching loop dropped the order without a result");
				Err(SubmitError::EngineClosed)
			}
			Err(_) => {
				record_outcome(start, "result_timeout");
				warn!(
					target: "gateway",
					"Deadline exceeded waiting for result, order may still execute"
				);
				Err(SubmitError::ResultTimeout)
			}
		}
	}

	/// Summary of both books, taken between two orders
	pub async fn book_stats(&self, deadline: Instant) -> Result<BookStats, SubmitError> {
		let start = Instant::now();
		let (respond_to, reply) = oneshot::channel();

		self.enqueue(EngineCommand::BookStats { respond_to }, deadline, start)
			.await?;

		match timeout_at(deadline, reply).await {
			Ok(Ok(stats)) => Ok(stats),
			Ok(Err(_)) => Err(SubmitError::EngineClosed),
			Err(_) => Err(SubmitError::ResultTimeout),
		}
	}

	/// Whether the engine still accepts submissions
	pub fn is_open(&self) -> bool {
		!self.queue_sender.is_closed()
	}

	async fn enqueue(
		&self,
		cmd: EngineCommand,
		deadline: Instant,
		start: Instant,
	) -> Result<(), SubmitError> {
		match self.queue_sender.enqueue(cmd, deadline).await {
			Ok(()) => Ok(()),
			Err(QueueError::Timeout) => {
				record_outcome(start, "enqueue_timeout");
				warn!(target: "gateway", "Deadline exceeded waiting for queue capacity");
				Err(SubmitError::EnqueueTimeout)
			}
			Err(e) => {
				record_outcome(start, "engine_closed");
				debug!(target: "gateway", error = %e, "Ingress queue unavailable");
				Err(SubmitError::EngineClosed)
			}
		}
	}
}

fn record_outcome(start: Instant, status: &str) {
	let span = Span::current();
	span.record("status", status);
	span.record("latency_us", start.elapsed().as_micros() as u64);
}
