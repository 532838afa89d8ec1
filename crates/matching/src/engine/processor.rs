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

use std::time::Duration;

use forge_sdk::types::{OrderRequest, OrderResult, OrderStatus, OrderType};
use tracing::{debug, error, info};

use super::{
	control::EngineCommand,
	state::{InvariantViolation, MatchingEngineState},
};
use crate::{
	matcher::match_order,
	queue::QueueReceiver,
	trade::TradeProducer,
	types::{Match, Order, OrderCommand, Quantity},
};

/// What the matching loop did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
	pub orders_processed: u64,
	/// Executions that never reached the trade writer
	pub trades_dropped: u64,
}

/// Sequential order processor, the body of the matching loop
///
/// Owns the books. Each order is matched, rested or discarded, has its
/// executions handed to the trade writer and gets its reply before the
/// next command is looked at.
pub struct OrderProcessor {
	state: MatchingEngineState,
	trades: TradeProducer,
	push_timeout: Duration,
	verbose_logging: bool,
	trades_dropped: u64,
}

impl OrderProcessor {
	pub fn new(trades: TradeProducer, push_timeout: Duration, verbose_logging: bool) -> Self {
		Self {
			state: MatchingEngineState::new(),
			trades,
			push_timeout,
			verbose_logging,
			trades_dropped: 0,
		}
	}

	pub fn state(&self) -> &MatchingEngineState {
		&self.state
	}

	/// Executions that could not be handed to the trade writer
	pub fn trades_dropped(&self) -> u64 {
		self.trades_dropped
	}

	/// Consume commands until the queue is closed and drained
	///
	pub fn run(mut self, mut queue: QueueReceiver) -> LoopReport {
		info!(target: "engine", "Matching loop started");

		while let Ok(cmd) = queue.recv() {
			match cmd {
				EngineCommand::Submit(cmd) => self.handle_submission(cmd),
				EngineCommand::BookStats { respond_to } => {
					let _ = respond_to.send(self.state.stats());
				}
				EngineCommand::Shutdown => {
					info!(target: "engine", "Shutdown requested, draining queued commands");
					queue.close();
				}
			}
		}

		info!(
			target: "engine",
			orders_processed = self.state.orders_processed(),
			trades_dropped = self.trades_dropped,
			"Matching loop stopped"
		);
		LoopReport {
			orders_processed: self.state.orders_processed(),
			trades_dropped: self.trades_dropped,
		}
	}

	/// Process one submission and reply to its caller
	pub fn handle_submission(&mut self, cmd: OrderCommand) {
		let OrderCommand {
			request,
			respond_to,
		} = cmd;

		let result = self.process_order(&request);

		// The books already reflect this order whether or not anyone is listening
		if respond_to.send(result).is_err() {
			debug!(target: "engine", "Submitter gone before its result was ready");
		}
	}

	/// Admit, match and rest one order
	///
	/// # Panics
	///
	/// Panics if a matching invariant is broken afterwards.
	pub fn process_order(&mut self, request: &OrderRequest) -> OrderResult {
		let order = self.state.admit(request);
		let outcome = match_order(&order, self.state.book_mut(order.side.opposite()));

		let filled = outcome.filled();
		let remaining = outcome.remaining;
		if filled + remaining != order.amount {
			self.fail(InvariantViolation::VolumeNotConserved {
				order_id: order.id,
				filled,
				remaining,
				amount: order.amount,
			});
		}

		let status = match (remaining, order.order_type) {
			(0, _) => OrderStatus::Filled,
			(_, OrderType::Market) => OrderStatus::Expired,
			(_, OrderType::Limit) => {
				self.state.book_mut(order.side).insert(Order {
					amount: remaining,
					..order.clone()
				});
				if filled > 0 {
					OrderStatus::PartiallyFilled
				} else {
					OrderStatus::Resting
				}
			}
		};

		for trade in &outcome.matches {
			self.emit(trade);
		}

		if let Err(violation) = self.state.check_invariants() {
			self.fail(violation);
		}
		self.state.record_processed();

		if self.verbose_logging {
			debug!(
				target: "engine",
				order_id = order.id,
				side = %order.side,
				order_type = ?order.order_type,
				amount = order.amount,
				price = order.price,
				filled,
				remaining,
				matches = outcome.matches.len(),
				status = ?status,
				"Order processed"
			);
		}

		OrderResult {
			success: true,
			message: describe(status, &order, filled, remaining, outcome.matches.len()),
			order_id: Some(order.id),
			status,
			filled,
			remaining,
		}
	}

	fn emit(&mut self, trade: &Match) {
		if let Err(e) = self.trades.push(*trade, self.push_timeout) {
			self.trades_dropped += 1;
			error!(
				target: "engine",
				trade = %trade,
				error = %e,
				"Failed to hand trade to the trade log"
			);
		}
	}

	fn fail(&self, violation: InvariantViolation) -> ! {
		error!(target: "engine", %violation, "Matching invariant violated, stopping");
		panic!("matching invariant violated: {violation}");
	}
}

fn describe(
	status: OrderStatus,
	order: &Order,
	filled: Quantity,
	remaining: Quantity,
	executions: usize,
) -> String {
	match status {
		OrderStatus::Filled => format!("filled {filled} in {executions} execution(s)"),
		OrderStatus::PartiallyFilled => {
			format!("filled {filled}, resting {remaining} at {}", order.price)
		}
		OrderStatus::Resting => format!("resting {remaining} at {}", order.price),
		OrderStatus::Expired => {
			format!("filled {filled}, discarded unfilled market remainder of {remaining}")
		}
		OrderStatus::Rejected => "rejected".to_string(),
	}
}
