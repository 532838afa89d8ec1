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

use std::time::{SystemTime, UNIX_EPOCH};

use forge_sdk::types::{OrderRequest, Side};
use thiserror::Error;

use crate::{
	orderbook::PriorityBook,
	types::{BookStats, Order, OrderId, Quantity, Timestamp, TopOfBook},
};

/// Broken matching invariant
///
/// Any of these means the books can no longer be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
	#[error("book crossed: best buy {best_buy} >= best sell {best_sell}")]
	CrossedBook { best_buy: u64, best_sell: u64 },
	#[error("order {order_id} rests with zero amount")]
	EmptyRestingOrder { order_id: OrderId },
	#[error("order {order_id}: filled {filled} + remaining {remaining} != amount {amount}")]
	VolumeNotConserved {
		order_id: OrderId,
		filled: Quantity,
		remaining: Quantity,
		amount: Quantity,
	},
}

/// Matching engine state
///
/// This structure holds the complete state of the matching engine:
/// - Both sides of the book
/// - Order id counter and the last admission timestamp
/// - Number of orders processed
///
/// The state is owned by the matching loop. Nothing else reads or writes
/// it, so none of it is behind a lock.
pub struct MatchingEngineState {
	pub buy_book: PriorityBook,
	pub sell_book: PriorityBook,
	/// Next order id to assign
	next_order_id: OrderId,
	last_timestamp: Timestamp,
	orders_processed: u64,
}

impl MatchingEngineState {
	pub fn new() -> Self {
		Self {
			buy_book: PriorityBook::new(Side::Buy),
			sell_book: PriorityBook::new(Side::Sell),
			next_order_id: 1,
			last_timestamp: 0,
			orders_processed: 0,
		}
	}

	/// Give a request its identity
	///
	/// Ids increase by one per admission. Timestamps follow the wall clock
	/// but never repeat or go backwards, even if the clock does.
	pub fn admit(&mut self, request: &OrderRequest) -> Order {
		let id = self.next_order_id;
		self.next_order_id += 1;

		let timestamp = self.next_timestamp();
		Order::admit(id, timestamp, request)
	}

	fn next_timestamp(&mut self) -> Timestamp {
		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_nanos() as Timestamp)
			.unwrap_or(0);

		self.last_timestamp = now.max(self.last_timestamp + 1);
		self.last_timestamp
	}

	pub fn book_mut(&mut self, side: Side) -> &mut PriorityBook {
		match side {
			Side::Buy => &mut self.buy_book,
			Side::Sell => &mut self.sell_book,
		}
	}

	pub fn orders_processed(&self) -> u64 {
		self.orders_processed
	}

	pub fn record_processed(&mut self) {
		self.orders_processed += 1;
	}

	/// Read-only summary of both books
	pub fn stats(&self) -> BookStats {
		BookStats {
			buy_orders: self.buy_book.len(),
			sell_orders: self.sell_book.len(),
			buy_depth: self.buy_book.depth(),
			sell_depth: self.sell_book.depth(),
			best_buy: top_of(&self.buy_book),
			best_sell: top_of(&self.sell_book),
			orders_processed: self.orders_processed,
		}
	}

	/// Check the invariants that must hold between two orders
	///
	/// Only the tops need looking at: the heap keeps them the extremes, and
	/// an order can only lose amount while it is on top.
	pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
		for book in [&self.buy_book, &self.sell_book] {
			if let Some(top) = book.peek()
				&& top.amount == 0
			{
				return Err(InvariantViolation::EmptyRestingOrder { order_id: top.id });
			}
		}

		if let (Some(best_buy), Some(best_sell)) =
			(self.buy_book.best_price(), self.sell_book.best_price())
			&& best_buy >= best_sell
		{
			return Err(InvariantViolation::CrossedBook {
				best_buy,
				best_sell,
			});
		}

		Ok(())
	}
}

impl Default for MatchingEngineState {
	fn default() -> Self {
		Self::new()
	}
}

fn top_of(book: &PriorityBook) -> Option<TopOfBook> {
	book.peek().map(|order| TopOfBook {
		order_id: order.id,
		price: order.price,
		amount: order.amount,
	})
}
