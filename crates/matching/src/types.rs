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

use std::fmt;

use forge_sdk::types::{OrderRequest, OrderResult, OrderType, Side};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

pub type OrderId = u64;
pub type Price = u64;
pub type Quantity = u64;
/// Nanoseconds since the Unix epoch
pub type Timestamp = u64;

/// Order command received from the intake gateway
///
/// This represents a validated submission that is travelling through the
/// ingress queue towards the matching loop. It carries no identity yet:
/// the matching loop assigns id and timestamp when it dequeues it.
#[derive(Debug)]
pub struct OrderCommand {
	pub request: OrderRequest,
	/// Single-use reply conduit back to the submitter
	pub respond_to: oneshot::Sender<OrderResult>,
}

impl OrderCommand {
	pub fn new(request: OrderRequest) -> (Self, oneshot::Receiver<OrderResult>) {
		let (respond_to, reply) = oneshot::channel();
		(
			Self {
				request,
				respond_to,
			},
			reply,
		)
	}
}

/// Internal order representation for the matching engine
///
/// Identity and terms are fixed at admission. Only `amount` changes
/// afterwards, and only downwards while the order rests on a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Unique, strictly increasing id
	pub id: OrderId,
	pub user_id: u32,
	pub side: Side,
	pub order_type: OrderType,
	/// Remaining tradable quantity
	pub amount: Quantity,
	/// Limit price (meaningless for market orders)
	pub price: Price,
	/// Admission time, the tie-break between equal prices
	pub timestamp: Timestamp,
}

impl Order {
	/// Admit a request under the given identity
	pub fn admit(id: OrderId, timestamp: Timestamp, request: &OrderRequest) -> Self {
		Self {
			id,
			user_id: request.user_id,
			side: request.side,
			order_type: request.order_type,
			amount: request.amount,
			price: request.price,
			timestamp,
		}
	}
}

/// One execution between a buy order and a sell order
///
/// The price is always the resting order's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
	pub buy_order_id: OrderId,
	pub sell_order_id: OrderId,
	pub amount: Quantity,
	pub price: Price,
}

impl Match {
	/// Trade log record: `buyOrderId,sellOrderId,amount,price`
	pub fn to_record(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for Match {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{},{},{},{}",
			self.buy_order_id, self.sell_order_id, self.amount, self.price
		)
	}
}

/// Result of crossing one incoming order against the opposite book
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
	/// Unfilled part of the incoming order
	pub remaining: Quantity,
	/// Executions in the order they happened
	pub matches: Vec<Match>,
}

impl MatchOutcome {
	pub fn filled(&self) -> Quantity {
		self.matches.iter().map(|m| m.amount).sum()
	}
}

/// Top of one side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
	pub order_id: OrderId,
	pub price: Price,
	pub amount: Quantity,
}

/// Read-only view of both books, computed on the matching loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStats {
	pub buy_orders: usize,
	pub sell_orders: usize,
	pub buy_depth: Quantity,
	pub sell_depth: Quantity,
	pub best_buy: Option<TopOfBook>,
	pub best_sell: Option<TopOfBook>,
	/// Orders processed since the engine opened
	pub orders_processed: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_match_record_format() {
		let m = Match {
			buy_order_id: 4,
			sell_order_id: 1,
			amount: 10,
			price: 150,
		};
		assert_eq!(m.to_record(), "4,1,10,150");
	}

	#[test]
	fn test_admit_copies_terms() {
		let request = OrderRequest::limit(9, Side::Sell, 25, 300);
		let order = Order::admit(12, 1_000, &request);

		assert_eq!(order.id, 12);
		assert_eq!(order.user_id, 9);
		assert_eq!(order.side, Side::Sell);
		assert_eq!(order.order_type, OrderType::Limit);
		assert_eq!(order.amount, 25);
		assert_eq!(order.price, 300);
		assert_eq!(order.timestamp, 1_000);
	}

	#[test]
	fn test_outcome_filled() {
		let outcome = MatchOutcome {
			remaining: 5,
			matches: vec![
				Match {
					buy_order_id: 3,
					sell_order_id: 1,
					amount: 10,
					price: 100,
				},
				Match {
					buy_order_id: 3,
					sell_order_id: 2,
					amount: 5,
					price: 150,
				},
			],
		};
		assert_eq!(outcome.filled(), 15);
	}
}
