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

//! Crossing logic with price-time priority
//!
//! These functions hold no state of their own. They take the incoming
//! order (the aggressor) and the opposite side's book, execute against the
//! best resting orders and report what happened. Deciding what to do with
//! the unfilled remainder is the caller's job.

use forge_sdk::types::{OrderType, Side};

use crate::orderbook::PriorityBook;
use crate::types::{Match, MatchOutcome, Order, OrderId, Price, Quantity};

/// Whether an aggressor may trade against a resting order at `resting_price`
///
/// Market orders cross at any price. A limit buy crosses asks at or below
/// its limit; a limit sell crosses bids at or above it.
pub fn is_crossable(side: Side, order_type: OrderType, limit: Price, resting_price: Price) -> bool {
	match (order_type, side) {
		(OrderType::Market, _) => true,
		(OrderType::Limit, Side::Buy) => resting_price <= limit,
		(OrderType::Limit, Side::Sell) => resting_price >= limit,
	}
}

/// Match an incoming order against the opposite book
///
/// Fully consumed resting orders are removed from `opposite`; a partially
/// consumed one keeps its place with a reduced amount. Every execution is
/// priced at the resting order's price.
///
/// An empty book or a non-crossable best price is not an error: the
/// outcome simply carries the whole amount as remainder and no matches.
pub fn match_order(incoming: &Order, opposite: &mut PriorityBook) -> MatchOutcome {
	debug_assert_eq!(
		opposite.side(),
		incoming.side.opposite(),
		"order {} matched against its own side",
		incoming.id
	);

	let mut remaining = incoming.amount;
	let mut matches = Vec::new();

	while remaining > 0 {
		let Some(top) = opposite.peek() else {
			break;
		};

		if !is_crossable(incoming.side, incoming.order_type, incoming.price, top.price) {
			break;
		}

		let (top_id, top_price, top_amount) = (top.id, top.price, top.amount);

		if top_amount > remaining {
			// Resting order outlives this aggressor
			matches.push(execution(incoming, top_id, remaining, top_price));
			opposite.decrement_best_amount(remaining);
			remaining = 0;
		} else {
			matches.push(execution(incoming, top_id, top_amount, top_price));
			remaining -= top_amount;
			opposite.remove_best();
		}
	}

	MatchOutcome { remaining, matches }
}

fn execution(incoming: &Order, resting_id: OrderId, amount: Quantity, price: Price) -> Match {
	let (buy_order_id, sell_order_id) = match incoming.side {
		Side::Buy => (incoming.id, resting_id),
		Side::Sell => (resting_id, incoming.id),
	};

	Match {
		buy_order_id,
		sell_order_id,
		amount,
		price,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn order(id: u64, side: Side, order_type: OrderType, amount: u64, price: u64, timestamp: u64) -> Order {
		Order {
			id,
			user_id: id as u32,
			side,
			order_type,
			amount,
			price,
			timestamp,
		}
	}

	fn limit(id: u64, side: Side, amount: u64, price: u64, timestamp: u64) -> Order {
		order(id, side, OrderType::Limit, amount, price, timestamp)
	}

	/// Sells at 100, 200, 150 with increasing timestamps
	fn three_level_sell_book() -> PriorityBook {
		let mut book = PriorityBook::new(Side::Sell);
		book.insert(limit(1, Side::Sell, 10, 100, 1641016800));
		book.insert(limit(2, Side::Sell, 10, 200, 1641103200));
		book.insert(limit(3, Side::Sell, 10, 150, 1641189600));
		book
	}

	#[test]
	fn test_buy_sweeps_two_levels() {
		let mut sells = three_level_sell_book();
		let buy = limit(4, Side::Buy, 20, 200, 1641200000);

		let outcome = match_order(&buy, &mut sells);

		assert_eq!(outcome.remaining, 0);
		assert_eq!(
			outcome.matches,
			vec![
				Match {
					buy_order_id: 4,
					sell_order_id: 1,
					amount: 10,
					price: 100
				},
				Match {
					buy_order_id: 4,
					sell_order_id: 3,
					amount: 10,
					price: 150
				},
			]
		);
		assert_eq!(sells.len(), 1);
		let left = sells.peek().unwrap();
		assert_eq!((left.price, left.amount), (200, 10));
	}

	#[test]
	fn test_buy_partially_consumes_resting_order() {
		let mut sells = three_level_sell_book();
		let buy = limit(4, Side::Buy, 15, 200, 1641200000);

		let outcome = match_order(&buy, &mut sells);

		assert_eq!(outcome.remaining, 0);
		assert_eq!(outcome.matches.len(), 2);
		assert_eq!((outcome.matches[0].price, outcome.matches[0].amount), (100, 10));
		assert_eq!((outcome.matches[1].price, outcome.matches[1].amount), (150, 5));

		let top = sells.peek().unwrap();
		assert_eq!((top.id, top.price, top.amount), (3, 150, 5));
		assert_eq!(sells.len(), 2);
	}

	#[test]
	fn test_buy_below_best_ask_does_not_match() {
		let mut sells = PriorityBook::new(Side::Sell);
		sells.insert(limit(1, Side::Sell, 10, 100, 1641016800));
		let buy = limit(2, Side::Buy, 10, 50, 1641016801);

		let outcome = match_order(&buy, &mut sells);

		assert_eq!(outcome.remaining, 10);
		assert!(outcome.matches.is_empty());
		assert_eq!(sells.peek().map(|o| o.amount), Some(10));
	}

	#[test]
	fn test_sell_sweeps_bids_best_first() {
		let mut buys = PriorityBook::new(Side::Buy);
		buys.insert(limit(1, Side::Buy, 10, 100, 1641016800));
		buys.insert(limit(2, Side::Buy, 10, 200, 1641103200));
		buys.insert(limit(3, Side::Buy, 10, 150, 1641189600));
		let sell = limit(4, Side::Sell, 20, 150, 1641200000);

		let outcome = match_order(&sell, &mut buys);

		assert_eq!(outcome.remaining, 0);
		let fills: Vec<(u64, u64, u64)> = outcome
			.matches
			.iter()
			.map(|m| (m.buy_order_id, m.sell_order_id, m.price))
			.collect();
		assert_eq!(fills, vec![(2, 4, 200), (3, 4, 150)]);
		assert_eq!(buys.best_price(), Some(100));
	}

	#[test]
	fn test_market_sell_leaves_remainder() {
		let mut buys = PriorityBook::new(Side::Buy);
		buys.insert(limit(1, Side::Buy, 10, 100, 1));
		let sell = order(2, Side::Sell, OrderType::Market, 20, 100, 2);

		let outcome = match_order(&sell, &mut buys);

		assert_eq!(outcome.remaining, 10);
		assert_eq!(
			outcome.matches,
			vec![Match {
				buy_order_id: 1,
				sell_order_id: 2,
				amount: 10,
				price: 100
			}]
		);
		assert!(buys.is_empty());
	}

	#[test]
	fn test_market_buy_ignores_price() {
		let mut sells = three_level_sell_book();
		let buy = order(4, Side::Buy, OrderType::Market, 25, 0, 5);

		let outcome = match_order(&buy, &mut sells);

		assert_eq!(outcome.remaining, 0);
		let prices: Vec<u64> = outcome.matches.iter().map(|m| m.price).collect();
		assert_eq!(prices, vec![100, 150, 200]);
		assert_eq!(sells.peek().map(|o| o.amount), Some(5));
	}

	#[test]
	fn test_empty_book_yields_no_liquidity() {
		let mut sells = PriorityBook::new(Side::Sell);
		let buy = limit(1, Side::Buy, 7, 100, 1);

		let outcome = match_order(&buy, &mut sells);

		assert_eq!(outcome.remaining, 7);
		assert!(outcome.matches.is_empty());
	}

	#[test]
	fn test_price_time_priority() {
		let mut sells = PriorityBook::new(Side::Sell);
		for i in 0..3 {
			sells.insert(limit(10 + i, Side::Sell, 1, 50000, 1000 + i));
		}
		let buy = limit(20, Side::Buy, 3, 50000, 2000);

		let outcome = match_order(&buy, &mut sells);

		let makers: Vec<u64> = outcome.matches.iter().map(|m| m.sell_order_id).collect();
		assert_eq!(makers, vec![10, 11, 12]);
	}

	#[test]
	fn test_is_crossable() {
		assert!(is_crossable(Side::Buy, OrderType::Limit, 100, 100));
		assert!(is_crossable(Side::Buy, OrderType::Limit, 100, 99));
		assert!(!is_crossable(Side::Buy, OrderType::Limit, 100, 101));
		assert!(is_crossable(Side::Sell, OrderType::Limit, 100, 101));
		assert!(!is_crossable(Side::Sell, OrderType::Limit, 100, 99));
		assert!(is_crossable(Side::Sell, OrderType::Market, 0, 1));
	}
}
