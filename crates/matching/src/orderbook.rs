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

use std::cmp::Ordering;

use forge_sdk::types::Side;

use crate::types::{Order, Price, Quantity};

/// Heap slot wrapping a resting order
///
/// `seq` is the insertion sequence within this book. It only matters when
/// two orders share both price and timestamp, and keeps such ties FIFO.
#[derive(Debug, Clone)]
struct Entry {
	order: Order,
	seq: u64,
}

/// One side of the order book (single-threaded)
///
/// An array-backed binary heap keyed by price-time priority. The root is
/// always the best order:
/// - Buy side: highest price first
/// - Sell side: lowest price first
/// - Equal prices: earliest timestamp first
///
/// All operations are designed to be called from a single thread (the
/// matching loop). Heap positions never leave this type.
#[derive(Debug, Clone)]
pub struct PriorityBook {
	side: Side,
	entries: Vec<Entry>,
	next_seq: u64,
}

impl PriorityBook {
	/// Create an empty book for one side
	pub fn new(side: Side) -> Self {
		Self {
			side,
			entries: Vec::new(),
			next_seq: 0,
		}
	}

	pub fn side(&self) -> Side {
		self.side
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Best-priority resting order, without removing it
	pub fn peek(&self) -> Option<&Order> {
		self.entries.first().map(|entry| &entry.order)
	}

	/// Price of the best resting order
	pub fn best_price(&self) -> Option<Price> {
		self.peek().map(|order| order.price)
	}

	/// Total resting quantity on this side
	pub fn depth(&self) -> Quantity {
		self.entries.iter().map(|entry| entry.order.amount).sum()
	}

	/// Add a resting order in O(log n)
	pub fn insert(&mut self, order: Order) {
		debug_assert_eq!(
			order.side, self.side,
			"order {} inserted into the wrong book",
			order.id
		);

		let seq = self.next_seq;
		self.next_seq += 1;

		self.entries.push(Entry { order, seq });
		self.sift_up(self.entries.len() - 1);
	}

	/// Remove and return the best order in O(log n)
	pub fn remove_best(&mut self) -> Option<Order> {
		if self.entries.is_empty() {
			return None;
		}

		let best = self.entries.swap_remove(0);
		if !self.entries.is_empty() {
			self.sift_down(0);
		}
		Some(best.order)
	}

	/// Reduce the best order's amount in place
	///
	/// Price and timestamp are untouched, so the heap order holds. A fill
	/// that consumes the whole order must use `remove_best` instead.
	///
	/// # Panics
	///
	/// Panics if the book is empty or `delta` would leave the best order
	/// with nothing to trade. Either means the caller's matching is broken.
	pub fn decrement_best_amount(&mut self, delta: Quantity) {
		let Some(best) = self.entries.first_mut() else {
			panic!("decrement_best_amount on empty {} book", self.side);
		};

		assert!(
			delta < best.order.amount,
			"decrement of {} would exhaust order {} (amount {})",
			delta,
			best.order.id,
			best.order.amount
		);

		best.order.amount -= delta;
	}

	/// All resting orders from best to worst priority
	pub fn iter_by_priority(&self) -> impl Iterator<Item = &Order> {
		let mut entries: Vec<&Entry> = self.entries.iter().collect();
		entries.sort_by(|a, b| self.compare(a, b));
		entries.into_iter().map(|entry| &entry.order)
	}

	/// `Ordering::Less` means `a` has the higher priority
	fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
		let by_price = match self.side {
			Side::Buy => b.order.price.cmp(&a.order.price),
			Side::Sell => a.order.price.cmp(&b.order.price),
		};

		by_price
			.then_with(|| a.order.timestamp.cmp(&b.order.timestamp))
			.then_with(|| a.seq.cmp(&b.seq))
	}

	fn outranks(&self, i: usize, j: usize) -> bool {
		self.compare(&self.entries[i], &self.entries[j]) == Ordering::Less
	}

	fn sift_up(&mut self, mut idx: usize) {
		while idx > 0 {
			let parent = (idx - 1) / 2;
			if !self.outranks(idx, parent) {
				break;
			}
			self.entries.swap(idx, parent);
			idx = parent;
		}
	}

	fn sift_down(&mut self, mut idx: usize) {
		let len = self.entries.len();
		loop {
			let left = 2 * idx + 1;
			let right = left + 1;
			let mut best = idx;

			if left < len && self.outranks(left, best) {
				best = left;
			}
			if right < len && self.outranks(right, best) {
				best = right;
			}
			if best == idx {
				break;
			}

			self.entries.swap(idx, best);
			idx = best;
		}
	}
}
