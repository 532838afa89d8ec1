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

use forge_sdk::types::{OrderRequest, Side};

#[derive(Clone, Copy)]
pub enum Scenario {
	/// Bids and asks never meet, every order rests
	NoCross,
	/// Everything at one price, nearly every order trades
	CrossHeavy,
	/// Many small resting orders, swept by an occasional large market order
	DeepBook,
}

pub struct OrderGenerator {
	client_id: u32,
	counter: u64,
	scenario: Scenario,
}

impl OrderGenerator {
	pub fn new(client_id: u32, scenario: Scenario) -> Self {
		Self {
			client_id,
			counter: 0,
			scenario,
		}
	}

	fn alternating_side(n: u64) -> Side {
		if n.is_multiple_of(2) {
			Side::Buy
		} else {
			Side::Sell
		}
	}

	pub fn next_order(&mut self) -> OrderRequest {
		self.counter += 1;
		let side = Self::alternating_side(self.counter);

		match self.scenario {
			Scenario::NoCross => {
				let price = match side {
					Side::Buy => 44_000 + (self.counter % 1000),
					Side::Sell => 56_000 + (self.counter % 1000),
				};
				OrderRequest::limit(self.client_id, side, 1, price)
			}
			Scenario::CrossHeavy => OrderRequest::limit(self.client_id, side, 10, 50_000),
			Scenario::DeepBook => {
				if self.counter.is_multiple_of(100) {
					let side = Self::alternating_side(self.counter / 100);
					OrderRequest::market(self.client_id, side, 50_000)
				} else {
					let mid: u64 = 50_000;
					let half: u64 = 1_000;
					let level = self.counter % half;
					// Bids below mid, asks above: makers never cross each other
					let price = match side {
						Side::Buy => mid - 1 - level,
						Side::Sell => mid + 1 + level,
					};
					OrderRequest::limit(self.client_id, side, 1_000, price)
				}
			}
		}
	}

	/// Two-sided resting depth around the same mid price `DeepBook` uses
	pub fn warmup_orders(&self, count: usize) -> Vec<OrderRequest> {
		let mid: u64 = 50_000;
		let half: u64 = 1_000;

		(0..count as u64)
			.map(|i| {
				let side = Self::alternating_side(i);
				let level = (i / 2) % half;
				let price = match side {
					Side::Buy => mid - 1 - level,
					Side::Sell => mid + 1 + level,
				};
				OrderRequest::limit(self.client_id, side, 1_000, price)
			})
			.collect()
	}
}
