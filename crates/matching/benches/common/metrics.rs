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

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use forge_matching::SubmitError;
use forge_sdk::types::{OrderResult, OrderStatus};

/// Outcome tally shared by every submitter of one end-to-end run
#[derive(Clone, Default)]
pub struct FillTally {
	inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
	filled: AtomicU64,
	partially_filled: AtomicU64,
	resting: AtomicU64,
	expired: AtomicU64,
	volume: AtomicU64,
	timed_out: AtomicU64,
	closed: AtomicU64,
}

impl FillTally {
	pub fn record(&self, outcome: &Result<OrderResult, SubmitError>) {
		let c = &self.inner;
		let counter = match outcome {
			Ok(result) => {
				c.volume.fetch_add(result.filled, Ordering::Relaxed);
				match result.status {
					OrderStatus::Filled => &c.filled,
					OrderStatus::PartiallyFilled => &c.partially_filled,
					OrderStatus::Resting => &c.resting,
					OrderStatus::Expired | OrderStatus::Rejected => &c.expired,
				}
			}
			Err(SubmitError::EngineClosed) => &c.closed,
			Err(_) => &c.timed_out,
		};
		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub fn summary(&self, elapsed: Duration) -> FillSummary {
		let c = &self.inner;
		let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
		let secs = elapsed.as_secs_f64().max(f64::EPSILON);

		let traded = load(&c.filled) + load(&c.partially_filled);
		let answered = traded + load(&c.resting) + load(&c.expired);

		FillSummary {
			answered,
			traded,
			failed: load(&c.timed_out) + load(&c.closed),
			orders_per_sec: answered as f64 / secs,
			volume_per_sec: load(&c.volume) as f64 / secs,
		}
	}
}

pub struct FillSummary {
	pub answered: u64,
	/// Orders that produced at least one execution
	pub traded: u64,
	pub failed: u64,
	pub orders_per_sec: f64,
	pub volume_per_sec: f64,
}

impl FillSummary {
	pub fn cross_ratio(&self) -> f64 {
		if self.answered == 0 {
			0.0
		} else {
			self.traded as f64 / self.answered as f64
		}
	}
}
