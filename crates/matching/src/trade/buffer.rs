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

use crossbeam::channel::{Receiver, SendTimeoutError, Sender, TryRecvError, TrySendError, bounded};

use crate::types::Match;

/// SPSC buffer carrying executions from the matching loop to the trade writer
///
/// Trade log I/O never happens on the matching thread. The loop hands each
/// execution to this buffer and carries on; the writer thread drains it.
///
/// Properties:
/// - Single Producer (matching loop)
/// - Single Consumer (trade writer)
/// - Bounded capacity, the producer waits at most a short timeout when full
pub struct TradeBuffer {
	sender: Sender<Match>,
	receiver: Receiver<Match>,
}

impl TradeBuffer {
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split the buffer into producer and consumer ends
	pub fn split(self) -> (TradeProducer, TradeConsumer) {
		(
			TradeProducer {
				sender: self.sender,
			},
			TradeConsumer {
				receiver: self.receiver,
			},
		)
	}
}

/// Producer end of the trade buffer (used by the matching loop)
pub struct TradeProducer {
	sender: Sender<Match>,
}

impl TradeProducer {
	/// Push an execution, waiting up to `timeout` for space
	///
	/// A zero timeout behaves like `try_push`.
	pub fn push(&self, trade: Match, timeout: Duration) -> Result<(), TradeBufferError> {
		if timeout.is_zero() {
			return self.try_push(trade);
		}

		self.sender
			.send_timeout(trade, timeout)
			.map_err(|e| match e {
				SendTimeoutError::Timeout(_) => TradeBufferError::Timeout,
				SendTimeoutError::Disconnected(_) => TradeBufferError::Disconnected,
			})
	}

	/// Push an execution without waiting
	pub fn try_push(&self, trade: Match) -> Result<(), TradeBufferError> {
		self.sender.try_send(trade).map_err(|e| match e {
			TrySendError::Full(_) => TradeBufferError::Full,
			TrySendError::Disconnected(_) => TradeBufferError::Disconnected,
		})
	}

	pub fn is_full(&self) -> bool {
		self.sender.is_full()
	}

	pub fn len(&self) -> usize {
		self.sender.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sender.is_empty()
	}
}

/// Consumer end of the trade buffer (used by the trade writer)
pub struct TradeConsumer {
	receiver: Receiver<Match>,
}

impl TradeConsumer {
	/// Receive an execution (blocking)
	///
	/// Buffered executions are still delivered after the producer is gone;
	/// `Disconnected` only comes once the buffer is empty as well.
	pub fn recv(&self) -> Result<Match, TradeBufferError> {
		self.receiver
			.recv()
			.map_err(|_| TradeBufferError::Disconnected)
	}

	/// Try to receive an execution (non-blocking)
	pub fn try_recv(&self) -> Result<Match, TradeBufferError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => TradeBufferError::Empty,
			TryRecvError::Disconnected => TradeBufferError::Disconnected,
		})
	}

	/// Take up to `max_count` executions that are already buffered
	pub fn drain(&self, max_count: usize) -> Vec<Match> {
		self.receiver.try_iter().take(max_count).collect()
	}
}

/// Errors that can occur when interacting with the trade buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TradeBufferError {
	#[error("Trade buffer is full")]
	Full,
	#[error("Timed out waiting for trade buffer space")]
	Timeout,
	#[error("Trade buffer is empty")]
	Empty,
	#[error("Trade buffer disconnected")]
	Disconnected,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn create_test_trade(buy_order_id: u64) -> Match {
		Match {
			buy_order_id,
			sell_order_id: buy_order_id + 100,
			amount: 1,
			price: 50000,
		}
	}

	#[test]
	fn test_push_and_recv() {
		let buffer = TradeBuffer::new(10);
		let (producer, consumer) = buffer.split();

		producer
			.push(create_test_trade(1), Duration::from_millis(10))
			.unwrap();

		let received = consumer.recv().unwrap();
		assert_eq!(received.buy_order_id, 1);
	}

	#[test]
	fn test_push_times_out_when_full() {
		let buffer = TradeBuffer::new(2);
		let (producer, _consumer) = buffer.split();

		producer.try_push(create_test_trade(1)).unwrap();
		producer.try_push(create_test_trade(2)).unwrap();
		assert!(producer.is_full());

		assert_eq!(
			producer.try_push(create_test_trade(3)),
			Err(TradeBufferError::Full)
		);
		assert_eq!(
			producer.push(create_test_trade(3), Duration::from_millis(5)),
			Err(TradeBufferError::Timeout)
		);
	}

	#[test]
	fn test_drain() {
		let buffer = TradeBuffer::new(10);
		let (producer, consumer) = buffer.split();

		for i in 0..5 {
			producer.try_push(create_test_trade(i)).unwrap();
		}

		let drained = consumer.drain(3);
		assert_eq!(
			drained.iter().map(|t| t.buy_order_id).collect::<Vec<_>>(),
			vec![0, 1, 2]
		);
		assert_eq!(consumer.drain(10).len(), 2);
		assert!(consumer.drain(10).is_empty());
	}

	#[test]
	fn test_buffered_trades_survive_producer_drop() {
		let buffer = TradeBuffer::new(4);
		let (producer, consumer) = buffer.split();

		producer.try_push(create_test_trade(7)).unwrap();
		drop(producer);

		assert_eq!(consumer.recv().map(|t| t.buy_order_id), Ok(7));
		assert_eq!(consumer.recv(), Err(TradeBufferError::Disconnected));
	}
}
