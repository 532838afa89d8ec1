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

use tokio::{
	sync::mpsc::{
		self,
		error::{TryRecvError, TrySendError},
	},
	time::{Instant, timeout_at},
};

use crate::engine::EngineCommand;

/// Ingress Queue abstraction for passing commands from callers to the matching loop
///
/// The Ingress Queue serves as the boundary between the many concurrent
/// callers and the single-threaded matching loop. The order in which
/// commands enter it is the order in which they are matched.
///
/// Properties:
/// - Multiple Producers (one per in-flight submission)
/// - Single Consumer (matching loop)
/// - Bounded capacity for backpressure
/// - Producers wait for capacity up to their own deadline
///
/// The queue does NOT:
/// - Provide scheduling or prioritization
/// - Make business decisions about order acceptance
/// - Implement retry logic
pub struct IngressQueue {
	sender: mpsc::Sender<EngineCommand>,
	receiver: mpsc::Receiver<EngineCommand>,
}

impl IngressQueue {
	/// Create a new ingress queue with the specified capacity
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero.
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = mpsc::channel(capacity);
		Self { sender, receiver }
	}

	/// Split the queue into sender and receiver ends
	///
	/// The sender can be cloned for every caller.
	/// The receiver must remain unique for the single matching loop.
	pub fn split(self) -> (QueueSender, QueueReceiver) {
		(
			QueueSender {
				sender: self.sender,
			},
			QueueReceiver {
				receiver: self.receiver,
			},
		)
	}
}

/// Sender end of the ingress queue (used by the intake gateway)
#[derive(Clone)]
pub struct QueueSender {
	sender: mpsc::Sender<EngineCommand>,
}

impl QueueSender {
	/// Enqueue a command, waiting for capacity until `deadline`
	///
	/// On timeout the command is dropped without ever reaching the
	/// matching loop.
	pub async fn enqueue(&self, cmd: EngineCommand, deadline: Instant) -> Result<(), QueueError> {
		match timeout_at(deadline, self.sender.send(cmd)).await {
			Ok(Ok(())) => Ok(()),
			Ok(Err(_)) => Err(QueueError::Disconnected),
			Err(_) => Err(QueueError::Timeout),
		}
	}

	/// Enqueue a command, waiting for capacity for as long as it takes
	pub async fn send(&self, cmd: EngineCommand) -> Result<(), QueueError> {
		self.sender
			.send(cmd)
			.await
			.map_err(|_| QueueError::Disconnected)
	}

	/// Try to enqueue a command (non-blocking)
	///
	/// Returns error if the queue is full, indicating that the
	/// matching engine is overloaded.
	pub fn try_enqueue(&self, cmd: EngineCommand) -> Result<(), QueueError> {
		self.sender.try_send(cmd).map_err(|e| match e {
			TrySendError::Full(_) => QueueError::Full,
			TrySendError::Closed(_) => QueueError::Disconnected,
		})
	}

	/// Free slots right now
	pub fn available(&self) -> usize {
		self.sender.capacity()
	}

	/// Whether the matching loop has stopped accepting commands
	pub fn is_closed(&self) -> bool {
		self.sender.is_closed()
	}
}

/// Receiver end of the ingress queue (used by the matching loop)
///
/// This cannot be cloned - only one matching loop consumes.
pub struct QueueReceiver {
	receiver: mpsc::Receiver<EngineCommand>,
}

impl QueueReceiver {
	/// Receive the next command (blocking)
	///
	/// Returns `Disconnected` once the queue is closed and drained. Must be
	/// called from a plain thread, never from inside an async runtime.
	pub fn recv(&mut self) -> Result<EngineCommand, QueueError> {
		self.receiver
			.blocking_recv()
			.ok_or(QueueError::Disconnected)
	}

	/// Try to receive a command (non-blocking)
	pub fn try_recv(&mut self) -> Result<EngineCommand, QueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => QueueError::Empty,
			TryRecvError::Disconnected => QueueError::Disconnected,
		})
	}

	/// Stop accepting new commands
	///
	/// Commands already queued can still be received; producers get
	/// `Disconnected` from then on.
	pub fn close(&mut self) {
		self.receiver.close();
	}
}

/// Errors that can occur when interacting with the ingress queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
	#[error("Queue is full")]
	Full,
	#[error("Deadline elapsed while waiting for queue capacity")]
	Timeout,
	#[error("Queue is empty")]
	Empty,
	#[error("Queue disconnected")]
	Disconnected,
}
