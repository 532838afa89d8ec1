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

use tokio::sync::oneshot;

use crate::types::{BookStats, OrderCommand};

/// Commands consumed by the matching loop
///
/// Order submissions and control requests share the ingress queue, so a
/// control request observes every order that was enqueued before it. No
/// caller ever touches the books directly.
#[derive(Debug)]
pub enum EngineCommand {
	/// Match one order and reply with its result
	Submit(OrderCommand),

	/// Request a read-only summary of both books
	///
	/// Computed on the matching loop between two orders.
	BookStats {
		respond_to: oneshot::Sender<BookStats>,
	},

	/// Stop accepting new commands
	///
	/// Commands already queued are still processed before the loop exits.
	Shutdown,
}
