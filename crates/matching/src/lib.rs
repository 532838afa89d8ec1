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

//! Forge Matching Engine
//!
//! A single-node limit order matching engine. Buy and sell orders are
//! crossed with price-time priority; executions are appended to a trade
//! log.
//!
//! Architecture:
//! - Single-threaded matching loop owning both books
//! - Bounded MPSC ingress queue, FIFO admission with caller deadlines
//! - SPSC trade buffer feeding a dedicated trade writer thread
//! - In-memory books only; the trade log is the sole persisted state

pub mod config;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod matcher;
pub mod orderbook;
pub mod queue;
pub mod simulation;
pub mod trade;
pub mod types;

pub use engine::{
	EngineCommand, EngineConfig, EngineError, EngineReport, LoopReport, MatchingEngine,
	MatchingEngineState, OrderProcessor,
};
pub use gateway::{IntakeGateway, SubmitError};
pub use matcher::{is_crossable, match_order};
pub use orderbook::PriorityBook;
pub use queue::{IngressQueue, QueueError, QueueReceiver, QueueSender};
pub use trade::{
	FileTradeSink, MemoryTradeSink, SinkError, TradeBuffer, TradeSink, TradeWriter,
	TradeWriterConfig, TradeWriterReport,
};
pub use types::*;
