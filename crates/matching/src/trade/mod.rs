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

//! Trade log pipeline
//!
//! Executions leave the matching loop through a bounded buffer and are
//! appended to a [`TradeSink`] by a dedicated writer thread.

pub mod buffer;
pub mod sink;
pub mod writer;

pub use buffer::{TradeBuffer, TradeBufferError, TradeConsumer, TradeProducer};
pub use sink::{FileTradeSink, MemoryTradeSink, SinkError, TradeSink, read_trade_log};
pub use writer::{TradeWriter, TradeWriterConfig, TradeWriterReport};
