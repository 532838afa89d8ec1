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

use std::{
	fs::{File, OpenOptions},
	io::{self, BufRead, BufReader, BufWriter, Write},
	path::Path,
	sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::types::Match;

/// Error types for trade sink operations
#[derive(Debug, Error)]
pub enum SinkError {
	#[error("Trade log I/O error: {0}")]
	Io(#[from] io::Error),
	#[error("Malformed trade record at line {line}: {record:?}")]
	Malformed { line: usize, record: String },
	#[error("Trade sink lock poisoned")]
	Poisoned,
}

/// Trade Sink trait - durable record of executions
///
/// One record per execution, in the order the matching loop produced
/// them. Records are never rewritten once accepted.
pub trait TradeSink: Send {
	/// Append one execution
	fn record(&mut self, trade: &Match) -> Result<(), SinkError>;

	/// Push everything accepted so far down to the backing store
	fn flush(&mut self) -> Result<(), SinkError>;

	/// Number of executions accepted so far
	fn records_written(&self) -> u64;
}

/// Append-only text file with one `buyOrderId,sellOrderId,amount,price`
/// line per execution
///
/// Each record is flushed to the OS as soon as it is written; `flush`
/// additionally syncs the file data to disk.
pub struct FileTradeSink {
	writer: BufWriter<File>,
	written: u64,
}

impl FileTradeSink {
	/// Create the log, truncating any previous contents
	pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
		let file = File::create(path.as_ref())?;
		Ok(Self::with_file(file))
	}

	/// Open the log for appending, keeping previous records
	pub fn append(path: impl AsRef<Path>) -> Result<Self, SinkError> {
		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(path.as_ref())?;
		Ok(Self::with_file(file))
	}

	fn with_file(file: File) -> Self {
		Self {
			writer: BufWriter::new(file),
			written: 0,
		}
	}
}

impl TradeSink for FileTradeSink {
	fn record(&mut self, trade: &Match) -> Result<(), SinkError> {
		writeln!(self.writer, "{}", trade.to_record())?;
		self.writer.flush()?;
		self.written += 1;
		Ok(())
	}

	fn flush(&mut self) -> Result<(), SinkError> {
		self.writer.flush()?;
		self.writer.get_ref().sync_data()?;
		Ok(())
	}

	fn records_written(&self) -> u64 {
		self.written
	}
}

/// Read a trade log written by `FileTradeSink`
pub fn read_trade_log(path: impl AsRef<Path>) -> Result<Vec<Match>, SinkError> {
	let reader = BufReader::new(File::open(path)?);
	let mut trades = Vec::new();

	for (idx, line) in reader.lines().enumerate() {
		let line = line?;
		if line.is_empty() {
			continue;
		}
		let trade = parse_record(&line).ok_or_else(|| SinkError::Malformed {
			line: idx + 1,
			record: line.clone(),
		})?;
		trades.push(trade);
	}

	Ok(trades)
}

fn parse_record(record: &str) -> Option<Match> {
	let mut fields = record.split(',').map(|f| f.trim().parse::<u64>());
	let trade = Match {
		buy_order_id: fields.next()?.ok()?,
		sell_order_id: fields.next()?.ok()?,
		amount: fields.next()?.ok()?,
		price: fields.next()?.ok()?,
	};
	fields.next().is_none().then_some(trade)
}

/// In-memory trade sink
///
/// Clones share the same record list, so a test can keep one handle and
/// give the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryTradeSink {
	trades: Arc<Mutex<Vec<Match>>>,
}

impl MemoryTradeSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of everything recorded so far
	pub fn trades(&self) -> Vec<Match> {
		match self.trades.lock() {
			Ok(trades) => trades.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}
}

impl TradeSink for MemoryTradeSink {
	fn record(&mut self, trade: &Match) -> Result<(), SinkError> {
		self.trades
			.lock()
			.map_err(|_| SinkError::Poisoned)?
			.push(*trade);
		Ok(())
	}

	fn flush(&mut self) -> Result<(), SinkError> {
		Ok(())
	}

	fn records_written(&self) -> u64 {
		self.trades().len() as u64
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn create_test_trade(buy_order_id: u64, sell_order_id: u64) -> Match {
		Match {
			buy_order_id,
			sell_order_id,
			amount: 10,
			price: 150,
		}
	}

	#[test]
	fn test_file_sink_writes_records() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("trades.log");

		let mut sink = FileTradeSink::create(&path).unwrap();
		sink.record(&create_test_trade(4, 1)).unwrap();
		sink.record(&create_test_trade(4, 3)).unwrap();
		sink.flush().unwrap();

		assert_eq!(sink.records_written(), 2);
		let contents = std::fs::read_to_string(&path).unwrap();
		assert_eq!(contents, "4,1,10,150\n4,3,10,150\n");
	}

	#[test]
	fn test_create_truncates_and_append_keeps() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("trades.log");

		{
			let mut sink = FileTradeSink::create(&path).unwrap();
			sink.record(&create_test_trade(1, 2)).unwrap();
		}
		{
			let mut sink = FileTradeSink::append(&path).unwrap();
			sink.record(&create_test_trade(3, 4)).unwrap();
		}
		assert_eq!(read_trade_log(&path).unwrap().len(), 2);

		{
			let mut sink = FileTradeSink::create(&path).unwrap();
			sink.record(&create_test_trade(5, 6)).unwrap();
		}
		assert_eq!(
			read_trade_log(&path).unwrap(),
			vec![create_test_trade(5, 6)]
		);
	}

	#[test]
	fn test_read_rejects_malformed_record() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("trades.log");
		std::fs::write(&path, "1,2,3,4\n1,2,three,4\n").unwrap();

		let err = read_trade_log(&path).unwrap_err();
		assert!(matches!(err, SinkError::Malformed { line: 2, .. }));
	}

	#[test]
	fn test_parse_record() {
		assert_eq!(parse_record("4,1,10,150"), Some(create_test_trade(4, 1)));
		assert_eq!(parse_record("4,1,10"), None);
		assert_eq!(parse_record("4,1,10,150,9"), None);
		assert_eq!(parse_record("a,1,10,150"), None);
	}

	#[test]
	fn test_memory_sink_shares_records() {
		let observer = MemoryTradeSink::new();
		let mut sink = observer.clone();

		sink.record(&create_test_trade(2, 1)).unwrap();
		sink.flush().unwrap();

		assert_eq!(observer.trades(), vec![create_test_trade(2, 1)]);
		assert_eq!(observer.records_written(), 1);
	}
}
