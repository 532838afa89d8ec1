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

use forge_matching::{
	FileTradeSink, MatchingEngine, config::MatchingConfig, trade::read_trade_log, types::Match,
};
use forge_sdk::types::{OrderRequest, Side};

const TIMEOUT: Duration = Duration::from_secs(10);

async fn run_session(sink: FileTradeSink, requests: Vec<OrderRequest>) -> u64 {
	let engine = MatchingEngine::open(MatchingConfig::default().engine_config(), Box::new(sink))
		.unwrap();
	let gateway = engine.gateway();
	for request in requests {
		gateway.submit_with_timeout(request, TIMEOUT).await.unwrap();
	}
	engine.close().await.unwrap().trades_written
}

fn sweep_scenario() -> Vec<OrderRequest> {
	vec![
		OrderRequest::limit(1, Side::Sell, 10, 100),
		OrderRequest::limit(1, Side::Sell, 10, 200),
		OrderRequest::limit(1, Side::Sell, 10, 150),
		OrderRequest::limit(2, Side::Buy, 20, 200),
	]
}

#[tokio::test]
async fn test_trade_log_records_every_execution() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trades.log");

	let written = run_session(FileTradeSink::create(&path).unwrap(), sweep_scenario()).await;
	assert_eq!(written, 2);

	let contents = std::fs::read_to_string(&path).unwrap();
	assert_eq!(contents, "4,1,10,100\n4,3,10,150\n");
}

#[tokio::test]
async fn test_trade_log_is_readable_back() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trades.log");

	run_session(FileTradeSink::create(&path).unwrap(), sweep_scenario()).await;

	let trades = read_trade_log(&path).unwrap();
	assert_eq!(
		trades,
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
}

#[tokio::test]
async fn test_new_session_truncates_unless_appending() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trades.log");

	run_session(FileTradeSink::create(&path).unwrap(), sweep_scenario()).await;
	run_session(FileTradeSink::append(&path).unwrap(), sweep_scenario()).await;
	assert_eq!(read_trade_log(&path).unwrap().len(), 4);

	run_session(FileTradeSink::create(&path).unwrap(), sweep_scenario()).await;
	assert_eq!(read_trade_log(&path).unwrap().len(), 2);
}

#[tokio::test]
async fn test_trade_visible_before_close() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trades.log");

	let engine = MatchingEngine::open(
		MatchingConfig::default().engine_config(),
		Box::new(FileTradeSink::create(&path).unwrap()),
	)
	.unwrap();
	let gateway = engine.gateway();
	gateway
		.submit_with_timeout(OrderRequest::limit(1, Side::Sell, 3, 100), TIMEOUT)
		.await
		.unwrap();
	gateway
		.submit_with_timeout(OrderRequest::limit(2, Side::Buy, 3, 100), TIMEOUT)
		.await
		.unwrap();

	// Records are flushed as they are written, not only at shutdown
	let deadline = std::time::Instant::now() + TIMEOUT;
	loop {
		if std::fs::read_to_string(&path).unwrap() == "2,1,3,100\n" {
			break;
		}
		assert!(std::time::Instant::now() < deadline, "trade never reached the log");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	engine.close().await.unwrap();
}
