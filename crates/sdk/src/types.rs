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

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// The side an order of this side trades against
	pub fn opposite(self) -> Self {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Buy => f.write_str("BUY"),
			Side::Sell => f.write_str("SELL"),
		}
	}
}

/// Order type
///
/// Limit orders rest whatever they cannot fill. Market orders cross at any
/// available price and never rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
	Limit,
	Market,
}

impl fmt::Display for OrderType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderType::Limit => f.write_str("LIMIT"),
			OrderType::Market => f.write_str("MARKET"),
		}
	}
}

/// Terminal disposition of a submitted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Entire amount executed
	Filled,
	/// Some amount executed, the rest is resting on the book
	PartiallyFilled,
	/// Nothing executed, the whole amount is resting on the book
	Resting,
	/// Market order whose unfilled remainder was discarded
	Expired,
	/// Refused at intake, never reached the book
	Rejected,
}

/// Request to place an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
	/// Submitting user
	pub user_id: u32,
	/// Order side
	pub side: Side,
	/// Order type
	#[serde(rename = "type")]
	pub order_type: OrderType,
	/// Quantity to trade, must be positive
	pub amount: u64,
	/// Limit price, must be positive; ignored for market orders
	pub price: u64,
}

impl OrderRequest {
	pub fn limit(user_id: u32, side: Side, amount: u64, price: u64) -> Self {
		Self {
			user_id,
			side,
			order_type: OrderType::Limit,
			amount,
			price,
		}
	}

	/// Market orders carry no meaningful price; it is stored as zero.
	pub fn market(user_id: u32, side: Side, amount: u64) -> Self {
		Self {
			user_id,
			side,
			order_type: OrderType::Market,
			amount,
			price: 0,
		}
	}

	/// Check the request terms before it is admitted
	pub fn validate(&self) -> Result<(), RequestError> {
		if self.amount == 0 {
			return Err(RequestError::ZeroAmount);
		}
		if self.order_type == OrderType::Limit && self.price == 0 {
			return Err(RequestError::ZeroPrice);
		}
		Ok(())
	}
}

/// Reasons a request is refused before admission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
	#[error("Order amount must be greater than 0")]
	ZeroAmount,
	#[error("Limit order price must be greater than 0")]
	ZeroPrice,
}

/// Outcome delivered to the submitter, exactly once per order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
	pub success: bool,
	/// Human-readable detail
	pub message: String,
	/// Engine-assigned id; `None` when the request was rejected at intake
	pub order_id: Option<u64>,
	pub status: OrderStatus,
	/// Quantity executed against resting orders
	pub filled: u64,
	/// Quantity left after matching (resting for limits, discarded for markets)
	pub remaining: u64,
}

impl OrderResult {
	pub fn rejected(reason: impl Into<String>) -> Self {
		Self {
			success: false,
			message: reason.into(),
			order_id: None,
			status: OrderStatus::Rejected,
			filled: 0,
			remaining: 0,
		}
	}
}
