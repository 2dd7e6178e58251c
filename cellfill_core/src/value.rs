use std::fmt::Display;

use float_cmp::approx_eq;
use serde::Deserialize;
use serde::Serialize;

/// A typed value stored in a sheet cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
	/// A blank cell.
	#[default]
	Empty,
	Text(String),
	Number(f64),
	Int(i64),
	Boolean(bool),
}

impl CellValue {
	pub fn text(value: impl Into<String>) -> Self {
		Self::Text(value.into())
	}

	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// The text content of a `Text` cell.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text.as_str()),
			_ => None,
		}
	}
}

impl Eq for CellValue {}
impl PartialEq for CellValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Empty, Self::Empty) => true,
			(Self::Text(value), Self::Text(other_value)) => value == other_value,
			(Self::Number(value), Self::Number(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(Self::Int(value), Self::Int(other_value)) => value == other_value,
			(Self::Boolean(value), Self::Boolean(other_value)) => value == other_value,
			_ => false,
		}
	}
}

impl Display for CellValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Empty => Ok(()),
			Self::Text(text) => write!(f, "{text}"),
			Self::Number(number) => write!(f, "{number}"),
			Self::Int(number) => write!(f, "{number}"),
			Self::Boolean(value) => write!(f, "{value}"),
		}
	}
}

impl From<&str> for CellValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for CellValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<f64> for CellValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i64> for CellValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<bool> for CellValue {
	fn from(value: bool) -> Self {
		Self::Boolean(value)
	}
}
