use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::FillError;
use crate::FillResult;

/// Read access to the named fields of one data item.
pub trait PropertyAccessor: Debug {
	/// The value of field `name`, or `None` when the item has no such field.
	fn property(&self, name: &str) -> Option<Value>;
}

/// Objects look up a key. Other scalars bind to every field name, so a list
/// of plain values can fill a single-placeholder column.
impl PropertyAccessor for Value {
	fn property(&self, name: &str) -> Option<Value> {
		match self {
			Value::Object(map) => map.get(name).cloned(),
			Value::Null | Value::Array(_) => None,
			scalar => Some(scalar.clone()),
		}
	}
}

impl PropertyAccessor for Map<String, Value> {
	fn property(&self, name: &str) -> Option<Value> {
		self.get(name).cloned()
	}
}

impl<S: std::hash::BuildHasher> PropertyAccessor for HashMap<String, Value, S> {
	fn property(&self, name: &str) -> Option<Value> {
		self.get(name).cloned()
	}
}

impl PropertyAccessor for BTreeMap<String, Value> {
	fn property(&self, name: &str) -> Option<Value> {
		self.get(name).cloned()
	}
}

/// A structured data item with named fields.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
pub struct Record(Map<String, Value>);

impl Record {
	pub fn new() -> Self {
		Self::default()
	}

	/// Capture the fields of any serializable struct or map.
	pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> FillResult<Self> {
		match serde_json::to_value(value).map_err(|e| FillError::Record(e.to_string()))? {
			Value::Object(map) => Ok(Self(map)),
			other => {
				Err(FillError::Record(format!(
					"expected a struct or map, found `{other}`"
				)))
			}
		}
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(name.into(), value.into());
		self
	}
}

impl PropertyAccessor for Record {
	fn property(&self, name: &str) -> Option<Value> {
		self.0.get(name).cloned()
	}
}

impl From<Map<String, Value>> for Record {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

/// A collection bound to a named repeating region of the template.
#[derive(Debug)]
pub struct FillWrapper {
	name: String,
	items: Vec<Box<dyn PropertyAccessor>>,
}

impl FillWrapper {
	/// An empty `name` targets `{.field}` placeholders.
	pub fn new<I, T>(name: impl Into<String>, items: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: PropertyAccessor + 'static,
	{
		Self {
			name: name.into(),
			items: boxed(items),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

/// Everything `fill` accepts.
#[derive(Debug)]
pub enum FillData {
	/// One item filling the common placeholders.
	Item(Box<dyn PropertyAccessor>),
	/// Items filling the root collection placeholders.
	Items(Vec<Box<dyn PropertyAccessor>>),
	/// Items filling a named collection.
	Wrapped(FillWrapper),
}

/// The data of one fill call with the wrapper resolved.
#[derive(Debug)]
pub(crate) enum Payload {
	Item(Box<dyn PropertyAccessor>),
	Items(Vec<Box<dyn PropertyAccessor>>),
}

impl FillData {
	pub fn item(item: impl PropertyAccessor + 'static) -> Self {
		Self::Item(Box::new(item))
	}

	pub fn items<I, T>(items: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: PropertyAccessor + 'static,
	{
		Self::Items(boxed(items))
	}

	/// Serialize `value` and fill with the result: sequences become items,
	/// anything else a single item.
	pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> FillResult<Self> {
		serde_json::to_value(value)
			.map(Self::from)
			.map_err(|e| FillError::Record(e.to_string()))
	}

	/// Split into the collection prefix and the payload. An empty wrapper
	/// name is the root scope.
	pub(crate) fn into_parts(self) -> (Option<String>, Payload) {
		match self {
			Self::Item(item) => (None, Payload::Item(item)),
			Self::Items(items) => (None, Payload::Items(items)),
			Self::Wrapped(wrapper) => {
				let prefix = (!wrapper.name.is_empty()).then_some(wrapper.name);
				(prefix, Payload::Items(wrapper.items))
			}
		}
	}
}

fn boxed<I, T>(items: I) -> Vec<Box<dyn PropertyAccessor>>
where
	I: IntoIterator<Item = T>,
	T: PropertyAccessor + 'static,
{
	items
		.into_iter()
		.map(|item| Box::new(item) as Box<dyn PropertyAccessor>)
		.collect()
}

impl From<Value> for FillData {
	fn from(value: Value) -> Self {
		match value {
			Value::Array(items) => Self::items(items),
			other => Self::item(other),
		}
	}
}

impl From<Record> for FillData {
	fn from(record: Record) -> Self {
		Self::item(record)
	}
}

impl From<Vec<Record>> for FillData {
	fn from(records: Vec<Record>) -> Self {
		Self::items(records)
	}
}

impl From<FillWrapper> for FillData {
	fn from(wrapper: FillWrapper) -> Self {
		Self::Wrapped(wrapper)
	}
}

/// Read a data file and parse it by extension into a `serde_json::Value`.
pub fn load_data_file(path: &Path) -> FillResult<Value> {
	let path_display = path.display().to_string();
	let content = std::fs::read_to_string(path).map_err(|e| {
		FillError::DataFile {
			path: path_display.clone(),
			reason: e.to_string(),
		}
	})?;
	let format = path
		.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("")
		.to_ascii_lowercase();

	parse_data(&content, format.as_str(), &path_display)
}

/// Parse data `content` in the given `format`.
pub fn parse_data(content: &str, format: &str, path_display: &str) -> FillResult<Value> {
	match format {
		"text" | "txt" => Ok(Value::String(content.to_string())),
		"json" => {
			serde_json::from_str(content).map_err(|e| {
				FillError::DataFile {
					path: path_display.to_string(),
					reason: e.to_string(),
				}
			})
		}
		"toml" => {
			let toml_value: toml::Value = toml::from_str(content).map_err(|e| {
				FillError::DataFile {
					path: path_display.to_string(),
					reason: e.to_string(),
				}
			})?;
			toml_to_json(toml_value, path_display)
		}
		"yaml" | "yml" => {
			serde_yaml_ng::from_str(content).map_err(|e| {
				FillError::DataFile {
					path: path_display.to_string(),
					reason: e.to_string(),
				}
			})
		}
		other => Err(FillError::UnsupportedDataFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value, path_display: &str) -> FillResult<Value> {
	let json = match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::Number(i.into()),
		toml::Value::Float(f) => {
			Value::Number(serde_json::Number::from_f64(f).ok_or_else(|| {
				FillError::DataFile {
					path: path_display.to_string(),
					reason: format!("`{f}` is not a finite number"),
				}
			})?)
		}
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: FillResult<Vec<Value>> = arr
				.into_iter()
				.map(|v| toml_to_json(v, path_display))
				.collect();
			Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v, path_display)?);
			}
			Value::Object(map)
		}
	};

	Ok(json)
}
