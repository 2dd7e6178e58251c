//! Turning data values into typed cell values.
//!
//! A value is converted by the converter registered for its
//! ([`ValueKind`], [`TargetType`]) pair. The target comes from the field's
//! declared [`FieldProperty`] when there is one and from the value itself
//! otherwise. Mixed text cells always resolve their values as text.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fmt::Display;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::CellValue;
use crate::CellfillConfig;
use crate::FillError;
use crate::FillResult;
use crate::PropertyAccessor;

/// The cell type a value is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
	Text,
	Number,
	Boolean,
}

impl Display for TargetType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Text => write!(f, "text"),
			Self::Number => write!(f, "number"),
			Self::Boolean => write!(f, "boolean"),
		}
	}
}

/// The runtime shape of a data value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	Null,
	Bool,
	Number,
	String,
	Array,
	Object,
}

impl ValueKind {
	pub fn of(value: &Value) -> Self {
		match value {
			Value::Null => Self::Null,
			Value::Bool(_) => Self::Bool,
			Value::Number(_) => Self::Number,
			Value::String(_) => Self::String,
			Value::Array(_) => Self::Array,
			Value::Object(_) => Self::Object,
		}
	}

	/// The target a value of this kind is written as when its field
	/// declares none.
	pub fn natural_target(self) -> TargetType {
		match self {
			Self::Bool => TargetType::Boolean,
			Self::Number => TargetType::Number,
			Self::Null | Self::String | Self::Array | Self::Object => TargetType::Text,
		}
	}
}

impl Display for ValueKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Null => write!(f, "null"),
			Self::Bool => write!(f, "boolean"),
			Self::Number => write!(f, "number"),
			Self::String => write!(f, "string"),
			Self::Array => write!(f, "array"),
			Self::Object => write!(f, "object"),
		}
	}
}

/// What a converter is converting for.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
	pub field: &'a str,
	pub target: TargetType,
}

impl ConvertContext<'_> {
	/// A conversion failure for this field.
	pub fn error(&self, reason: impl Into<String>) -> FillError {
		FillError::Convert {
			field: self.field.to_string(),
			target: self.target.to_string(),
			reason: reason.into(),
		}
	}
}

/// Converts one data value into a cell value.
pub trait Converter: Send + Sync {
	fn convert(&self, value: &Value, context: &ConvertContext<'_>) -> FillResult<CellValue>;
}

impl<F> Converter for F
where
	F: Fn(&Value, &ConvertContext<'_>) -> FillResult<CellValue> + Send + Sync,
{
	fn convert(&self, value: &Value, context: &ConvertContext<'_>) -> FillResult<CellValue> {
		self(value, context)
	}
}

/// Writes scalars as their display text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
	fn convert(&self, value: &Value, context: &ConvertContext<'_>) -> FillResult<CellValue> {
		match value {
			Value::String(text) => Ok(CellValue::Text(text.clone())),
			Value::Number(number) => Ok(CellValue::Text(number.to_string())),
			Value::Bool(flag) => Ok(CellValue::Text(flag.to_string())),
			other => Err(context.error(format!("`{other}` is not a scalar"))),
		}
	}
}

/// Writes numbers, parsing numeric strings. Integral values stay integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberConverter;

impl Converter for NumberConverter {
	fn convert(&self, value: &Value, context: &ConvertContext<'_>) -> FillResult<CellValue> {
		match value {
			Value::Number(number) => {
				if let Some(int) = number.as_i64() {
					return Ok(CellValue::Int(int));
				}
				number
					.as_f64()
					.map(CellValue::Number)
					.ok_or_else(|| context.error(format!("`{number}` is out of range")))
			}
			Value::String(text) => {
				let trimmed = text.trim();
				if let Ok(int) = trimmed.parse::<i64>() {
					return Ok(CellValue::Int(int));
				}
				trimmed
					.parse::<f64>()
					.map(CellValue::Number)
					.map_err(|_| context.error(format!("`{text}` is not a number")))
			}
			other => Err(context.error(format!("`{other}` is not a number"))),
		}
	}
}

/// Writes booleans, accepting `"true"` and `"false"` in any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl Converter for BooleanConverter {
	fn convert(&self, value: &Value, context: &ConvertContext<'_>) -> FillResult<CellValue> {
		match value {
			Value::Bool(flag) => Ok(CellValue::Boolean(*flag)),
			Value::String(text) => {
				match text.trim().to_ascii_lowercase().as_str() {
					"true" => Ok(CellValue::Boolean(true)),
					"false" => Ok(CellValue::Boolean(false)),
					_ => Err(context.error(format!("`{text}` is not a boolean"))),
				}
			}
			other => Err(context.error(format!("`{other}` is not a boolean"))),
		}
	}
}

/// Converters keyed by (value kind, target type).
#[derive(Clone)]
pub struct ConverterRegistry {
	converters: HashMap<(ValueKind, TargetType), Arc<dyn Converter>>,
}

impl Debug for ConverterRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut pairs: Vec<String> = self
			.converters
			.keys()
			.map(|(kind, target)| format!("{kind}->{target}"))
			.collect();
		pairs.sort();
		f.debug_struct("ConverterRegistry")
			.field("converters", &pairs)
			.finish()
	}
}

impl Default for ConverterRegistry {
	fn default() -> Self {
		let text: Arc<dyn Converter> = Arc::new(TextConverter);
		let number: Arc<dyn Converter> = Arc::new(NumberConverter);
		let boolean: Arc<dyn Converter> = Arc::new(BooleanConverter);

		let mut registry = Self::empty();
		for kind in [ValueKind::String, ValueKind::Number, ValueKind::Bool] {
			registry.insert(kind, TargetType::Text, text.clone());
		}
		registry.insert(ValueKind::Number, TargetType::Number, number.clone());
		registry.insert(ValueKind::String, TargetType::Number, number);
		registry.insert(ValueKind::Bool, TargetType::Boolean, boolean.clone());
		registry.insert(ValueKind::String, TargetType::Boolean, boolean);
		registry
	}
}

impl ConverterRegistry {
	/// A registry with no converters at all.
	pub fn empty() -> Self {
		Self {
			converters: HashMap::new(),
		}
	}

	/// Register `converter` for the pair, replacing any previous one.
	pub fn register(
		&mut self,
		kind: ValueKind,
		target: TargetType,
		converter: impl Converter + 'static,
	) -> &mut Self {
		self.insert(kind, target, Arc::new(converter));
		self
	}

	fn insert(&mut self, kind: ValueKind, target: TargetType, converter: Arc<dyn Converter>) {
		self.converters.insert((kind, target), converter);
	}

	pub fn get(&self, kind: ValueKind, target: TargetType) -> Option<&Arc<dyn Converter>> {
		self.converters.get(&(kind, target))
	}

	pub fn contains(&self, kind: ValueKind, target: TargetType) -> bool {
		self.converters.contains_key(&(kind, target))
	}
}

/// Declared conversion settings for one field.
#[derive(Clone, Default)]
pub struct FieldProperty {
	/// Cell type to write single-placeholder values as.
	pub target: Option<TargetType>,
	/// Converter used for this field instead of the registry.
	pub converter: Option<Arc<dyn Converter>>,
}

impl Debug for FieldProperty {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FieldProperty")
			.field("target", &self.target)
			.field("converter", &self.converter.is_some())
			.finish()
	}
}

impl FieldProperty {
	pub fn target(target: TargetType) -> Self {
		Self {
			target: Some(target),
			converter: None,
		}
	}

	pub fn converter(converter: impl Converter + 'static) -> Self {
		Self {
			target: None,
			converter: Some(Arc::new(converter)),
		}
	}
}

/// Looks field values up on data items and converts them to cell values.
#[derive(Debug, Clone, Default)]
pub struct ValueResolver {
	converters: ConverterRegistry,
	fields: HashMap<String, FieldProperty>,
}

impl ValueResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// A resolver with the default converters and the field targets declared
	/// in `config`.
	pub fn from_config(config: &CellfillConfig) -> Self {
		let mut resolver = Self::new();
		for (name, field) in &config.fields {
			if let Some(target) = field.target {
				resolver.declare_field(name.clone(), FieldProperty::target(target));
			}
		}
		resolver
	}

	pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
		self.converters = converters;
		self
	}

	pub fn declare_field(&mut self, name: impl Into<String>, property: FieldProperty) -> &mut Self {
		self.fields.insert(name.into(), property);
		self
	}

	pub fn field(&self, name: &str) -> Option<&FieldProperty> {
		self.fields.get(name)
	}

	pub fn converters(&self) -> &ConverterRegistry {
		&self.converters
	}

	pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
		&mut self.converters
	}

	/// The value of `name` on `item` as a cell value of the field's declared
	/// type, or of the value's own type when none is declared. Absent and
	/// null values resolve to [`CellValue::Empty`].
	pub fn resolve(&self, item: &dyn PropertyAccessor, name: &str) -> FillResult<CellValue> {
		self.convert(name, item.property(name), None)
	}

	/// The value of `name` on `item` converted to text. Absent and null
	/// values resolve to an empty string.
	pub fn resolve_text(&self, item: &dyn PropertyAccessor, name: &str) -> FillResult<String> {
		let value = self.convert(name, item.property(name), Some(TargetType::Text))?;
		Ok(value.to_string())
	}

	fn convert(
		&self,
		name: &str,
		value: Option<Value>,
		forced: Option<TargetType>,
	) -> FillResult<CellValue> {
		let Some(value) = value.filter(|value| !value.is_null()) else {
			return Ok(CellValue::Empty);
		};

		let kind = ValueKind::of(&value);
		let property = self.fields.get(name);
		let target = forced
			.or_else(|| property.and_then(|property| property.target))
			.unwrap_or_else(|| kind.natural_target());
		let context = ConvertContext {
			field: name,
			target,
		};

		if let Some(converter) = property.and_then(|property| property.converter.as_ref()) {
			return converter.convert(&value, &context);
		}

		let converter = self.converters.get(kind, target).ok_or_else(|| {
			FillError::MissingConverter {
				field: name.to_string(),
				kind: kind.to_string(),
				target: target.to_string(),
			}
		})?;
		converter.convert(&value, &context)
	}
}
