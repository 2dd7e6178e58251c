use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::BraceParser;
use crate::FillError;
use crate::FillResult;
use crate::TargetType;
use crate::TemplateParser;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["cellfill.toml", ".cellfill.toml", ".config/cellfill.toml"];

/// The axis along which collection items are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	/// One row per item, growing downward.
	#[default]
	Vertical,
	/// One column per item, growing rightward.
	Horizontal,
}

impl FromStr for Direction {
	type Err = FillError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"vertical" => Ok(Self::Vertical),
			"horizontal" => Ok(Self::Horizontal),
			_ => Err(FillError::UnknownDirection(value.to_string())),
		}
	}
}

/// Options for a single `fill` call.
#[derive(Debug, Clone)]
pub struct FillConfig {
	pub direction: Direction,
	/// Copy the template cell style and row height onto generated cells.
	pub auto_style: bool,
	/// Reserve room for a vertical collection by shifting the rows below it
	/// before filling.
	pub force_new_row: bool,
	/// Parser used when a sheet's template is scanned.
	pub parser: Arc<dyn TemplateParser>,
}

impl Default for FillConfig {
	fn default() -> Self {
		Self {
			direction: Direction::Vertical,
			auto_style: true,
			force_new_row: false,
			parser: Arc::new(BraceParser),
		}
	}
}

impl FillConfig {
	pub fn vertical() -> Self {
		Self::default()
	}

	pub fn horizontal() -> Self {
		Self::default().with_direction(Direction::Horizontal)
	}

	#[must_use]
	pub fn with_direction(mut self, direction: Direction) -> Self {
		self.direction = direction;
		self
	}

	#[must_use]
	pub fn with_auto_style(mut self, auto_style: bool) -> Self {
		self.auto_style = auto_style;
		self
	}

	#[must_use]
	pub fn with_force_new_row(mut self, force_new_row: bool) -> Self {
		self.force_new_row = force_new_row;
		self
	}

	#[must_use]
	pub fn with_parser(mut self, parser: Arc<dyn TemplateParser>) -> Self {
		self.parser = parser;
		self
	}
}

/// Configuration loaded from a `cellfill.toml` file.
///
/// ```toml
/// [fill]
/// direction = "vertical"
/// force_new_row = true
/// auto_style = true
///
/// [fields.amount]
/// target = "number"
///
/// [fields.reference]
/// target = "text"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CellfillConfig {
	/// Defaults for `fill` calls.
	#[serde(default)]
	pub fill: FillSection,
	/// Declared target types per data field name.
	#[serde(default)]
	pub fields: HashMap<String, FieldConfig>,
}

/// The `[fill]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct FillSection {
	/// `"vertical"` or `"horizontal"`. Checked when converted into a
	/// [`FillConfig`].
	#[serde(default)]
	pub direction: Option<String>,
	#[serde(default)]
	pub force_new_row: bool,
	#[serde(default = "default_auto_style")]
	pub auto_style: bool,
}

impl Default for FillSection {
	fn default() -> Self {
		Self {
			direction: None,
			force_new_row: false,
			auto_style: default_auto_style(),
		}
	}
}

fn default_auto_style() -> bool {
	true
}

impl FillSection {
	/// Build the typed fill options, rejecting unknown directions.
	pub fn fill_config(&self) -> FillResult<FillConfig> {
		let direction = match &self.direction {
			Some(direction) => direction.parse()?,
			None => Direction::default(),
		};

		Ok(FillConfig::default()
			.with_direction(direction)
			.with_force_new_row(self.force_new_row)
			.with_auto_style(self.auto_style))
	}
}

/// A `[fields.<name>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldConfig {
	/// The cell type values of this field are converted to.
	#[serde(default)]
	pub target: Option<TargetType>,
}

impl CellfillConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> FillResult<Option<CellfillConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::from_toml_str(&content).map(Some)
	}

	pub fn from_toml_str(content: &str) -> FillResult<CellfillConfig> {
		toml::from_str(content).map_err(|e| FillError::ConfigParse(e.to_string()))
	}

	pub fn fill_config(&self) -> FillResult<FillConfig> {
		self.fill.fill_config()
	}
}
