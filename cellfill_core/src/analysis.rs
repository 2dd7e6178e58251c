use serde::Serialize;

use crate::PartKind;
use crate::TemplatePart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CellKind {
	/// Only top-level placeholders; filled in place by scalar data.
	Common,
	/// At least one collection placeholder; repeated once per item.
	Collection,
}

/// The compiled placeholder structure of one template cell.
///
/// Rendering interleaves `fragments` and variable values as
/// `fragments[0] + var[0] + fragments[1] + ... + fragments[n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisCell {
	row: u32,
	column: u32,
	kind: CellKind,
	variables: Vec<String>,
	fragments: Vec<String>,
	only_one_variable: bool,
	first_row_of_block: bool,
	prefix: Option<String>,
}

impl AnalysisCell {
	pub fn row(&self) -> u32 {
		self.row
	}

	pub fn column(&self) -> u32 {
		self.column
	}

	pub fn kind(&self) -> CellKind {
		self.kind
	}

	pub fn variables(&self) -> &[String] {
		&self.variables
	}

	pub fn fragments(&self) -> &[String] {
		&self.fragments
	}

	/// True when the cell is exactly one placeholder with no surrounding
	/// text, so the value can keep its native type.
	pub fn only_one_variable(&self) -> bool {
		self.only_one_variable
	}

	/// True for the first compiled cell of its row within its scope.
	pub fn first_row_of_block(&self) -> bool {
		self.first_row_of_block
	}

	/// The explicit collection name this cell is bound to. `None` is the
	/// root scope.
	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_deref()
	}

	pub(crate) fn mark_first_row(&mut self) {
		self.first_row_of_block = true;
	}

	pub(crate) fn shift_down(&mut self, count: u32) {
		self.row += count;
	}

	/// Interleave the literal fragments with already stringified values.
	pub fn render<S: AsRef<str>>(&self, values: &[S]) -> String {
		let mut output = String::new();
		for (index, fragment) in self.fragments.iter().enumerate() {
			output.push_str(fragment);
			if let Some(value) = values.get(index) {
				output.push_str(value.as_ref());
			}
		}
		output
	}
}

/// The outcome of compiling one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedCell {
	/// No placeholders: the processed text to write back into the cell.
	Literal(String),
	/// At least one placeholder: the cell is blanked and filled later.
	Template(AnalysisCell),
}

/// Compile the parts of the cell at (`row`, `column`).
pub fn compile_cell(parts: &[TemplatePart], row: u32, column: u32) -> PreparedCell {
	let mut variables = Vec::new();
	let mut fragments = Vec::new();
	let mut kind = CellKind::Common;
	let mut prefix: Option<String> = None;
	let mut pending = String::new();

	for part in parts {
		match &part.kind {
			PartKind::Text(text) => pending.push_str(text),
			PartKind::CommonVariable(name) => {
				fragments.push(std::mem::take(&mut pending));
				variables.push(name.clone());
			}
			PartKind::CollectionVariable { collection, name } => {
				fragments.push(std::mem::take(&mut pending));
				variables.push(name.clone());
				kind = CellKind::Collection;
				if let Some(collection) = collection {
					if prefix.as_ref().is_some_and(|current| current != collection) {
						tracing::warn!(
							row,
							column,
							previous = prefix.as_deref(),
							collection = collection.as_str(),
							"cell names more than one collection, the last one wins"
						);
					}
					prefix = Some(collection.clone());
				}
			}
		}
	}

	if variables.is_empty() {
		return PreparedCell::Literal(pending);
	}

	fragments.push(pending);
	let only_one_variable = variables.len() == 1 && fragments.iter().all(String::is_empty);

	PreparedCell::Template(AnalysisCell {
		row,
		column,
		kind,
		variables,
		fragments,
		only_one_variable,
		first_row_of_block: false,
		prefix,
	})
}
