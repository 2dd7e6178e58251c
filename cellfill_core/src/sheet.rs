//! The document-model boundary the fill engine writes through.
//!
//! A sheet exposes up to two views of its rows. The primary view is where a
//! writer materializes new rows. The buffered view, when present, is the
//! fully addressable copy of the template that a streaming writer keeps
//! after it starts flushing rows from the primary view to storage.

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::CellValue;
use crate::SheetResult;

/// Opaque handle to a cell style owned by the document. `None` on a cell
/// means the document default style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StyleId(pub u32);

/// A single cell: typed value plus style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
	pub value: CellValue,
	pub style: Option<StyleId>,
}

impl Cell {
	pub fn new(value: impl Into<CellValue>) -> Self {
		Self {
			value: value.into(),
			style: None,
		}
	}

	#[must_use]
	pub fn with_style(mut self, style: StyleId) -> Self {
		self.style = Some(style);
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
	/// The writer's own view; may stop addressing rows once they are
	/// flushed.
	Primary,
	/// The buffered copy of the template kept alongside a streaming writer.
	Buffered,
}

impl Display for ViewKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Primary => write!(f, "primary"),
			Self::Buffered => write!(f, "buffered"),
		}
	}
}

/// One addressable view of a sheet's rows and cells.
pub trait SheetView {
	/// Index of the last row this view knows about, flushed rows included.
	fn last_row_index(&self) -> Option<u32>;

	fn has_row(&self, row: u32) -> bool;

	fn create_row(&mut self, row: u32) -> SheetResult<()>;

	/// Column indices of the cells present in `row`, ascending.
	fn columns(&self, row: u32) -> Vec<u32>;

	/// The explicitly set height of `row`. `None` means the default height.
	fn row_height(&self, row: u32) -> Option<f32>;

	fn set_row_height(&mut self, row: u32, height: f32);

	fn cell(&self, row: u32, column: u32) -> Option<&Cell>;

	fn cell_mut(&mut self, row: u32, column: u32) -> Option<&mut Cell>;

	/// Create an empty cell in an existing row, replacing nothing if the cell
	/// is already there.
	fn create_cell(&mut self, row: u32, column: u32) -> SheetResult<&mut Cell>;

	/// Move rows `start..=end` down by `count`.
	fn shift_rows(&mut self, start: u32, end: u32, count: u32) -> SheetResult<()>;
}

/// A sheet as seen by the fill engine.
pub trait TemplateSheet {
	fn sheet_no(&self) -> u32;

	fn sheet_name(&self) -> &str;

	fn view(&self, kind: ViewKind) -> Option<&dyn SheetView>;

	fn view_mut(&mut self, kind: ViewKind) -> Option<&mut dyn SheetView>;

	/// The view holding the template: the buffered view when the sheet has
	/// one, the primary view otherwise.
	fn template_view(&self) -> ViewKind {
		if self.view(ViewKind::Buffered).is_some() {
			ViewKind::Buffered
		} else {
			ViewKind::Primary
		}
	}
}
