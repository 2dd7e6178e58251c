use crate::Cell;
use crate::CellKind;

/// The row a hook fires for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowContext {
	pub sheet_no: u32,
	pub row_index: u32,
	/// Index of the collection item being filled. `None` for common cells.
	pub relative_row_index: Option<u32>,
}

/// The cell a hook fires for.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
	pub sheet_no: u32,
	pub row_index: u32,
	pub column_index: u32,
	pub relative_row_index: Option<u32>,
	pub kind: CellKind,
	/// Field names of the template cell.
	pub variables: &'a [String],
}

impl CellContext<'_> {
	pub fn row(&self) -> RowContext {
		RowContext {
			sheet_no: self.sheet_no,
			row_index: self.row_index,
			relative_row_index: self.relative_row_index,
		}
	}
}

/// Observer of the rows and cells a fill creates and writes. Every hook
/// defaults to doing nothing.
pub trait WriteHandler {
	fn before_row_create(&mut self, _context: &RowContext) {}

	fn after_row_create(&mut self, _context: &RowContext) {}

	/// Called once per fill pass for the last row it touched.
	fn after_row_dispose(&mut self, _context: &RowContext) {}

	fn before_cell_create(&mut self, _context: &CellContext<'_>) {}

	fn after_cell_create(&mut self, _context: &CellContext<'_>, _cell: &mut Cell) {}

	/// Called after the value and style of a cell have been written.
	fn after_cell_dispose(&mut self, _context: &CellContext<'_>, _cell: &mut Cell) {}
}
