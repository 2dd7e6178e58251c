use std::collections::BTreeMap;

use crate::Cell;
use crate::CellValue;
use crate::SheetError;
use crate::SheetResult;
use crate::SheetView;
use crate::StyleId;
use crate::TemplateSheet;
use crate::ViewKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
	/// Explicit height in points; `None` uses the sheet default.
	pub height: Option<f32>,
	pub cells: BTreeMap<u32, Cell>,
}

/// In-memory rows of one sheet view.
///
/// Rows can be flushed: they leave the addressable set (as a streaming
/// writer would write them to disk) and no row at or above a flushed index
/// can be created again.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
	rows: BTreeMap<u32, Row>,
	flushed: BTreeMap<u32, Row>,
	flushed_through: Option<u32>,
}

impl RowStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a store from text rows. Empty strings leave the cell absent.
	pub fn from_rows<R, C>(rows: R) -> Self
	where
		R: IntoIterator<Item = C>,
		C: IntoIterator,
		C::Item: AsRef<str>,
	{
		let mut store = Self::new();
		for (row_index, row) in rows.into_iter().enumerate() {
			for (column, text) in row.into_iter().enumerate() {
				let text = text.as_ref();
				if !text.is_empty() {
					store.set_cell(row_index as u32, column as u32, Cell::new(text));
				}
			}
		}
		store
	}

	/// Insert or replace a cell, creating the row when needed.
	pub fn set_cell(&mut self, row: u32, column: u32, cell: Cell) -> &mut Self {
		self.rows.entry(row).or_default().cells.insert(column, cell);
		self
	}

	pub fn set_style(&mut self, row: u32, column: u32, style: StyleId) -> &mut Self {
		let entry = self
			.rows
			.entry(row)
			.or_default()
			.cells
			.entry(column)
			.or_default();
		entry.style = Some(style);
		self
	}

	pub fn set_height(&mut self, row: u32, height: f32) -> &mut Self {
		self.rows.entry(row).or_default().height = Some(height);
		self
	}

	pub fn row(&self, row: u32) -> Option<&Row> {
		self.rows.get(&row)
	}

	pub fn value(&self, row: u32, column: u32) -> Option<&CellValue> {
		self.cell(row, column).map(|cell| &cell.value)
	}

	/// Text of a cell, if it holds text.
	pub fn text(&self, row: u32, column: u32) -> Option<&str> {
		self.value(row, column).and_then(CellValue::as_text)
	}

	/// Flush every row up to and including `row`.
	pub fn flush_through(&mut self, row: u32) {
		let kept = self.rows.split_off(&(row + 1));
		let flushed = std::mem::replace(&mut self.rows, kept);
		self.flushed.extend(flushed);
		self.flushed_through = Some(self.flushed_through.map_or(row, |current| current.max(row)));
	}

	/// A row that was flushed out of the addressable set.
	pub fn flushed_row(&self, row: u32) -> Option<&Row> {
		self.flushed.get(&row)
	}

	fn ensure_writable(&self, row: u32) -> SheetResult<()> {
		match self.flushed_through {
			Some(flushed_through) if row <= flushed_through => {
				Err(SheetError::RowFlushed {
					row,
					flushed_through,
				})
			}
			_ => Ok(()),
		}
	}

	/// Render the addressable rows as `row N: A=.. B=..` lines.
	pub fn dump(&self) -> String {
		self.rows
			.iter()
			.filter_map(|(index, row)| {
				let cells: Vec<String> = row
					.cells
					.iter()
					.filter(|(_, cell)| !cell.value.is_empty())
					.map(|(column, cell)| format!("{}={}", column_name(*column), cell.value))
					.collect();
				if cells.is_empty() {
					None
				} else {
					Some(format!("row {index}: {}", cells.join(" ")))
				}
			})
			.collect::<Vec<_>>()
			.join("\n")
	}
}

/// Spreadsheet column letters for a zero-based column index.
pub fn column_name(column: u32) -> String {
	let mut name = Vec::new();
	let mut remaining = column + 1;
	while remaining > 0 {
		let rem = (remaining - 1) % 26;
		name.push(b'A' + rem as u8);
		remaining = (remaining - 1) / 26;
	}
	name.reverse();
	String::from_utf8_lossy(&name).into_owned()
}

impl SheetView for RowStore {
	fn last_row_index(&self) -> Option<u32> {
		let live = self.rows.last_key_value().map(|(index, _)| *index);
		let flushed = self.flushed.last_key_value().map(|(index, _)| *index);
		live.max(flushed)
	}

	fn has_row(&self, row: u32) -> bool {
		self.rows.contains_key(&row)
	}

	fn create_row(&mut self, row: u32) -> SheetResult<()> {
		self.ensure_writable(row)?;
		self.rows.entry(row).or_default();
		Ok(())
	}

	fn columns(&self, row: u32) -> Vec<u32> {
		self.rows
			.get(&row)
			.map(|row| row.cells.keys().copied().collect())
			.unwrap_or_default()
	}

	fn row_height(&self, row: u32) -> Option<f32> {
		self.rows.get(&row).and_then(|row| row.height)
	}

	fn set_row_height(&mut self, row: u32, height: f32) {
		if let Some(row) = self.rows.get_mut(&row) {
			row.height = Some(height);
		}
	}

	fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
		self.rows.get(&row).and_then(|row| row.cells.get(&column))
	}

	fn cell_mut(&mut self, row: u32, column: u32) -> Option<&mut Cell> {
		self.rows
			.get_mut(&row)
			.and_then(|row| row.cells.get_mut(&column))
	}

	fn create_cell(&mut self, row: u32, column: u32) -> SheetResult<&mut Cell> {
		self.ensure_writable(row)?;
		let entry = self.rows.get_mut(&row).ok_or(SheetError::MissingRow(row))?;
		Ok(entry.cells.entry(column).or_default())
	}

	fn shift_rows(&mut self, start: u32, end: u32, count: u32) -> SheetResult<()> {
		if start > end {
			return Err(SheetError::InvalidShift { start, end });
		}
		self.ensure_writable(start)?;
		if count == 0 {
			return Ok(());
		}

		let indices: Vec<u32> = self.rows.range(start..=end).map(|(index, _)| *index).collect();
		let moved: Vec<(u32, Row)> = indices
			.into_iter()
			.filter_map(|index| self.rows.remove(&index).map(|row| (index, row)))
			.collect();
		for (index, row) in moved {
			self.rows.insert(index + count, row);
		}

		Ok(())
	}
}

/// An in-memory sheet.
///
/// [`MemorySheet::new`] builds a plain sheet where template and output share
/// one primary view. [`MemorySheet::streaming`] mirrors a streaming writer:
/// the template lives in the buffered view and the primary view starts
/// empty.
#[derive(Debug, Clone)]
pub struct MemorySheet {
	sheet_no: u32,
	name: String,
	primary: RowStore,
	buffered: Option<RowStore>,
}

impl MemorySheet {
	pub fn new(sheet_no: u32, name: impl Into<String>, rows: RowStore) -> Self {
		Self {
			sheet_no,
			name: name.into(),
			primary: rows,
			buffered: None,
		}
	}

	pub fn streaming(sheet_no: u32, name: impl Into<String>, template: RowStore) -> Self {
		Self {
			sheet_no,
			name: name.into(),
			primary: RowStore::new(),
			buffered: Some(template),
		}
	}

	pub fn primary(&self) -> &RowStore {
		&self.primary
	}

	pub fn primary_mut(&mut self) -> &mut RowStore {
		&mut self.primary
	}

	pub fn buffered(&self) -> Option<&RowStore> {
		self.buffered.as_ref()
	}

	pub fn buffered_mut(&mut self) -> Option<&mut RowStore> {
		self.buffered.as_mut()
	}

	/// Look a cell up in the primary view, then in the buffered view.
	pub fn value(&self, row: u32, column: u32) -> Option<&CellValue> {
		self.primary.value(row, column).or_else(|| {
			self.buffered
				.as_ref()
				.and_then(|buffered| buffered.value(row, column))
		})
	}

	pub fn text(&self, row: u32, column: u32) -> Option<&str> {
		self.value(row, column).and_then(CellValue::as_text)
	}

	pub fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
		SheetView::cell(&self.primary, row, column).or_else(|| {
			self.buffered
				.as_ref()
				.and_then(|buffered| SheetView::cell(buffered, row, column))
		})
	}
}

impl TemplateSheet for MemorySheet {
	fn sheet_no(&self) -> u32 {
		self.sheet_no
	}

	fn sheet_name(&self) -> &str {
		&self.name
	}

	fn view(&self, kind: ViewKind) -> Option<&dyn SheetView> {
		match kind {
			ViewKind::Primary => Some(&self.primary),
			ViewKind::Buffered => self.buffered.as_ref().map(|view| view as &dyn SheetView),
		}
	}

	fn view_mut(&mut self, kind: ViewKind) -> Option<&mut dyn SheetView> {
		match kind {
			ViewKind::Primary => Some(&mut self.primary),
			ViewKind::Buffered => {
				self.buffered
					.as_mut()
					.map(|view| view as &mut dyn SheetView)
			}
		}
	}
}
