use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::Cell;
use crate::CellContext;
use crate::CellValue;
use crate::ConvertContext;
use crate::FillResult;
use crate::MemorySheet;
use crate::PartKind;
use crate::RowContext;
use crate::RowStore;
use crate::StyleId;
use crate::WriteHandler;
use crate::parse;

/// A plain sheet built from text rows.
pub(crate) fn sheet_from_rows(rows: &[&[&str]]) -> MemorySheet {
	MemorySheet::new(0, "Sheet1", RowStore::from_rows(rows.iter().copied()))
}

/// A plain sheet built from an already prepared store.
pub(crate) fn sheet_from_store(store: RowStore) -> MemorySheet {
	MemorySheet::new(0, "Sheet1", store)
}

/// The kinds of the parts of `text`.
pub(crate) fn part_kinds(text: &str) -> Vec<PartKind> {
	parse(text).into_iter().map(|part| part.kind).collect()
}

pub(crate) fn text(value: &str) -> PartKind {
	PartKind::Text(value.to_string())
}

pub(crate) fn common(name: &str) -> PartKind {
	PartKind::CommonVariable(name.to_string())
}

pub(crate) fn collection(prefix: Option<&str>, name: &str) -> PartKind {
	PartKind::CollectionVariable {
		collection: prefix.map(str::to_string),
		name: name.to_string(),
	}
}

/// Joins array items with `, `.
pub(crate) fn join_list(value: &Value, context: &ConvertContext<'_>) -> FillResult<CellValue> {
	let Value::Array(items) = value else {
		return Err(context.error("expected a list"));
	};
	let joined = items
		.iter()
		.map(|item| {
			match item {
				Value::String(text) => text.clone(),
				other => other.to_string(),
			}
		})
		.collect::<Vec<_>>()
		.join(", ");
	Ok(CellValue::Text(joined))
}

/// Records every hook call as a line of text.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingHandler {
	pub events: Rc<RefCell<Vec<String>>>,
}

impl RecordingHandler {
	pub fn events(&self) -> Vec<String> {
		self.events.borrow().clone()
	}

	fn row(&self, hook: &str, context: &RowContext) {
		self.events.borrow_mut().push(format!(
			"{hook} row={} rel={:?}",
			context.row_index, context.relative_row_index
		));
	}

	fn cell(&self, hook: &str, context: &CellContext<'_>) {
		self.events.borrow_mut().push(format!(
			"{hook} cell=({}, {}) vars={}",
			context.row_index,
			context.column_index,
			context.variables.join(",")
		));
	}
}

impl WriteHandler for RecordingHandler {
	fn before_row_create(&mut self, context: &RowContext) {
		self.row("before_row_create", context);
	}

	fn after_row_create(&mut self, context: &RowContext) {
		self.row("after_row_create", context);
	}

	fn after_row_dispose(&mut self, context: &RowContext) {
		self.row("after_row_dispose", context);
	}

	fn before_cell_create(&mut self, context: &CellContext<'_>) {
		self.cell("before_cell_create", context);
	}

	fn after_cell_create(&mut self, context: &CellContext<'_>, _cell: &mut Cell) {
		self.cell("after_cell_create", context);
	}

	fn after_cell_dispose(&mut self, context: &CellContext<'_>, _cell: &mut Cell) {
		self.cell("after_cell_dispose", context);
	}
}

/// Stamps a style on every written cell.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StampStyle(pub StyleId);

impl WriteHandler for StampStyle {
	fn after_cell_dispose(&mut self, _context: &CellContext<'_>, cell: &mut Cell) {
		cell.style = Some(self.0);
	}
}
