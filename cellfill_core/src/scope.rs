//! Per-scope caches. A scope is one (sheet, collection prefix) pair and owns
//! its compiled cells together with the positioning state that advances as
//! items are filled.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;

use crate::AnalysisCell;
use crate::CellKind;
use crate::Direction;
use crate::StyleId;
use crate::TemplateSheet;

/// Identity of a sheet within a fill session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
	pub sheet_no: u32,
	pub sheet_name: String,
}

impl SheetKey {
	pub fn of(sheet: &dyn TemplateSheet) -> Self {
		Self {
			sheet_no: sheet.sheet_no(),
			sheet_name: sheet.sheet_name().to_string(),
		}
	}
}

impl Display for SheetKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{} {}", self.sheet_no, self.sheet_name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
	pub sheet: SheetKey,
	/// The collection prefix. `None` is the root scope.
	pub prefix: Option<String>,
}

impl ScopeKey {
	pub fn new(sheet: SheetKey, prefix: Option<String>) -> Self {
		Self { sheet, prefix }
	}
}

/// Stable handle to a scope inside a [`ScopeCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Compiled cells of a scope, split by kind. Written once, during the
/// template scan.
#[derive(Debug, Clone, Default)]
pub struct CompiledCells {
	pub(crate) common: Vec<AnalysisCell>,
	pub(crate) collection: Vec<AnalysisCell>,
}

impl CompiledCells {
	pub fn common(&self) -> &[AnalysisCell] {
		&self.common
	}

	pub fn collection(&self) -> &[AnalysisCell] {
		&self.collection
	}

	pub fn of_kind(&self, kind: CellKind) -> &[AnalysisCell] {
		match kind {
			CellKind::Common => &self.common,
			CellKind::Collection => &self.collection,
		}
	}

	fn push(&mut self, cell: AnalysisCell) {
		match cell.kind() {
			CellKind::Common => self.common.push(cell),
			CellKind::Collection => self.collection.push(cell),
		}
	}

	fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnalysisCell> {
		self.common.iter_mut().chain(self.collection.iter_mut())
	}
}

/// Where a collection cell lands for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
	pub row: u32,
	pub column: u32,
	/// The first placement of the cell, at its template coordinates.
	pub original: bool,
}

/// Positioning state of a scope. Collection cells are addressed by their
/// index in [`CompiledCells::collection`].
#[derive(Debug, Clone, Default)]
pub struct Positions {
	/// Last row (vertical) or column (horizontal) used per cell.
	cursors: HashMap<usize, u32>,
	/// Style of the template cell, captured on its first placement.
	styles: HashMap<usize, Option<StyleId>>,
	/// Custom height of the block's first template row.
	row_height: Option<f32>,
	/// Index of the last item filled, counted across calls.
	relative_row: Option<u32>,
}

impl Positions {
	/// Advance the cursor of collection cell `index` by one unit in
	/// `direction`, seeding it at the template coordinates on first use.
	pub(crate) fn advance(
		&mut self,
		index: usize,
		cell: &AnalysisCell,
		direction: Direction,
	) -> Placement {
		let origin = match direction {
			Direction::Vertical => cell.row(),
			Direction::Horizontal => cell.column(),
		};
		let (position, original) = match self.cursors.get_mut(&index) {
			Some(cursor) => {
				*cursor += 1;
				(*cursor, false)
			}
			None => {
				self.cursors.insert(index, origin);
				(origin, true)
			}
		};

		match direction {
			Direction::Vertical => {
				Placement {
					row: position,
					column: cell.column(),
					original,
				}
			}
			Direction::Horizontal => {
				Placement {
					row: cell.row(),
					column: position,
					original,
				}
			}
		}
	}

	pub fn cursor(&self, index: usize) -> Option<u32> {
		self.cursors.get(&index).copied()
	}

	/// Whether any item of this scope has been placed yet.
	pub fn has_cursors(&self) -> bool {
		!self.cursors.is_empty()
	}

	pub(crate) fn snapshot_style(&mut self, index: usize, style: Option<StyleId>) {
		self.styles.insert(index, style);
	}

	/// The captured template style of collection cell `index`. The outer
	/// `None` means nothing was captured yet.
	pub fn style(&self, index: usize) -> Option<Option<StyleId>> {
		self.styles.get(&index).copied()
	}

	pub(crate) fn snapshot_row_height(&mut self, height: f32) {
		self.row_height = Some(height);
	}

	pub fn row_height(&self) -> Option<f32> {
		self.row_height
	}

	pub(crate) fn next_relative_row(&mut self) -> u32 {
		let next = self.relative_row.map_or(0, |current| current + 1);
		self.relative_row = Some(next);
		next
	}

	/// The furthest row reached by `cells`: each cell's cursor when it has
	/// one, its template row otherwise.
	pub(crate) fn max_touched_row(&self, cells: &[AnalysisCell]) -> u32 {
		cells
			.iter()
			.enumerate()
			.map(|(index, cell)| self.cursor(index).unwrap_or(cell.row()))
			.max()
			.unwrap_or(0)
	}
}

/// Everything cached for one scope.
#[derive(Debug, Clone)]
pub struct ScopeState {
	pub key: ScopeKey,
	pub compiled: CompiledCells,
	pub positions: Positions,
}

/// Arena of scope states with a key index, plus the set of sheets whose
/// template has been scanned.
#[derive(Debug, Default)]
pub struct ScopeCache {
	scopes: Vec<ScopeState>,
	index: HashMap<ScopeKey, ScopeId>,
	scanned: HashSet<SheetKey>,
}

impl ScopeCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	pub fn id(&self, key: &ScopeKey) -> Option<ScopeId> {
		self.index.get(key).copied()
	}

	pub fn get_or_insert(&mut self, key: ScopeKey) -> ScopeId {
		if let Some(id) = self.index.get(&key) {
			return *id;
		}

		let id = ScopeId(self.scopes.len());
		self.scopes.push(ScopeState {
			key: key.clone(),
			compiled: CompiledCells::default(),
			positions: Positions::default(),
		});
		self.index.insert(key, id);
		id
	}

	pub fn get(&self, id: ScopeId) -> &ScopeState {
		&self.scopes[id.0]
	}

	pub fn get_mut(&mut self, id: ScopeId) -> &mut ScopeState {
		&mut self.scopes[id.0]
	}

	pub fn by_key(&self, key: &ScopeKey) -> Option<&ScopeState> {
		self.id(key).map(|id| self.get(id))
	}

	pub fn is_scanned(&self, sheet: &SheetKey) -> bool {
		self.scanned.contains(sheet)
	}

	pub(crate) fn mark_scanned(&mut self, sheet: SheetKey) {
		self.scanned.insert(sheet);
	}

	/// Add a freshly compiled cell to the scope named by its own prefix.
	/// Returns the scope it landed in.
	///
	/// Cells must arrive in row order: the first collection cell seen for a
	/// row opens that row of the block.
	pub(crate) fn register(&mut self, sheet: &SheetKey, mut cell: AnalysisCell) -> ScopeId {
		let key = ScopeKey::new(sheet.clone(), cell.prefix().map(str::to_string));
		let id = self.get_or_insert(key);
		let compiled = &mut self.get_mut(id).compiled;
		if cell.kind() == CellKind::Collection
			&& !compiled.collection.iter().any(|other| other.row() == cell.row())
		{
			cell.mark_first_row();
		}
		compiled.push(cell);
		id
	}

	/// Move every compiled cell of `sheet`, in any scope, that sits below
	/// `boundary` down by `count` rows.
	pub(crate) fn shift_cells_below(&mut self, sheet: &SheetKey, boundary: u32, count: u32) -> usize {
		let mut moved = 0;
		for scope in self.scopes.iter_mut().filter(|scope| &scope.key.sheet == sheet) {
			for cell in scope.compiled.iter_mut().filter(|cell| cell.row() > boundary) {
				cell.shift_down(count);
				moved += 1;
			}
		}
		moved
	}
}
