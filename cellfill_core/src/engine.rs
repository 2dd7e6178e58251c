use std::fmt::Debug;

use serde::Serialize;

use crate::AnalysisCell;
use crate::CellContext;
use crate::CellKind;
use crate::CellValue;
use crate::Direction;
use crate::FillConfig;
use crate::FillData;
use crate::FillResult;
use crate::Positions;
use crate::PreparedCell;
use crate::PropertyAccessor;
use crate::RowContext;
use crate::RowLocator;
use crate::ScopeCache;
use crate::ScopeId;
use crate::ScopeKey;
use crate::ScopeState;
use crate::SheetError;
use crate::SheetKey;
use crate::StyleId;
use crate::TemplateSheet;
use crate::ValueResolver;
use crate::ViewKind;
use crate::WriteHandler;
use crate::compile_cell;
use crate::data::Payload;

/// Counters collected over the lifetime of a [`FillSession`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillSummary {
	/// Number of `fill` calls.
	pub fill_calls: usize,
	/// Cells that received a value.
	pub cells_written: usize,
	/// Rows materialized by the fill.
	pub rows_created: usize,
	/// Times rows below a collection were shifted down.
	pub row_shifts: usize,
	/// Template rows moved by those shifts, counted once per shift.
	pub rows_moved: usize,
	/// Scopes known when the summary was taken.
	pub scopes: usize,
}

/// One writer session: fills any number of sheets, keeping the compiled
/// template and the item positions of every scope between calls.
///
/// ```rust
/// use cellfill_core::FillConfig;
/// use cellfill_core::FillSession;
/// use cellfill_core::FillWrapper;
/// use cellfill_core::MemorySheet;
/// use cellfill_core::RowStore;
/// use serde_json::json;
///
/// let mut sheet = MemorySheet::new(0, "Sheet1", RowStore::from_rows([["{name}", "{.item}"]]));
/// let mut session = FillSession::new();
/// let config = FillConfig::vertical();
///
/// session.fill(&mut sheet, json!({ "name": "Acme" }), &config)?;
/// session.fill(&mut sheet, FillWrapper::new("", [json!("x"), json!("y")]), &config)?;
///
/// assert_eq!(sheet.text(0, 0), Some("Acme"));
/// assert_eq!(sheet.text(1, 1), Some("y"));
/// # Ok::<(), cellfill_core::FillError>(())
/// ```
pub struct FillSession {
	scopes: ScopeCache,
	resolver: ValueResolver,
	handlers: Vec<Box<dyn WriteHandler>>,
	locator: RowLocator,
	summary: FillSummary,
}

impl Debug for FillSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FillSession")
			.field("scopes", &self.scopes)
			.field("resolver", &self.resolver)
			.field("handlers", &self.handlers.len())
			.field("locator", &self.locator)
			.field("summary", &self.summary)
			.finish()
	}
}

impl Default for FillSession {
	fn default() -> Self {
		Self::new()
	}
}

impl FillSession {
	pub fn new() -> Self {
		Self::with_resolver(ValueResolver::default())
	}

	pub fn with_resolver(resolver: ValueResolver) -> Self {
		Self {
			scopes: ScopeCache::new(),
			resolver,
			handlers: Vec::new(),
			locator: RowLocator::default(),
			summary: FillSummary::default(),
		}
	}

	#[must_use]
	pub fn with_locator(mut self, locator: RowLocator) -> Self {
		self.locator = locator;
		self
	}

	/// Add a handler. Handlers run in registration order.
	pub fn register_handler(&mut self, handler: impl WriteHandler + 'static) -> &mut Self {
		self.handlers.push(Box::new(handler));
		self
	}

	pub fn resolver(&self) -> &ValueResolver {
		&self.resolver
	}

	pub fn resolver_mut(&mut self) -> &mut ValueResolver {
		&mut self.resolver
	}

	pub fn scopes(&self) -> &ScopeCache {
		&self.scopes
	}

	pub fn summary(&self) -> FillSummary {
		FillSummary {
			scopes: self.scopes.len(),
			..self.summary
		}
	}

	/// End the session, dropping every scope.
	pub fn finish(self) -> FillSummary {
		let summary = self.summary();
		tracing::debug!(?summary, "fill session finished");
		summary
	}

	/// Fill `data` into `sheet`.
	///
	/// A single item fills the common placeholders in place. A list of items,
	/// or a [`FillWrapper`](crate::FillWrapper), fills the collection
	/// placeholders of its scope once per item, continuing after the items of
	/// earlier calls.
	///
	/// Errors abort the call. Cells written before the error keep their
	/// values.
	pub fn fill(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		data: impl Into<FillData>,
		config: &FillConfig,
	) -> FillResult<()> {
		let sheet_key = SheetKey::of(sheet);
		let (prefix, payload) = data.into().into_parts();
		let span = tracing::debug_span!(
			"fill",
			sheet = %sheet_key,
			prefix = prefix.as_deref().unwrap_or(""),
			direction = ?config.direction,
		);
		let _guard = span.enter();

		self.summary.fill_calls += 1;
		self.ensure_scanned(sheet, &sheet_key, config)?;
		let id = self.scopes.get_or_insert(ScopeKey::new(sheet_key.clone(), prefix));

		match payload {
			Payload::Item(item) => self.fill_pass(sheet, id, CellKind::Common, item.as_ref(), None, config),
			Payload::Items(items) => {
				if items.is_empty() {
					tracing::debug!("no items to fill");
					return Ok(());
				}

				if config.direction == Direction::Vertical && config.force_new_row {
					self.reserve_rows(sheet, &sheet_key, id, items.len())?;
				}

				for item in &items {
					let relative = self.scopes.get_mut(id).positions.next_relative_row();
					self.fill_pass(
						sheet,
						id,
						CellKind::Collection,
						item.as_ref(),
						Some(relative),
						config,
					)?;
				}

				Ok(())
			}
		}
	}

	/// Compile every placeholder cell of the sheet's template view, the
	/// first time the sheet is seen. Literal cells get their processed text
	/// written back and placeholder cells are blanked.
	fn ensure_scanned(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		sheet_key: &SheetKey,
		config: &FillConfig,
	) -> FillResult<()> {
		if self.scopes.is_scanned(sheet_key) {
			return Ok(());
		}

		let kind = sheet.template_view();
		let view = sheet.view_mut(kind).ok_or(SheetError::MissingView(kind))?;
		let mut templates = 0usize;

		if let Some(last_row) = view.last_row_index() {
			for row in 0..=last_row {
				for column in view.columns(row) {
					let Some(cell) = view.cell_mut(row, column) else {
						continue;
					};
					let Some(text) = cell.value.as_text() else {
						continue;
					};
					if text.is_empty() {
						continue;
					}

					let parts = config.parser.parse(text);
					match compile_cell(&parts, row, column) {
						PreparedCell::Literal(text) => cell.value = CellValue::Text(text),
						PreparedCell::Template(analysis) => {
							cell.value = CellValue::Empty;
							self.scopes.register(sheet_key, analysis);
							templates += 1;
						}
					}
				}
			}
		}

		self.scopes.mark_scanned(sheet_key.clone());
		tracing::debug!(templates, scopes = self.scopes.len(), "template scanned");
		Ok(())
	}

	/// Make room for `count` items below the collection of scope `id` by
	/// shifting the rows under it down.
	fn reserve_rows(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		sheet_key: &SheetKey,
		id: ScopeId,
		count: usize,
	) -> FillResult<()> {
		let state = self.scopes.get(id);
		let cells = state.compiled.collection();
		if cells.is_empty() {
			return Ok(());
		}
		let max_row = state.positions.max_touched_row(cells);
		let resumed = state.positions.has_cursors();

		let kind = sheet.template_view();
		let view = sheet.view_mut(kind).ok_or(SheetError::MissingView(kind))?;
		let Some(last_row) = view.last_row_index() else {
			return Ok(());
		};
		if max_row >= last_row {
			return Ok(());
		}

		// The template row itself holds the first item of a new block.
		let count = u32::try_from(count).unwrap_or(u32::MAX);
		let shift = if resumed { count } else { count - 1 };
		if shift == 0 {
			return Ok(());
		}

		view.shift_rows(max_row + 1, last_row, shift)?;
		let cells_moved = self.scopes.shift_cells_below(sheet_key, max_row, shift);
		self.summary.row_shifts += 1;
		self.summary.rows_moved += (last_row - max_row) as usize;
		tracing::debug!(
			start = max_row + 1,
			end = last_row,
			shift,
			cells_moved,
			"shifted rows below collection"
		);

		Ok(())
	}

	/// Write one item into every cell of `kind` in scope `id`.
	fn fill_pass(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		id: ScopeId,
		kind: CellKind,
		item: &dyn PropertyAccessor,
		relative_row_index: Option<u32>,
		config: &FillConfig,
	) -> FillResult<()> {
		let Self {
			scopes,
			resolver,
			handlers,
			locator,
			summary,
		} = self;
		let ScopeState {
			compiled,
			positions,
			..
		} = scopes.get_mut(id);
		let mut writer = CellWriter {
			handlers,
			locator,
			summary,
			config,
			sheet_no: sheet.sheet_no(),
		};
		let mut last_row = None;

		for (index, analysis) in compiled.of_kind(kind).iter().enumerate() {
			let (row, column, original) = match kind {
				CellKind::Common => (analysis.row(), analysis.column(), true),
				CellKind::Collection => {
					let placement = positions.advance(index, analysis, config.direction);
					(placement.row, placement.column, placement.original)
				}
			};
			let context = CellContext {
				sheet_no: writer.sheet_no,
				row_index: row,
				column_index: column,
				relative_row_index,
				kind,
				variables: analysis.variables(),
			};

			let view = writer.row_if_necessary(sheet, &context)?;
			writer.check_row_height(sheet, view, &context, analysis, original, positions);
			let template_style = writer.cell_if_necessary(sheet, view, &context)?;
			if kind == CellKind::Collection && original {
				positions.snapshot_style(index, template_style);
			}

			let value = resolve_cell(resolver, analysis, item)?;
			let style = match kind {
				CellKind::Collection if config.auto_style => positions.style(index),
				_ => None,
			};
			writer.write(sheet, view, &context, value, style)?;
			last_row = Some(row);
		}

		if let Some(row_index) = last_row {
			let context = RowContext {
				sheet_no: writer.sheet_no,
				row_index,
				relative_row_index,
			};
			for handler in writer.handlers.iter_mut() {
				handler.after_row_dispose(&context);
			}
		}

		Ok(())
	}
}

/// The value of one compiled cell for `item`. A lone placeholder keeps the
/// value's type; anything else renders to text.
fn resolve_cell(
	resolver: &ValueResolver,
	analysis: &AnalysisCell,
	item: &dyn PropertyAccessor,
) -> FillResult<CellValue> {
	if analysis.only_one_variable() {
		if let Some(name) = analysis.variables().first() {
			return resolver.resolve(item, name);
		}
	}

	let values = analysis
		.variables()
		.iter()
		.map(|name| resolver.resolve_text(item, name))
		.collect::<FillResult<Vec<_>>>()?;
	Ok(CellValue::Text(analysis.render(&values)))
}

/// The parts of a session a fill pass writes through.
struct CellWriter<'a> {
	handlers: &'a mut Vec<Box<dyn WriteHandler>>,
	locator: &'a RowLocator,
	summary: &'a mut FillSummary,
	config: &'a FillConfig,
	sheet_no: u32,
}

impl CellWriter<'_> {
	/// The view holding the context's row, creating the row when no view
	/// has it.
	fn row_if_necessary(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		context: &CellContext<'_>,
	) -> FillResult<ViewKind> {
		if let Some(kind) = self.locator.find_row(&*sheet, context.row_index) {
			return Ok(kind);
		}

		let row_context = context.row();
		for handler in self.handlers.iter_mut() {
			handler.before_row_create(&row_context);
		}
		let kind = self
			.locator
			.create_row(sheet, context.row_index, self.config.force_new_row)?;
		self.summary.rows_created += 1;
		for handler in self.handlers.iter_mut() {
			handler.after_row_create(&row_context);
		}

		Ok(kind)
	}

	/// Carry the custom height of a block's first template row onto the rows
	/// generated from it.
	fn check_row_height(
		&self,
		sheet: &mut dyn TemplateSheet,
		kind: ViewKind,
		context: &CellContext<'_>,
		analysis: &AnalysisCell,
		original: bool,
		positions: &mut Positions,
	) {
		if !analysis.first_row_of_block() || self.config.direction != Direction::Vertical {
			return;
		}
		let Some(view) = sheet.view_mut(kind) else {
			return;
		};

		if original {
			if let Some(height) = view.row_height(context.row_index) {
				positions.snapshot_row_height(height);
			}
			return;
		}

		if self.config.auto_style {
			if let Some(height) = positions.row_height() {
				view.set_row_height(context.row_index, height);
			}
		}
	}

	/// Create the context's cell when missing. Returns the style it has
	/// before anything is written.
	fn cell_if_necessary(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		kind: ViewKind,
		context: &CellContext<'_>,
	) -> FillResult<Option<StyleId>> {
		let view = sheet.view_mut(kind).ok_or(SheetError::MissingView(kind))?;
		if let Some(cell) = view.cell(context.row_index, context.column_index) {
			return Ok(cell.style);
		}

		for handler in self.handlers.iter_mut() {
			handler.before_cell_create(context);
		}
		let cell = view.create_cell(context.row_index, context.column_index)?;
		for handler in self.handlers.iter_mut() {
			handler.after_cell_create(context, cell);
		}

		Ok(cell.style)
	}

	fn write(
		&mut self,
		sheet: &mut dyn TemplateSheet,
		kind: ViewKind,
		context: &CellContext<'_>,
		value: CellValue,
		style: Option<Option<StyleId>>,
	) -> FillResult<()> {
		let view = sheet.view_mut(kind).ok_or(SheetError::MissingView(kind))?;
		let cell = view
			.cell_mut(context.row_index, context.column_index)
			.ok_or(SheetError::MissingCell {
				row: context.row_index,
				column: context.column_index,
			})?;

		cell.value = value;
		if let Some(style) = style {
			cell.style = style;
		}
		for handler in self.handlers.iter_mut() {
			handler.after_cell_dispose(context, cell);
		}
		self.summary.cells_written += 1;

		Ok(())
	}
}
