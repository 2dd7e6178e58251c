use crate::SheetError;
use crate::SheetResult;
use crate::TemplateSheet;
use crate::ViewKind;

/// Finds and creates rows across the views of a sheet.
///
/// Lookups try each view in `order`. Creation does the same unless a new row
/// is forced, in which case it only touches the template view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLocator {
	order: Vec<ViewKind>,
}

impl Default for RowLocator {
	fn default() -> Self {
		Self {
			order: vec![ViewKind::Primary, ViewKind::Buffered],
		}
	}
}

impl RowLocator {
	pub fn new(order: Vec<ViewKind>) -> Self {
		Self { order }
	}

	pub fn order(&self) -> &[ViewKind] {
		&self.order
	}

	/// The first view in which `row` exists.
	pub fn find_row(&self, sheet: &dyn TemplateSheet, row: u32) -> Option<ViewKind> {
		self.order.iter().copied().find(|kind| {
			sheet
				.view(*kind)
				.is_some_and(|view| view.has_row(row))
		})
	}

	/// Create `row` and return the view that holds it.
	///
	/// Views that refuse the row are skipped; the error of the last view
	/// tried is returned when all refuse.
	pub fn create_row(
		&self,
		sheet: &mut dyn TemplateSheet,
		row: u32,
		force_new_row: bool,
	) -> SheetResult<ViewKind> {
		if force_new_row {
			let kind = sheet.template_view();
			let view = sheet.view_mut(kind).ok_or(SheetError::MissingView(kind))?;
			view.create_row(row)?;
			return Ok(kind);
		}

		let mut last_error = None;
		for kind in self.order.iter().copied() {
			let Some(view) = sheet.view_mut(kind) else {
				continue;
			};
			match view.create_row(row) {
				Ok(()) => return Ok(kind),
				Err(error) => {
					tracing::debug!(row, view = %kind, %error, "row creation refused, trying next view");
					last_error = Some(error);
				}
			}
		}

		Err(last_error.unwrap_or(SheetError::MissingRow(row)))
	}
}
