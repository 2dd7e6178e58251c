use miette::Diagnostic;
use thiserror::Error;

use crate::sheet::ViewKind;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum FillError {
	#[error(transparent)]
	#[diagnostic(code(cellfill::io_error))]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	#[diagnostic(transparent)]
	Sheet(#[from] SheetError),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(cellfill::config_parse),
		help("check that cellfill.toml is valid TOML with [fill] and/or [fields] sections")
	)]
	ConfigParse(String),

	#[error("unknown fill direction: `{0}`")]
	#[diagnostic(
		code(cellfill::unknown_direction),
		help("supported directions: vertical, horizontal")
	)]
	UnknownDirection(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(cellfill::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(cellfill::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml")
	)]
	UnsupportedDataFormat(String),

	#[error("failed to turn value into a fill record: {0}")]
	#[diagnostic(code(cellfill::record))]
	Record(String),

	#[error("no converter for field `{field}`: {kind} values cannot be written as {target}")]
	#[diagnostic(
		code(cellfill::missing_converter),
		help("register a converter for this pair or declare a different target type for the field")
	)]
	MissingConverter {
		field: String,
		kind: String,
		target: String,
	},

	#[error("failed to convert field `{field}` to {target}: {reason}")]
	#[diagnostic(code(cellfill::convert))]
	Convert {
		field: String,
		target: String,
		reason: String,
	},
}

/// Failures raised by a document-model implementation.
#[derive(Debug, Diagnostic, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetError {
	#[error("row {row} is in the range [0, {flushed_through}] that is already written to storage")]
	#[diagnostic(
		code(cellfill::row_flushed),
		help("rows that were flushed by a streaming writer can only be reached through the buffered view")
	)]
	RowFlushed { row: u32, flushed_through: u32 },

	#[error("row {0} does not exist")]
	#[diagnostic(code(cellfill::missing_row))]
	MissingRow(u32),

	#[error("cell ({row}, {column}) does not exist")]
	#[diagnostic(code(cellfill::missing_cell))]
	MissingCell { row: u32, column: u32 },

	#[error("the sheet has no {0} view")]
	#[diagnostic(code(cellfill::missing_view))]
	MissingView(ViewKind),

	#[error("cannot shift rows {start}..={end}")]
	#[diagnostic(code(cellfill::invalid_shift))]
	InvalidShift { start: u32, end: u32 },
}

pub type FillResult<T> = Result<T, FillError>;
pub type SheetResult<T> = Result<T, SheetError>;
