//! `cellfill_core` fills spreadsheet templates with data. Template cells
//! carry `{field}` placeholders for single values and `{.field}` or
//! `{collection.field}` placeholders for lists that grow the sheet one row
//! (or column) per item.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template cell text
//!   → Lexer (splits text into literal runs and brace tokens, handling `\{` and `\}`)
//!   → Parser (classifies tokens as common or collection placeholders)
//!   → Analysis (compiles each cell into variables, fragments and a scope prefix)
//!   → Scope cache (holds compiled cells and item positions per sheet and collection)
//!   → Engine (places items, creates rows and cells, writes converted values)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Fill options and `cellfill.toml` loading.
//! - [`sheet`]: The document-model boundary: [`TemplateSheet`] and its
//!   [`SheetView`]s.
//! - [`memory`]: [`MemorySheet`], an in-memory document model with
//!   streaming semantics.
//!
//! ## Key Types
//!
//! - [`FillSession`]: One writer session holding every scope between
//!   calls.
//! - [`FillConfig`]: Direction, style propagation and row reservation for
//!   a `fill` call.
//! - [`FillWrapper`]: A list of items bound to a named collection.
//! - [`ValueResolver`]: Field lookup and typed value conversion.
//! - [`WriteHandler`]: Hooks around row and cell creation.
//!
//! ## Quick Start
//!
//! ```rust
//! use cellfill_core::FillConfig;
//! use cellfill_core::FillSession;
//! use cellfill_core::FillWrapper;
//! use cellfill_core::MemorySheet;
//! use cellfill_core::RowStore;
//! use serde_json::json;
//!
//! let template = RowStore::from_rows([
//! 	vec!["Invoice {number}", ""],
//! 	vec!["{lines.name}", "{lines.amount}"],
//! ]);
//! let mut sheet = MemorySheet::new(0, "Invoice", template);
//! let mut session = FillSession::new();
//! let config = FillConfig::vertical();
//!
//! session.fill(&mut sheet, json!({ "number": 42 }), &config)?;
//! session.fill(
//! 	&mut sheet,
//! 	FillWrapper::new("lines", [
//! 		json!({ "name": "Paper", "amount": 3 }),
//! 		json!({ "name": "Ink", "amount": 1 }),
//! 	]),
//! 	&config,
//! )?;
//!
//! assert_eq!(sheet.text(0, 0), Some("Invoice 42"));
//! assert_eq!(sheet.text(2, 0), Some("Ink"));
//! # Ok::<(), cellfill_core::FillError>(())
//! ```

pub use analysis::*;
pub use config::*;
pub use data::*;
pub use engine::*;
pub use error::*;
pub use handler::*;
pub use locate::*;
pub use memory::*;
pub use parser::*;
pub use resolver::*;
pub use scope::*;
pub use sheet::*;
pub use value::*;

mod analysis;
pub mod config;
mod data;
mod engine;
#[allow(unused_assignments)]
mod error;
mod handler;
pub(crate) mod lexer;
mod locate;
pub mod memory;
mod parser;
mod resolver;
mod scope;
pub mod sheet;
mod value;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
