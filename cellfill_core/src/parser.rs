use std::fmt::Debug;
use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::lexer::split_parts;

/// Separator between a collection name and a field name inside a
/// placeholder, e.g. `{orders.amount}`.
pub const COLLECTION_SEPARATOR: char = '.';

/// One piece of parsed cell text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePart {
	/// Position of this part within the parsed text.
	pub index: usize,
	/// Byte range of the original text this part was read from, escapes and
	/// braces included.
	pub span: Range<usize>,
	pub kind: PartKind,
}

impl TemplatePart {
	/// The original text of this part.
	pub fn source<'a>(&self, text: &'a str) -> &'a str {
		&text[self.span.clone()]
	}

	pub fn is_variable(&self) -> bool {
		!matches!(self.kind, PartKind::Text(_))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PartKind {
	/// Literal text with escapes already removed.
	Text(String),
	/// `{name}`
	CommonVariable(String),
	/// `{collection.name}` or `{.name}`. A missing collection name is
	/// resolved from the wrapper passed to `fill`.
	CollectionVariable {
		collection: Option<String>,
		name: String,
	},
}

/// Turns raw cell text into template parts.
///
/// Implementations never fail: text that does not form a valid placeholder
/// must come back as literal text.
pub trait TemplateParser: Debug + Send + Sync {
	fn parse(&self, text: &str) -> Vec<TemplatePart>;
}

/// The `{name}` / `{collection.name}` / `{.name}` placeholder syntax, with
/// `\{` and `\}` as literal braces.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceParser;

impl TemplateParser for BraceParser {
	fn parse(&self, text: &str) -> Vec<TemplatePart> {
		split_parts(text)
	}
}

/// Parse cell text with the default [`BraceParser`].
pub fn parse(text: impl AsRef<str>) -> Vec<TemplatePart> {
	BraceParser.parse(text.as_ref())
}

/// Classify the text between `{` and `}`.
pub(crate) fn classify_body(body: &str) -> PartKind {
	match body.split_once(COLLECTION_SEPARATOR) {
		// `{list.}` has no field name and is kept whole for compatibility.
		None | Some((_, "")) => PartKind::CommonVariable(body.to_string()),
		Some((collection, name)) => {
			PartKind::CollectionVariable {
				collection: (!collection.is_empty()).then(|| collection.to_string()),
				name: name.to_string(),
			}
		}
	}
}
