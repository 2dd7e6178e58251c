use std::ops::Range;

use logos::Logos;

use crate::PartKind;
use crate::TemplatePart;
use crate::parser::classify_body;

/// Raw tokens produced by logos for flat tokenization of cell text.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
	#[token("\\{")]
	EscapedOpen,
	#[token("\\}")]
	EscapedClose,
	#[token("{")]
	Open,
	#[token("}")]
	Close,
	#[token("\\")]
	Backslash,
	#[regex(r"[^{}\\]+")]
	Text,
}

/// Walks the logos token stream, splitting the source into literal fragments
/// and placeholder tokens.
struct PartWalker<'a> {
	/// The cell text being split.
	source: &'a str,
	/// The collected raw tokens and their byte spans.
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	/// Unescaped text of the literal fragment being built.
	literal: String,
	/// Byte offset where the current literal fragment starts.
	literal_start: usize,
	/// Collected parts.
	parts: Vec<TemplatePart>,
}

impl<'a> PartWalker<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			literal: String::new(),
			literal_start: 0,
			parts: vec![],
		}
	}

	fn slice(&self, index: usize) -> &'a str {
		let (_, span) = &self.raw_tokens[index];
		&self.source[span.clone()]
	}

	/// Index of the first unescaped `}` after the cursor.
	fn find_close(&self) -> Option<usize> {
		self.raw_tokens[self.cursor + 1..]
			.iter()
			.position(|(result, _)| matches!(result, Ok(RawToken::Close)))
			.map(|offset| self.cursor + 1 + offset)
	}

	/// Append the unescaped text of the token at `index` to the literal.
	fn push_literal(&mut self, index: usize) {
		match &self.raw_tokens[index].0 {
			Ok(RawToken::EscapedOpen) => self.literal.push('{'),
			Ok(RawToken::EscapedClose) => self.literal.push('}'),
			_ => {
				let slice = self.slice(index);
				self.literal.push_str(slice);
			}
		}
	}

	/// Close the current literal fragment at byte offset `end`.
	fn push_text(&mut self, end: usize) {
		let text = std::mem::take(&mut self.literal);
		self.parts.push(TemplatePart {
			index: self.parts.len(),
			span: self.literal_start..end,
			kind: PartKind::Text(text),
		});
	}

	/// Handle the placeholder opened at the cursor and closed at `close`.
	fn process_placeholder(&mut self, close: usize) {
		let open_span = self.raw_tokens[self.cursor].1.clone();
		let close_span = self.raw_tokens[close].1.clone();
		let body = &self.source[open_span.end..close_span.start];

		if body.is_empty() {
			// `{}` is not a placeholder and stays in the literal.
			self.literal.push_str("{}");
		} else {
			self.push_text(open_span.start);
			self.parts.push(TemplatePart {
				index: self.parts.len(),
				span: open_span.start..close_span.end,
				kind: classify_body(body),
			});
			self.literal_start = close_span.end;
		}

		self.cursor = close + 1;
	}

	fn process(&mut self) {
		while self.cursor < self.raw_tokens.len() {
			if matches!(self.raw_tokens[self.cursor].0, Ok(RawToken::Open)) {
				if let Some(close) = self.find_close() {
					self.process_placeholder(close);
					continue;
				}

				// Unterminated: everything from here on is literal text.
				for index in self.cursor..self.raw_tokens.len() {
					self.push_literal(index);
				}
				break;
			}

			self.push_literal(self.cursor);
			self.cursor += 1;
		}

		self.push_text(self.source.len());
	}
}

/// Split cell text into interleaved literal and placeholder parts. The
/// result always starts and ends with a text part.
pub(crate) fn split_parts(source: &str) -> Vec<TemplatePart> {
	let mut walker = PartWalker::new(source);
	walker.process();
	walker.parts
}
