use rstest::rstest;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;

#[rstest]
#[case::plain("plain", vec![text("plain")])]
#[case::common("{name}", vec![text(""), common("name"), text("")])]
#[case::surrounded("Total {amount} EUR", vec![text("Total "), common("amount"), text(" EUR")])]
#[case::root_collection("{.x}", vec![text(""), collection(None, "x"), text("")])]
#[case::named_collection("{c.x}", vec![text(""), collection(Some("c"), "x"), text("")])]
#[case::nested_field("{c.x.y}", vec![text(""), collection(Some("c"), "x.y"), text("")])]
#[case::empty_field("{a.}", vec![text(""), common("a."), text("")])]
#[case::escaped(r"\{foo\}", vec![text("{foo}")])]
#[case::escaped_around(r"\{{name}\}", vec![text("{"), common("name"), text("}")])]
#[case::empty_body("{}", vec![text("{}")])]
#[case::unterminated("a {b", vec![text("a {b")])]
#[case::unterminated_after_variable("{a} {b", vec![text(""), common("a"), text(" {b")])]
#[case::lone_close("a}b", vec![text("a}b")])]
#[case::trailing_backslash(r"a\", vec![text(r"a\")])]
fn parse_cell_text(#[case] input: &str, #[case] expected: Vec<PartKind>) {
	assert_eq!(part_kinds(input), expected);
}

#[test]
fn parsed_parts_reconstruct_the_source() {
	let input = "Hello {name}, {.x} and {c.y}!";
	let parts = parse(input);
	let rebuilt: String = parts.iter().map(|part| part.source(input)).collect();

	assert_eq!(rebuilt, input);
	assert_eq!(parts.len(), 7);
	assert!(parts.iter().enumerate().all(|(index, part)| part.index == index));
	assert_eq!(parts[1].span, 6..12);
}

#[test]
fn parts_alternate_text_and_variables() {
	let parts = parse("{a}{b}");
	let variables: Vec<bool> = parts.iter().map(TemplatePart::is_variable).collect();

	assert_eq!(variables, vec![false, true, false, true, false]);
}

#[test]
fn compile_single_placeholder() {
	let PreparedCell::Template(cell) = compile_cell(&parse("{name}"), 2, 3) else {
		panic!("expected a template cell");
	};

	assert_eq!(cell.kind(), CellKind::Common);
	assert_eq!(cell.row(), 2);
	assert_eq!(cell.column(), 3);
	assert_eq!(cell.variables(), ["name".to_string()]);
	assert_eq!(cell.fragments(), [String::new(), String::new()]);
	assert!(cell.only_one_variable());
	assert_eq!(cell.prefix(), None);
}

#[test]
fn compile_mixed_text() {
	let PreparedCell::Template(cell) = compile_cell(&parse("Total {amount} EUR"), 0, 0) else {
		panic!("expected a template cell");
	};

	assert!(!cell.only_one_variable());
	assert_eq!(cell.fragments(), ["Total ".to_string(), " EUR".to_string()]);
	assert_eq!(cell.render(&["12"]), "Total 12 EUR");
}

#[test]
fn compile_collection_with_common_variable() {
	let PreparedCell::Template(cell) = compile_cell(&parse("{.x}{name}"), 0, 0) else {
		panic!("expected a template cell");
	};

	assert_eq!(cell.kind(), CellKind::Collection);
	assert_eq!(cell.prefix(), None);
	assert_eq!(cell.variables(), ["x".to_string(), "name".to_string()]);
	assert!(!cell.only_one_variable());
}

#[rstest]
#[case::plain("no placeholders", "no placeholders")]
#[case::escaped(r"literal \{x\}", "literal {x}")]
#[case::empty_body("{}", "{}")]
fn compile_literal(#[case] input: &str, #[case] expected: &str) {
	assert_eq!(
		compile_cell(&parse(input), 0, 0),
		PreparedCell::Literal(expected.to_string())
	);
}

#[test]
#[traced_test]
fn compile_conflicting_collections_keeps_the_last() {
	let PreparedCell::Template(cell) = compile_cell(&parse("{a.x}-{b.y}"), 0, 0) else {
		panic!("expected a template cell");
	};

	assert_eq!(cell.prefix(), Some("b"));
	assert!(logs_contain("the last one wins"));
}

#[test]
fn fill_common_and_root_collection() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{name}", "{.item}"], &["footer"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, json!({ "name": "Acme" }), &config)?;
	session.fill(
		&mut sheet,
		FillWrapper::new("", [json!("x"), json!("y"), json!("z")]),
		&config,
	)?;

	insta::assert_snapshot!(sheet.primary().dump(), @r"
row 0: A=Acme B=x
row 1: B=y
row 2: B=z
row 3: A=footer
");

	let summary = session.finish();
	assert_eq!(summary, FillSummary {
		fill_calls: 2,
		cells_written: 4,
		rows_created: 2,
		row_shifts: 1,
		rows_moved: 1,
		scopes: 1,
	});

	Ok(())
}

#[test]
fn later_fills_continue_below_earlier_items() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{name}", "{.item}"], &["footer"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, FillWrapper::new("", [json!("x"), json!("y")]), &config)?;
	session.fill(&mut sheet, FillWrapper::new("", [json!("z")]), &config)?;
	session.fill(&mut sheet, json!({ "name": "Acme" }), &config)?;

	assert_eq!(sheet.text(0, 0), Some("Acme"));
	assert_eq!(sheet.text(0, 1), Some("x"));
	assert_eq!(sheet.text(1, 1), Some("y"));
	assert_eq!(sheet.text(2, 1), Some("z"));
	assert_eq!(sheet.text(3, 0), Some("footer"));

	Ok(())
}

#[test]
fn common_cells_stay_in_place_across_fills() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["Name: {name}"]]);
	let mut session = FillSession::new();
	let config = FillConfig::default();

	session.fill(&mut sheet, json!({ "name": "first" }), &config)?;
	session.fill(&mut sheet, json!({ "name": "second" }), &config)?;

	assert_eq!(sheet.text(0, 0), Some("Name: second"));
	assert!(sheet.primary().row(1).is_none());

	Ok(())
}

#[test]
fn vertical_fill_without_reserving_rows_overwrites_below() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{.a}", "{.b}"], &["old", "old"]]);
	let mut session = FillSession::new();

	session.fill(
		&mut sheet,
		json!([{ "a": 1, "b": "one" }, { "a": 2, "b": "two" }]),
		&FillConfig::vertical(),
	)?;

	assert_eq!(sheet.value(0, 0), Some(&CellValue::Int(1)));
	assert_eq!(sheet.text(0, 1), Some("one"));
	assert_eq!(sheet.value(1, 0), Some(&CellValue::Int(2)));
	assert_eq!(sheet.text(1, 1), Some("two"));
	assert_eq!(session.summary().row_shifts, 0);

	Ok(())
}

#[test]
fn horizontal_fill_grows_columns() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["Values", "{.v}"]]);
	let mut session = FillSession::new();

	session.fill(&mut sheet, json!([1, 2, 3]), &FillConfig::horizontal())?;

	assert_eq!(sheet.text(0, 0), Some("Values"));
	assert_eq!(sheet.value(0, 1), Some(&CellValue::Int(1)));
	assert_eq!(sheet.value(0, 2), Some(&CellValue::Int(2)));
	assert_eq!(sheet.value(0, 3), Some(&CellValue::Int(3)));
	assert_eq!(session.summary().rows_created, 0);

	Ok(())
}

#[rstest]
#[case::auto_style(true, Some(StyleId(7)))]
#[case::plain(false, None)]
fn template_style_is_copied_to_generated_cells(
	#[case] auto_style: bool,
	#[case] expected: Option<StyleId>,
) -> FillResult<()> {
	let mut store = RowStore::new();
	store.set_cell(0, 0, Cell::new("{.v}").with_style(StyleId(7)));
	let mut sheet = sheet_from_store(store);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_auto_style(auto_style);

	session.fill(&mut sheet, json!(["a", "b", "c"]), &config)?;

	assert_eq!(sheet.cell(0, 0).and_then(|cell| cell.style), Some(StyleId(7)));
	assert_eq!(sheet.cell(1, 0).and_then(|cell| cell.style), expected);
	assert_eq!(sheet.cell(2, 0).and_then(|cell| cell.style), expected);

	Ok(())
}

#[rstest]
#[case::auto_style(true, Some(30.0))]
#[case::plain(false, None)]
fn template_row_height_is_copied_to_generated_rows(
	#[case] auto_style: bool,
	#[case] expected: Option<f32>,
) -> FillResult<()> {
	let mut store = RowStore::from_rows([["{.v}"]]);
	store.set_height(0, 30.0);
	let mut sheet = sheet_from_store(store);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_auto_style(auto_style);

	session.fill(&mut sheet, json!(["a", "b", "c"]), &config)?;

	assert_eq!(sheet.primary().row_height(0), Some(30.0));
	assert_eq!(sheet.primary().row_height(1), expected);
	assert_eq!(sheet.primary().row_height(2), expected);

	Ok(())
}

#[test]
fn named_collections_advance_independently() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{a.x}", "{b.y}"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical();

	session.fill(&mut sheet, FillWrapper::new("a", [json!({ "x": 1 }), json!({ "x": 2 })]), &config)?;
	session.fill(&mut sheet, FillWrapper::new("b", [json!({ "y": "p" })]), &config)?;
	session.fill(&mut sheet, FillWrapper::new("b", [json!({ "y": "q" })]), &config)?;

	assert_eq!(sheet.value(0, 0), Some(&CellValue::Int(1)));
	assert_eq!(sheet.value(1, 0), Some(&CellValue::Int(2)));
	assert_eq!(sheet.text(0, 1), Some("p"));
	assert_eq!(sheet.text(1, 1), Some("q"));
	assert_eq!(session.finish().scopes, 2);

	Ok(())
}

#[test]
fn template_is_scanned_once_per_sheet() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{a.v}", "{b.v}"], &[r"\{x\}"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical();

	session.fill(&mut sheet, FillWrapper::new("a", [json!(1)]), &config)?;
	assert_eq!(sheet.text(1, 0), Some("{x}"));
	assert!(sheet.value(0, 1).is_some_and(CellValue::is_empty));

	session.fill(&mut sheet, FillWrapper::new("b", [json!(2)]), &config)?;
	assert_eq!(sheet.text(1, 0), Some("{x}"));
	assert_eq!(sheet.value(0, 1), Some(&CellValue::Int(2)));

	let key = ScopeKey::new(SheetKey::of(&sheet), Some("b".to_string()));
	let scope = session.scopes().by_key(&key);
	assert_eq!(scope.map(|scope| scope.compiled.collection().len()), Some(1));

	Ok(())
}

#[test]
fn reserving_rows_at_the_end_of_the_sheet_shifts_nothing() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{.v}"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, json!(["a", "b", "c"]), &config)?;

	let summary = session.finish();
	assert_eq!(summary.row_shifts, 0);
	assert_eq!(summary.rows_created, 2);
	assert_eq!(sheet.text(2, 0), Some("c"));

	Ok(())
}

#[test]
fn shifted_rows_move_common_cells_below_the_block() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{.v}"], &["Total {total}"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, json!(["a", "b", "c"]), &config)?;
	session.fill(&mut sheet, json!({ "total": 3 }), &config)?;

	assert_eq!(sheet.text(2, 0), Some("c"));
	assert_eq!(sheet.text(3, 0), Some("Total 3"));

	Ok(())
}

#[test]
fn stacked_named_blocks_shift_each_other() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{a.x}"], &["{b.y}"], &["footer"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, FillWrapper::new("a", [json!(1), json!(2), json!(3)]), &config)?;
	session.fill(&mut sheet, FillWrapper::new("b", [json!("p"), json!("q")]), &config)?;

	insta::assert_snapshot!(sheet.primary().dump(), @r"
row 0: A=1
row 1: A=2
row 2: A=3
row 3: A=p
row 4: A=q
row 5: A=footer
");

	let summary = session.finish();
	assert_eq!(summary.row_shifts, 2);
	assert_eq!(summary.scopes, 2);

	Ok(())
}

#[test]
fn empty_item_lists_write_nothing() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{.v}"], &["below"]]);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, FillData::items(Vec::<Value>::new()), &config)?;

	let summary = session.finish();
	assert_eq!(summary.cells_written, 0);
	assert_eq!(summary.row_shifts, 0);
	assert_eq!(sheet.text(1, 0), Some("below"));

	Ok(())
}

#[test]
fn fill_with_serializable_structs() -> FillResult<()> {
	#[derive(Serialize)]
	struct Line {
		name: &'static str,
		qty: u32,
	}

	let lines = vec![Line { name: "Paper", qty: 3 }, Line { name: "Ink", qty: 1 }];
	let mut sheet = sheet_from_rows(&[&["{.name}", "{.qty}"]]);
	let mut session = FillSession::new();

	session.fill(&mut sheet, FillData::from_serialize(&lines)?, &FillConfig::vertical())?;

	assert_eq!(sheet.text(1, 0), Some("Ink"));
	assert_eq!(sheet.value(1, 1), Some(&CellValue::Int(1)));

	Ok(())
}

#[test]
fn records_fill_common_cells() -> FillResult<()> {
	let record = Record::new().with("who", "world").with("count", 2);
	let mut sheet = sheet_from_rows(&[&["Hello {who}!", "{count}"]]);
	let mut session = FillSession::new();

	session.fill(&mut sheet, record, &FillConfig::default())?;

	assert_eq!(sheet.text(0, 0), Some("Hello world!"));
	assert_eq!(sheet.value(0, 1), Some(&CellValue::Int(2)));

	Ok(())
}

#[test]
fn record_from_non_object_fails() {
	let result = Record::from_serialize(&5);
	assert!(matches!(result, Err(FillError::Record(_))));
}

#[test]
fn absent_values_leave_blank_cells() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{missing}", "Hi {who}!", "{nothing}"]]);
	let mut session = FillSession::new();

	session.fill(&mut sheet, json!({ "nothing": null }), &FillConfig::default())?;

	assert_eq!(sheet.value(0, 0), Some(&CellValue::Empty));
	assert_eq!(sheet.text(0, 1), Some("Hi !"));
	assert_eq!(sheet.value(0, 2), Some(&CellValue::Empty));

	Ok(())
}

#[rstest]
#[case::number(json!(12.5), None, CellValue::Number(12.5))]
#[case::integer(json!(12), None, CellValue::Int(12))]
#[case::boolean(json!(true), None, CellValue::Boolean(true))]
#[case::string(json!("abc"), None, CellValue::text("abc"))]
#[case::number_as_text(json!(7), Some(TargetType::Text), CellValue::text("7"))]
#[case::text_as_number(json!(" 3.5 "), Some(TargetType::Number), CellValue::Number(3.5))]
#[case::text_as_integer(json!("42"), Some(TargetType::Number), CellValue::Int(42))]
#[case::text_as_boolean(json!("TRUE"), Some(TargetType::Boolean), CellValue::Boolean(true))]
fn resolve_typed_values(
	#[case] value: Value,
	#[case] target: Option<TargetType>,
	#[case] expected: CellValue,
) -> FillResult<()> {
	let mut resolver = ValueResolver::new();
	if let Some(target) = target {
		resolver.declare_field("field", FieldProperty::target(target));
	}
	let item = json!({ "field": value });

	assert_eq!(resolver.resolve(&item, "field")?, expected);

	Ok(())
}

#[test]
fn mixed_cells_render_values_as_text() -> FillResult<()> {
	let mut resolver = ValueResolver::new();
	resolver.declare_field("amount", FieldProperty::target(TargetType::Number));
	let item = json!({ "amount": 12.5, "flag": false });

	assert_eq!(resolver.resolve_text(&item, "amount")?, "12.5");
	assert_eq!(resolver.resolve_text(&item, "flag")?, "false");
	assert_eq!(resolver.resolve_text(&item, "absent")?, "");

	Ok(())
}

#[test]
fn conversion_errors_abort_without_rollback() {
	let mut resolver = ValueResolver::new();
	resolver.declare_field("amount", FieldProperty::target(TargetType::Number));
	let mut sheet = sheet_from_rows(&[&["{.amount}", "{.label}"]]);
	let mut session = FillSession::with_resolver(resolver);

	let result = session.fill(
		&mut sheet,
		json!([
			{ "amount": "12", "label": "a" },
			{ "amount": "abc", "label": "b" },
		]),
		&FillConfig::vertical(),
	);

	let Err(FillError::Convert { field, target, .. }) = result else {
		panic!("expected a conversion error, got {result:?}");
	};
	assert_eq!(field, "amount");
	assert_eq!(target, "number");
	assert_eq!(sheet.value(0, 0), Some(&CellValue::Int(12)));
	assert_eq!(sheet.text(0, 1), Some("a"));
	assert_eq!(sheet.value(1, 0), Some(&CellValue::Empty));
	assert_eq!(sheet.value(1, 1), None);
}

#[test]
fn lists_have_no_default_converter() {
	let mut sheet = sheet_from_rows(&[&["{tags}"]]);
	let mut session = FillSession::new();

	let result = session.fill(&mut sheet, json!({ "tags": ["a", "b"] }), &FillConfig::default());

	let Err(FillError::MissingConverter {
		field,
		kind,
		target,
	}) = result
	else {
		panic!("expected a missing converter error, got {result:?}");
	};
	assert_eq!(field, "tags");
	assert_eq!(kind, "array");
	assert_eq!(target, "text");
}

#[test]
fn registered_converters_handle_new_pairs() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{tags}", "Tags: {tags}"]]);
	let mut session = FillSession::new();
	assert!(
		!session
			.resolver()
			.converters()
			.contains(ValueKind::Array, TargetType::Text)
	);
	session
		.resolver_mut()
		.converters_mut()
		.register(ValueKind::Array, TargetType::Text, join_list);
	assert!(
		session
			.resolver()
			.converters()
			.contains(ValueKind::Array, TargetType::Text)
	);

	session.fill(&mut sheet, json!({ "tags": ["a", "b"] }), &FillConfig::default())?;

	assert_eq!(sheet.text(0, 0), Some("a, b"));
	assert_eq!(sheet.text(0, 1), Some("Tags: a, b"));

	Ok(())
}

#[test]
fn field_converters_take_precedence() -> FillResult<()> {
	let mut resolver = ValueResolver::new();
	resolver.declare_field("tags", FieldProperty::converter(join_list));
	let item = json!({ "tags": ["x", 1] });

	assert_eq!(resolver.resolve(&item, "tags")?, CellValue::text("x, 1"));

	Ok(())
}

#[test]
#[traced_test]
fn streaming_rows_fall_back_to_the_buffered_view() -> FillResult<()> {
	let mut sheet = MemorySheet::streaming(0, "Stream", RowStore::from_rows([["{.v}"]]));
	sheet.primary_mut().flush_through(1);
	let mut session = FillSession::new();

	session.fill(&mut sheet, json!(["a", "b", "c"]), &FillConfig::vertical())?;

	let buffered = sheet.buffered().map(RowStore::dump).unwrap_or_default();
	assert_eq!(buffered, "row 0: A=a\nrow 1: A=b");
	assert_eq!(sheet.primary().text(2, 0), Some("c"));
	assert_eq!(session.summary().rows_created, 2);
	assert!(logs_contain("row creation refused"));

	Ok(())
}

#[test]
fn buffered_first_locator_keeps_rows_in_the_buffered_view() -> FillResult<()> {
	let mut sheet = MemorySheet::streaming(0, "Stream", RowStore::from_rows([["{.v}"]]));
	let locator = RowLocator::new(vec![ViewKind::Buffered, ViewKind::Primary]);
	assert_eq!(locator.order(), [ViewKind::Buffered, ViewKind::Primary]);
	let mut session = FillSession::new().with_locator(locator);

	session.fill(&mut sheet, json!(["a", "b", "c"]), &FillConfig::vertical())?;

	let buffered = sheet.buffered().map(RowStore::dump).unwrap_or_default();
	assert_eq!(buffered, "row 0: A=a\nrow 1: A=b\nrow 2: A=c");
	assert_eq!(sheet.primary().dump(), "");
	assert_eq!(session.summary().rows_created, 2);

	Ok(())
}

#[test]
fn streaming_reservation_shifts_the_buffered_template() -> FillResult<()> {
	let template = RowStore::from_rows([vec!["{name}", "{.v}"], vec!["footer", ""]]);
	let mut sheet = MemorySheet::streaming(0, "Stream", template);
	let mut session = FillSession::new();
	let config = FillConfig::vertical().with_force_new_row(true);

	session.fill(&mut sheet, json!({ "name": "Acme" }), &config)?;
	session.fill(&mut sheet, FillWrapper::new("", [json!("x"), json!("y"), json!("z")]), &config)?;

	assert_eq!(sheet.primary().dump(), "");
	let buffered = sheet.buffered().map(RowStore::dump).unwrap_or_default();
	insta::assert_snapshot!(buffered, @r"
row 0: A=Acme B=x
row 1: B=y
row 2: B=z
row 3: A=footer
");

	Ok(())
}

#[test]
fn default_locator_prefers_the_primary_view() {
	assert_eq!(RowLocator::default().order(), [
		ViewKind::Primary,
		ViewKind::Buffered
	]);
}

#[test]
fn row_creation_fails_when_every_view_refuses() {
	let mut sheet = sheet_from_store(RowStore::new());
	sheet.primary_mut().flush_through(2);

	let result = RowLocator::default().create_row(&mut sheet, 1, false);

	assert_eq!(result, Err(SheetError::RowFlushed {
		row: 1,
		flushed_through: 2,
	}));
}

#[test]
fn forced_rows_go_to_the_template_view() -> SheetResult<()> {
	let mut sheet = MemorySheet::streaming(0, "Stream", RowStore::from_rows([["{.v}"]]));
	let locator = RowLocator::default();

	assert_eq!(locator.create_row(&mut sheet, 5, true)?, ViewKind::Buffered);
	assert_eq!(locator.find_row(&sheet, 5), Some(ViewKind::Buffered));
	assert_eq!(locator.create_row(&mut sheet, 6, false)?, ViewKind::Primary);

	Ok(())
}

#[test]
fn handlers_observe_rows_and_cells() -> FillResult<()> {
	let handler = RecordingHandler::default();
	let mut sheet = sheet_from_rows(&[&["{.v}"]]);
	let mut session = FillSession::new();
	session.register_handler(handler.clone());

	session.fill(&mut sheet, json!(["a", "b"]), &FillConfig::vertical())?;

	assert_eq!(handler.events(), vec![
		"after_cell_dispose cell=(0, 0) vars=v",
		"after_row_dispose row=0 rel=Some(0)",
		"before_row_create row=1 rel=Some(1)",
		"after_row_create row=1 rel=Some(1)",
		"before_cell_create cell=(1, 0) vars=v",
		"after_cell_create cell=(1, 0) vars=v",
		"after_cell_dispose cell=(1, 0) vars=v",
		"after_row_dispose row=1 rel=Some(1)",
	]);

	Ok(())
}

#[test]
fn handlers_can_restyle_written_cells() -> FillResult<()> {
	let mut sheet = sheet_from_rows(&[&["{name}"]]);
	let mut session = FillSession::new();
	session.register_handler(StampStyle(StyleId(99)));

	session.fill(&mut sheet, json!({ "name": "x" }), &FillConfig::default())?;

	assert_eq!(sheet.cell(0, 0).and_then(|cell| cell.style), Some(StyleId(99)));

	Ok(())
}

#[rstest]
#[case::vertical("vertical", Direction::Vertical)]
#[case::padded(" Horizontal ", Direction::Horizontal)]
fn parse_direction(#[case] input: &str, #[case] expected: Direction) -> FillResult<()> {
	assert_eq!(input.parse::<Direction>()?, expected);

	Ok(())
}

#[test]
fn unknown_direction_is_rejected() {
	let result = "diagonal".parse::<Direction>();
	assert!(matches!(result, Err(FillError::UnknownDirection(value)) if value == "diagonal"));
}

#[test]
fn load_config_file() -> FillResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::write(
		tmp.path().join("cellfill.toml"),
		r#"[fill]
direction = "horizontal"
force_new_row = true

[fields.amount]
target = "number"
"#,
	)?;

	let config = CellfillConfig::load(tmp.path())?
		.unwrap_or_else(|| panic!("config should be discovered"));
	let fill = config.fill_config()?;
	assert_eq!(fill.direction, Direction::Horizontal);
	assert!(fill.force_new_row);
	assert!(fill.auto_style);

	let resolver = ValueResolver::from_config(&config);
	assert_eq!(
		resolver.field("amount").and_then(|field| field.target),
		Some(TargetType::Number)
	);

	Ok(())
}

#[test]
fn config_discovery_prefers_the_first_candidate() -> FillResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/cellfill.toml"), "[fill]\nforce_new_row = true\n")?;
	std::fs::write(tmp.path().join(".cellfill.toml"), "[fill]\nauto_style = false\n")?;

	let path = CellfillConfig::resolve_path(tmp.path());
	assert_eq!(path, Some(tmp.path().join(".cellfill.toml")));

	let config = CellfillConfig::load(tmp.path())?
		.unwrap_or_else(|| panic!("config should be discovered"));
	assert!(!config.fill.auto_style);
	assert!(!config.fill.force_new_row);

	Ok(())
}

#[test]
fn missing_config_file_is_none() -> FillResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	assert!(CellfillConfig::load(tmp.path())?.is_none());

	Ok(())
}

#[test]
fn config_with_unknown_direction_fails_on_use() -> FillResult<()> {
	let config = CellfillConfig::from_toml_str("[fill]\ndirection = \"sideways\"\n")?;
	assert!(matches!(
		config.fill_config(),
		Err(FillError::UnknownDirection(value)) if value == "sideways"
	));

	Ok(())
}

#[test]
fn invalid_config_is_a_parse_error() {
	let result = CellfillConfig::from_toml_str("[fill\n");
	assert!(matches!(result, Err(FillError::ConfigParse(_))));
}

#[rstest]
#[case::json("data.json", r#"{ "name": "Acme", "count": 3 }"#)]
#[case::toml("data.toml", "name = \"Acme\"\ncount = 3\n")]
#[case::yaml("data.yaml", "name: Acme\ncount: 3\n")]
#[case::yml("data.yml", "name: Acme\ncount: 3\n")]
fn load_data_files(#[case] file_name: &str, #[case] content: &str) -> FillResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let path = tmp.path().join(file_name);
	std::fs::write(&path, content)?;

	assert_eq!(load_data_file(&path)?, json!({ "name": "Acme", "count": 3 }));

	Ok(())
}

#[test]
fn text_data_files_are_strings() -> FillResult<()> {
	assert_eq!(parse_data("hello", "txt", "data.txt")?, json!("hello"));

	Ok(())
}

#[test]
fn unsupported_data_format() {
	let result = parse_data("a,b", "csv", "data.csv");
	assert!(matches!(result, Err(FillError::UnsupportedDataFormat(format)) if format == "csv"));
}

#[test]
fn malformed_data_file_reports_the_path() {
	let result = parse_data("{ nope", "json", "broken.json");
	assert!(matches!(result, Err(FillError::DataFile { path, .. }) if path == "broken.json"));
}

#[rstest]
#[case(0, "A")]
#[case(25, "Z")]
#[case(26, "AA")]
#[case(701, "ZZ")]
#[case(702, "AAA")]
fn column_names(#[case] column: u32, #[case] expected: &str) {
	assert_eq!(column_name(column), expected);
}

#[test]
fn shifting_rows_validates_the_range() {
	let mut store = RowStore::from_rows([["a"], ["b"]]);
	assert_eq!(
		store.shift_rows(1, 0, 1),
		Err(SheetError::InvalidShift { start: 1, end: 0 })
	);

	store.flush_through(0);
	assert_eq!(
		store.shift_rows(0, 1, 1),
		Err(SheetError::RowFlushed {
			row: 0,
			flushed_through: 0,
		})
	);
	assert!(store.flushed_row(0).is_some());
	assert_eq!(store.last_row_index(), Some(1));
}
