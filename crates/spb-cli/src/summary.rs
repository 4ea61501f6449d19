use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use spb_codec::RoundTripReport;
use spb_model::Definition;
use spb_model::guid::format_braced;

use crate::commands::Outcome;

pub fn print_outcome(outcome: &Outcome) {
    println!("{}", outcome_table(outcome));
}

pub fn outcome_table(outcome: &Outcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Input"), Cell::new(outcome.input.display())]);
    for output in &outcome.outputs {
        table.add_row(vec![Cell::new("Output"), Cell::new(output.display())]);
    }
    let summary = &outcome.summary;
    table.add_row(vec![Cell::new("Bytes"), Cell::new(summary.bytes)]);
    table.add_row(vec![Cell::new("Elements"), Cell::new(summary.elements)]);
    table.add_row(vec![Cell::new("Tags"), Cell::new(summary.tags)]);
    table.add_row(vec![Cell::new("Sets"), Cell::new(summary.sets)]);
    table
}

pub fn print_symbols(definitions: &[Definition]) {
    println!("{}", symbols_table(definitions));
    println!("{} symbol(s)", definitions.len());
}

pub fn symbols_table(definitions: &[Definition]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Name"),
        header_cell("Context"),
        header_cell("Type"),
        header_cell("GUID"),
    ]);
    apply_table_style(&mut table);
    for def in definitions {
        let context = def.context().map(|c| c.name.clone()).unwrap_or_default();
        let type_name = match def {
            Definition::Set(_) => String::new(),
            Definition::Property(prop) if prop.is_attribute => {
                format!("{} (attribute)", prop.type_def)
            }
            Definition::Property(prop) => prop.type_def.to_string(),
        };
        table.add_row(vec![
            Cell::new(def.kind()),
            Cell::new(def.name()).add_attribute(Attribute::Bold),
            Cell::new(context),
            Cell::new(type_name),
            Cell::new(format_braced(&def.id())).fg(Color::DarkGrey),
        ]);
    }
    table
}

pub fn roundtrip_message(report: &RoundTripReport) -> String {
    match report.first_difference {
        None => format!("bit-exact ({} bytes)", report.original_len),
        Some(offset) => format!(
            "differs at offset {offset} (0x{offset:X}): original {} bytes, re-encoded {} bytes",
            report.original_len, report.encoded_len
        ),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
