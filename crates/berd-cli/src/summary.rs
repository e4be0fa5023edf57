//! Console summaries printed after each command.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::{ApplyResult, OutliersResult, ReviewResult};

pub fn print_outliers_summary(result: &OutliersResult) {
    println!("Output: {}", result.output.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Valid rows"),
        header_cell("Groups"),
        header_cell("Flagged rows"),
    ]);
    apply_table_style(&mut table);
    for index in 1..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for summary in &result.columns {
        table.add_row(vec![
            Cell::new(&summary.column)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.valid_rows),
            Cell::new(summary.groups),
            count_cell(summary.flagged_rows, Color::Yellow),
        ]);
    }
    table.add_row(vec![
        total_cell("outlier"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(result.outliers, Color::Yellow).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Rows: {}", result.rows);
}

pub fn print_review_summary(result: &ReviewResult) {
    let outcome = &result.outcome;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Review set"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Unchanged"), dim_cell(outcome.unchanged)]);
    table.add_row(vec![
        Cell::new("Amendments"),
        count_cell(outcome.amendments, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Additions"),
        count_cell(outcome.additions, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Split cases"),
        count_cell(outcome.split_cases, Color::Yellow),
    ]);
    println!("{table}");
    if outcome.written.is_empty() {
        println!("Nothing to review.");
    }
    for path in &outcome.written {
        println!("Review file: {}", path.display());
    }
    for path in &outcome.stale {
        println!("Stale review file (remove before applying): {}", path.display());
    }
    println!(
        "Set accept_changes to true on approved rows, then run `berd freeze apply` \
         with the same --run-id and --date."
    );
}

pub fn print_apply_summary(result: &ApplyResult) {
    let outcome = &result.outcome;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Applied"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Accepted amendments"),
        count_cell(outcome.amendments_accepted, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Accepted additions"),
        count_cell(outcome.additions_accepted, Color::Green),
    ]);
    table.add_row(vec![Cell::new("Baseline rows"), Cell::new(result.baseline_rows)]);
    table.add_row(vec![
        total_cell("Frozen rows"),
        Cell::new(outcome.data.height()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Output: {}", result.output.display());
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
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

fn total_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
