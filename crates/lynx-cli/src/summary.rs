use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use lynx_cli::types::{RunOutcome, ValidateOutcome};
use lynx_model::PipelineStatus;
use lynx_validate::ErrorCategory;

pub fn print_run_summary(outcome: &RunOutcome) {
    let state = &outcome.state;
    println!("Pipeline: {}", outcome.name);
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        label_cell("Mode"),
        Cell::new(if outcome.dry_run { "dry run" } else { "load" }),
    ]);
    table.add_row(vec![label_cell("Status"), status_cell(state.status)]);
    table.add_row(vec![
        label_cell("Records"),
        Cell::new(state.records_processed).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        label_cell("Started"),
        optional_cell(state.start_time.map(|time| time.to_rfc3339())),
    ]);
    table.add_row(vec![
        label_cell("Finished"),
        optional_cell(state.end_time.map(|time| time.to_rfc3339())),
    ]);
    table.add_row(vec![
        label_cell("Duration"),
        optional_cell(
            state
                .duration()
                .map(|duration| format!("{:.3}s", duration.num_milliseconds() as f64 / 1000.0)),
        ),
    ]);
    println!("{table}");
    if !state.errors.is_empty() {
        eprintln!("Errors:");
        for (key, message) in &state.errors {
            eprintln!("- {key}: {message}");
        }
    }
}

pub fn print_validation_summary(outcome: &ValidateOutcome) {
    println!(
        "Metatype: {} ({} rows in {} batches)",
        outcome.metatype, outcome.rows, outcome.batches
    );
    if outcome.errors.is_empty() {
        println!("No validation errors.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Message")]);
    apply_issue_table_style(&mut table);
    for (category, message) in outcome.errors.iter() {
        table.add_row(vec![category_cell(category), Cell::new(message)]);
    }
    println!("{table}");
    println!("{} errors", outcome.errors.len());
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(13)),
        ColumnConstraint::UpperBoundary(Width::Percentage(85)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: PipelineStatus) -> Cell {
    let color = match status {
        PipelineStatus::Completed => Color::Green,
        PipelineStatus::Failed => Color::Red,
        PipelineStatus::Running | PipelineStatus::Paused => Color::Yellow,
        PipelineStatus::Initialized => Color::DarkGrey,
    };
    Cell::new(status.as_str())
        .fg(color)
        .add_attribute(Attribute::Bold)
}

fn category_cell(category: ErrorCategory) -> Cell {
    let color = match category {
        ErrorCategory::Missing | ErrorCategory::TypeMismatch => Color::Red,
        ErrorCategory::Constraint => Color::Yellow,
        ErrorCategory::Unexpected => Color::DarkGrey,
    };
    Cell::new(category.as_str()).fg(color)
}

fn optional_cell(value: Option<String>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn label_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Blue)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
