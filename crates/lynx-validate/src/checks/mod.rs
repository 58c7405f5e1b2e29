pub(crate) mod constraints;
pub(crate) mod types;

use polars::prelude::{AnyValue, Column};

/// Non-null cells of a column with their row positions.
pub(crate) fn present(column: &Column) -> impl Iterator<Item = (usize, AnyValue<'_>)> + '_ {
    (0..column.len()).filter_map(move |idx| match column.get(idx) {
        Ok(AnyValue::Null) | Err(_) => None,
        Ok(value) => Some((idx, value)),
    })
}

/// Render values as a bracketed list, e.g. `['a', 'b']` or `[1, 2]`.
pub(crate) fn format_list(values: &[String], quoted: bool) -> String {
    let items: Vec<String> = if quoted {
        values.iter().map(|value| format!("'{value}'")).collect()
    } else {
        values.to_vec()
    };
    format!("[{}]", items.join(", "))
}
