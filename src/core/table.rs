//! Typed column definitions shared by every user table.

use comfy_table::{
    presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, Color, ContentArrangement, Table,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Right,
}

impl From<Align> for CellAlignment {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => CellAlignment::Left,
            Align::Right => CellAlignment::Right,
        }
    }
}

/// A column renders one cell from a row of type `R`.
pub struct Column<R> {
    pub header: &'static str,
    pub align: Align,
    pub render: fn(&R) -> String,
}

impl<R> Column<R> {
    pub const fn left(header: &'static str, render: fn(&R) -> String) -> Self {
        Self {
            header,
            align: Align::Left,
            render,
        }
    }

    pub const fn right(header: &'static str, render: fn(&R) -> String) -> Self {
        Self {
            header,
            align: Align::Right,
            render,
        }
    }
}

pub fn headers<R>(columns: &[Column<R>]) -> Vec<&'static str> {
    columns.iter().map(|c| c.header).collect()
}

pub fn alignments<R>(columns: &[Column<R>]) -> Vec<Align> {
    columns.iter().map(|c| c.align).collect()
}

pub fn render_rows<R>(columns: &[Column<R>], rows: &[R]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| columns.iter().map(|c| (c.render)(row)).collect())
        .collect()
}

/// Lay out rendered cells as a terminal table. Columns without an entry in
/// `aligns` are left-aligned.
pub fn build_table(
    headers: &[&str],
    aligns: &[Align],
    cells: &[Vec<String>],
    width: u16,
    use_color: bool,
) -> Table {
    let align = |i: usize| CellAlignment::from(aligns.get(i).copied().unwrap_or(Align::Left));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(width);
    if use_color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }

    table.set_header(headers.iter().enumerate().map(|(i, h)| {
        let cell = Cell::new(h).set_alignment(align(i));
        if use_color {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }));
    for row in cells {
        table.add_row(
            row.iter()
                .enumerate()
                .map(|(i, c)| Cell::new(c).set_alignment(align(i))),
        );
    }
    table
}
