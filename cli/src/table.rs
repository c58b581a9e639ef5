// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, marker::PhantomData};

use colored::{Color, Colorize};
use unicode_width::UnicodeWidthStr;

pub struct Table<'a, T, C: Column<T>> {
    columns: &'a [C],
    data: &'a [T],
    separator: &'a str,
    padding: bool,
}

impl<'a, T, C: Column<T>> Table<'a, T, C> {
    pub const fn new(columns: &'a [C], data: &'a [T]) -> Self {
        Self {
            columns,
            data,
            separator: " ",
            padding: true,
        }
    }

    fn compute_columns(&self, table: &[Vec<String>]) -> Vec<ColumnStylizer<'_, T, C>> {
        let max_lengths = self.padding.then(|| get_column_max_width(table));

        let mut columns = Vec::with_capacity(self.columns.len());
        for (i, col) in self.columns.iter().enumerate() {
            let padding_direction = col.padding_direction();
            let padding = match &max_lengths {
                // last column does not need padding if it's left-aligned
                Some(_) if i == self.columns.len() - 1 && padding_direction == PaddingDirection::Left => {
                    None
                }
                Some(m) => Some((m.get(i).copied().unwrap_or(0), padding_direction)),
                None => None,
            };

            columns.push(ColumnStylizer {
                config: col,
                padding,
                _marker: PhantomData,
            });
        }
        columns
    }
}

impl<T, C: Column<T>> fmt::Display for Table<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table: Vec<Vec<String>> = self
            .data
            .iter()
            .map(|row| self.columns.iter().map(|col| col.format(row)).collect())
            .collect();

        let columns = self.compute_columns(&table);
        for (i, (cells, row)) in table.into_iter().zip(self.data).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for (j, (col, cell)) in columns.iter().zip(cells).enumerate() {
                if j > 0 {
                    write!(f, "{}", self.separator)?;
                }
                write!(f, "{}", col.stylize_cell(row, cell))?;
            }
        }
        Ok(())
    }
}

pub trait Column<T> {
    fn format(&self, data: &T) -> String;

    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }

    fn get_color(&self, _data: &T) -> Option<Color> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingDirection {
    Left,
    Right,
}

struct ColumnStylizer<'a, T, C: Column<T>> {
    config: &'a C,
    /// padding width and direction
    padding: Option<(usize, PaddingDirection)>,
    _marker: PhantomData<T>,
}

impl<T, C: Column<T>> ColumnStylizer<'_, T, C> {
    fn stylize_cell(&self, data: &T, cell: String) -> String {
        let cell = match self.padding {
            Some((width, direction)) => pad(&cell, width, direction),
            None => cell,
        };

        match self.config.get_color(data) {
            Some(color) => cell.color(color).to_string(),
            None => cell,
        }
    }
}

fn pad(cell: &str, width: usize, direction: PaddingDirection) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    match direction {
        PaddingDirection::Left => format!("{cell}{fill}"),
        PaddingDirection::Right => format!("{fill}{cell}"),
    }
}

fn get_column_max_width(table: &[Vec<String>]) -> Vec<usize> {
    let mut max_width = vec![0; table.first().map_or(0, Vec::len)];
    for row in table {
        for (i, cell) in row.iter().enumerate() {
            let width = cell.width();
            if let Some(max) = max_width.get_mut(i)
                && width > *max
            {
                *max = width;
            }
        }
    }
    max_width
}
