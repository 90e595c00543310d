//! Projection of remote entities into rows and rendering of command output.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// A single display-ready cell.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Field name to value mapping for one entity.
pub type Record = BTreeMap<&'static str, Value>;

/// Values of `fields` taken from `data`, in field order.
pub fn get_display_data_single(fields: &[&str], data: &Record, missing: &Value) -> Vec<Value> {
    fields
        .iter()
        .map(|field| data.get(*field).cloned().unwrap_or_else(|| missing.clone()))
        .collect()
}

/// Rows for every record, stably sorted by the `sort_by` columns.
///
/// Sort columns absent from `fields` are ignored.
pub fn get_display_data_multi(
    fields: &[&str],
    data: &[Record],
    sort_by: &[String],
) -> Vec<Vec<Value>> {
    let mut rows: Vec<Vec<Value>> = data
        .iter()
        .map(|record| get_display_data_single(fields, record, &Value::Null))
        .collect();

    let key_ids: Vec<usize> = sort_by
        .iter()
        .filter_map(|col| fields.iter().position(|f| *f == col.as_str()))
        .collect();

    if !key_ids.is_empty() {
        rows.sort_by(|a, b| {
            let ka = key_ids.iter().map(|&i| &a[i]);
            let kb = key_ids.iter().map(|&i| &b[i]);
            ka.cmp(kb)
        });
    }

    rows
}

const SIZE_NAMES: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Human readable size using binary units, e.g. `1056 -> "1.03 KB"`.
pub fn convert_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_owned();
    }

    let mut i = 0;
    while i + 1 < SIZE_NAMES.len() && size_bytes >= 1u64 << (10 * (i + 1)) {
        i += 1;
    }

    let scaled = size_bytes as f64 / (1u64 << (10 * i)) as f64;
    // Exact ties round to even, e.g. 1.125 -> 1.12.
    let rounded = (scaled * 100.0).round_ties_even() / 100.0;

    if rounded.fract() == 0.0 {
        format!("{rounded:.1} {}", SIZE_NAMES[i])
    } else {
        format!("{rounded} {}", SIZE_NAMES[i])
    }
}

/// Result of one command, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A single entity shown as field/value pairs.
    Show {
        columns: Vec<&'static str>,
        row: Vec<Value>,
    },
    /// A table with one row per entity.
    List {
        columns: Vec<&'static str>,
        rows: Vec<Vec<Value>>,
    },
    Message(String),
}

#[derive(Copy, Debug, Clone, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Json,
    Value,
}

impl Output {
    pub fn render(&self, format: Format, out: &mut impl Write) -> std::io::Result<()> {
        match (self, format) {
            (Output::Message(msg), _) => writeln!(out, "{msg}"),
            (Output::Show { columns, row }, Format::Table) => {
                let rows: Vec<Vec<Value>> = columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| vec![Value::from(*c), v.clone()])
                    .collect();
                write_table(out, &["Field", "Value"], &rows)
            }
            (Output::List { columns, rows }, Format::Table) => write_table(out, columns, rows),
            (Output::Show { columns, row }, Format::Json) => {
                let obj: BTreeMap<_, _> = columns.iter().zip(row).collect();
                serde_json::to_writer_pretty(&mut *out, &obj)?;
                writeln!(out)
            }
            (Output::List { columns, rows }, Format::Json) => {
                let objs: Vec<BTreeMap<_, _>> =
                    rows.iter().map(|r| columns.iter().zip(r).collect()).collect();
                serde_json::to_writer_pretty(&mut *out, &objs)?;
                writeln!(out)
            }
            (Output::Show { row, .. }, Format::Value) => {
                for v in row {
                    writeln!(out, "{v}")?;
                }
                Ok(())
            }
            (Output::List { rows, .. }, Format::Value) => {
                for r in rows {
                    let line: Vec<String> = r.iter().map(ToString::to_string).collect();
                    writeln!(out, "{}", line.join(" "))?;
                }
                Ok(())
            }
        }
    }
}

fn write_table(out: &mut impl Write, header: &[&str], rows: &[Vec<Value>]) -> std::io::Result<()> {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+";

    writeln!(out, "{border}")?;
    writeln!(out, "{}", table_line(&widths, header.iter()))?;
    writeln!(out, "{border}")?;
    for row in &cells {
        writeln!(out, "{}", table_line(&widths, row.iter()))?;
    }
    writeln!(out, "{border}")
}

fn table_line<S: AsRef<str>>(widths: &[usize], values: impl Iterator<Item = S>) -> String {
    widths
        .iter()
        .zip(values)
        .map(|(&w, v)| format!("| {:<w$} ", v.as_ref()))
        .collect::<String>()
        + "|"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&'static str, i64)]) -> Record {
        pairs.iter().map(|&(k, v)| (k, Value::Int(v))).collect()
    }

    fn ints(rows: &[&[i64]]) -> Vec<Vec<Value>> {
        rows.iter()
            .map(|r| r.iter().map(|&i| Value::Int(i)).collect())
            .collect()
    }

    #[test]
    fn single_record() {
        let data = record(&[("a", 1), ("b", 2), ("c", 3)]);
        let row = get_display_data_single(&["a", "b", "c"], &data, &Value::Null);
        assert_eq!(row, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn single_record_missing_field() {
        let data = record(&[("a", 1), ("b", 2), ("d", 3)]);
        let row = get_display_data_single(&["a", "b", "c"], &data, &Value::Null);
        assert_eq!(row, vec![Value::Int(1), Value::Int(2), Value::Null]);

        let row = get_display_data_single(&["a", "b", "c"], &data, &Value::from("-"));
        assert_eq!(row, vec![Value::Int(1), Value::Int(2), Value::from("-")]);
    }

    #[test]
    fn single_record_subset() {
        let data = record(&[("a", 1), ("b", 2), ("c", 3)]);
        let row = get_display_data_single(&["a", "b"], &data, &Value::from("-"));
        assert_eq!(row, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn multi_unsorted() {
        let data = vec![record(&[("a", 1), ("b", 2)]), record(&[("a", 3)])];
        let rows = get_display_data_multi(&["a", "b"], &data, &[]);
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Int(3), Value::Null]
            ]
        );
    }

    #[test]
    fn multi_sorted() {
        let data = vec![record(&[("a", 9), ("b", 7)]), record(&[("a", 3), ("b", 4)])];
        let rows = get_display_data_multi(&["a", "b"], &data, &["b".to_owned()]);
        assert_eq!(rows, ints(&[&[3, 4], &[9, 7]]));

        let data = vec![record(&[("a", 9), ("b", 7)]), record(&[("a", 13), ("b", 1)])];
        let rows = get_display_data_multi(&["a", "b"], &data, &["a".to_owned()]);
        assert_eq!(rows, ints(&[&[9, 7], &[13, 1]]));
    }

    #[test]
    fn multi_sort_by_several_columns_is_stable() {
        let data = vec![
            record(&[("a", 2), ("b", 1), ("c", 0)]),
            record(&[("a", 1), ("b", 5), ("c", 1)]),
            record(&[("a", 2), ("b", 0), ("c", 2)]),
            record(&[("a", 1), ("b", 5), ("c", 3)]),
        ];
        let rows = get_display_data_multi(
            &["a", "b", "c"],
            &data,
            &["a".to_owned(), "b".to_owned()],
        );
        assert_eq!(
            rows,
            ints(&[&[1, 5, 1], &[1, 5, 3], &[2, 0, 2], &[2, 1, 0]])
        );
    }

    #[test]
    fn multi_sort_by_unknown_column_keeps_order() {
        let data = vec![record(&[("a", 12), ("b", 17)]), record(&[("a", 11), ("b", 5)])];
        let rows = get_display_data_multi(&["a", "b"], &data, &["non-existing".to_owned()]);
        assert_eq!(rows, ints(&[&[12, 17], &[11, 5]]));
    }

    #[test]
    fn sizes() {
        let cases = [
            (0, "0 B"),
            (1, "1.0 B"),
            (1023, "1023.0 B"),
            (1024, "1.0 KB"),
            (1056, "1.03 KB"),
            (1152, "1.12 KB"),
            (1408, "1.38 KB"),
            (2688, "2.62 KB"),
            (20467, "19.99 KB"),
            (3405000, "3.25 MB"),
            (10203437400, "9.5 GB"),
            (5640003030040, "5.13 TB"),
            (4456703885093900, "3.96 PB"),
            (6788000399299490593, "5.89 EB"),
        ];
        for (input, expected) in cases {
            assert_eq!(convert_size(input), expected, "size {input}");
        }
    }

    #[test]
    fn render_list_table() {
        let output = Output::List {
            columns: vec!["name", "size"],
            rows: vec![
                vec![Value::from("a.txt"), Value::from("1.0 KB")],
                vec![Value::from("docs/"), Value::Null],
            ],
        };
        let mut buf = Vec::new();
        output.render(Format::Table, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            text,
            "+-------+--------+\n\
             | name  | size   |\n\
             +-------+--------+\n\
             | a.txt | 1.0 KB |\n\
             | docs/ |        |\n\
             +-------+--------+\n"
        );
    }

    #[test]
    fn render_show_json() {
        let output = Output::Show {
            columns: vec!["user", "country"],
            row: vec![Value::from("John Doe"), Value::Null],
        };
        let mut buf = Vec::new();
        output.render(Format::Json, &mut buf).expect("render");
        let parsed: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(
            parsed,
            serde_json::json!({"user": "John Doe", "country": null})
        );
    }

    #[test]
    fn render_list_values() {
        let output = Output::List {
            columns: vec!["name", "size"],
            rows: vec![vec![Value::from("a.txt"), Value::Int(3)]],
        };
        let mut buf = Vec::new();
        output.render(Format::Value, &mut buf).expect("render");
        assert_eq!(buf, b"a.txt 3\n");
    }
}
