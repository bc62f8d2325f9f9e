//! Search results: row storage, `with` post-processing and rendering.

use crate::collections::HashMap;
use crate::Error;
use crate::RuntimeErrorKind;
use crate::Value;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// The header of a [`SearchResult`]: partition, primary kind and the
/// projection plan (labels, formats, column data specs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHeader {
    pub partition: String,
    pub primary_kind: String,
    pub labels: Vec<String>,
    pub formats: Vec<String>,
    pub data: Vec<String>,
}

/// The materialized result of one query.
///
/// Rows own their values; sources are the parallel arrays recording where
/// each cell came from (`n:<kind>:<key>`, `e:<kind>:<key>` or `q:<query>`,
/// empty for nil cells).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    name: String,
    query: String,
    header: SearchHeader,
    rows: Vec<Vec<Value>>,
    sources: Vec<Vec<String>>,
}

impl SearchResult {
    pub(crate) fn new(
        name: String,
        query: String,
        header: SearchHeader,
        rows: Vec<Vec<Value>>,
        sources: Vec<Vec<String>>,
    ) -> Self {
        Self {
            name,
            query,
            header,
            rows,
            sources,
        }
    }

    /// Name of the query that produced this result.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The query text that produced this result.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn header(&self) -> &SearchHeader {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_source(&self, index: usize) -> &[String] {
        &self.sources[index]
    }

    pub fn row_sources(&self) -> &[Vec<String>] {
        &self.sources
    }

    /// RFC 4180 CSV rendering, labels as the first record, nil cells as
    /// `<not set>`.
    pub fn csv(&self) -> Result<String, Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.header.labels)
            .map_err(|err| self.result_err(err))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(Value::render))
                .map_err(|err| self.result_err(err))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| self.result_err(err))?;
        String::from_utf8(bytes).map_err(|err| self.result_err(err))
    }

    fn result_err(&self, err: impl fmt::Display) -> Error {
        Error::Runtime {
            name: self.name.clone(),
            kind: RuntimeErrorKind::ResultError,
            detail: err.to_string(),
            line: 0,
            pos: 0,
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Labels:{}", self.header.labels.join(", "))?;
        writeln!(f, "Format:{}", self.header.formats.join(", "))?;
        writeln!(f, "Data:{}", self.header.data.join(", "))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(Value::render).collect();
            writeln!(f, "{}", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Post-processing flags resolved from the `with` clause. Applied in a
/// fixed order: null filters, then uniqueness, then ordering.
#[derive(Debug, Default)]
pub(crate) struct PostProcess {
    /// `(ascending, column)` sort keys, in declaration order. Each is a
    /// stable single-column sort, so later keys end up outermost.
    pub order: Vec<(bool, usize)>,
    /// `(column, keep_non_null)` filters.
    pub null_filters: Vec<(usize, bool)>,
    /// `(column, with_count)` uniqueness passes, in declaration order.
    pub unique: Vec<(usize, bool)>,
}

impl PostProcess {
    pub(crate) fn apply(&self, rows: &mut Vec<Vec<Value>>, sources: &mut Vec<Vec<String>>) {
        let mut pairs: Vec<(Vec<Value>, Vec<String>)> =
            rows.drain(..).zip(sources.drain(..)).collect();

        for &(col, keep_non_null) in &self.null_filters {
            pairs.retain(|(row, _)| row[col].is_null() != keep_non_null);
        }

        for &(col, with_count) in &self.unique {
            let mut counts: HashMap<String, usize> = HashMap::default();
            let mut keep = vec![false; pairs.len()];
            // Reverse walk: the last occurrence of each value survives and
            // the count map ends up holding the full cardinality.
            for i in (0..pairs.len()).rev() {
                let key = pairs[i].0[col].to_string();
                let count = counts.entry(key).or_insert(0);
                *count += 1;
                keep[i] = *count == 1;
            }
            let mut flags = keep.iter();
            pairs.retain(|_| *flags.next().expect("one flag per pair"));
            if with_count {
                for (row, _) in pairs.iter_mut() {
                    let display = row[col].to_string();
                    let count = counts.get(&display).copied().unwrap_or(1);
                    row[col] = Value::Str(format!("{display} ({count})"));
                }
            }
        }

        for &(ascending, col) in &self.order {
            pairs.sort_by(|(a, _), (b, _)| {
                let ord = compare_cells(&a[col], &b[col]);
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let (new_rows, new_sources) = pairs.into_iter().unzip();
        *rows = new_rows;
        *sources = new_sources;
    }
}

/// Sort comparison: numeric when both cells coerce to numbers, canonical
/// string form otherwise.
fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a.to_number(), b.to_number()) {
        (Some(x), Some(y)) => OrderedFloat(x).cmp(&OrderedFloat(y)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(cells: &[&str]) -> (Vec<Vec<Value>>, Vec<Vec<String>>) {
        let rows: Vec<Vec<Value>> = cells
            .iter()
            .map(|c| vec![Value::from(*c)])
            .collect();
        let sources = vec![vec![String::new()]; rows.len()];
        (rows, sources)
    }

    #[test]
    fn unique_keeps_declaration_order_and_counts() {
        let (mut rows, mut sources) =
            pairs(&["Mike", "Mike", "Mike", "Mike", "Hans", "John", "John", "John", "John"]);
        let post = PostProcess {
            unique: vec![(0, true)],
            ..PostProcess::default()
        };
        post.apply(&mut rows, &mut sources);
        let cells: Vec<String> = rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(cells, ["Mike (4)", "Hans (1)", "John (4)"]);
    }

    #[test]
    fn unique_without_count_drops_repeats() {
        let (mut rows, mut sources) = pairs(&["a", "b", "a", "c", "b"]);
        let post = PostProcess {
            unique: vec![(0, false)],
            ..PostProcess::default()
        };
        post.apply(&mut rows, &mut sources);
        let cells: Vec<String> = rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(cells, ["a", "c", "b"]);
    }

    #[test]
    fn sorts_are_stable_and_numeric_aware() {
        let mut rows = vec![
            vec![Value::from("10"), Value::from("b")],
            vec![Value::from("9"), Value::from("a")],
            vec![Value::from("10"), Value::from("a")],
        ];
        let mut sources = vec![vec![String::new(); 2]; 3];
        let post = PostProcess {
            order: vec![(true, 0)],
            ..PostProcess::default()
        };
        post.apply(&mut rows, &mut sources);
        // numeric: 9 before 10; stable: the two 10s keep their order
        assert_eq!(rows[0][0], Value::from("9"));
        assert_eq!(rows[1][1], Value::from("b"));
        assert_eq!(rows[2][1], Value::from("a"));
    }

    #[test]
    fn null_filters_run_before_uniqueness() {
        let mut rows = vec![
            vec![Value::Null],
            vec![Value::from("x")],
            vec![Value::from("x")],
        ];
        let mut sources = vec![vec![String::new()]; 3];
        let post = PostProcess {
            null_filters: vec![(0, true)],
            unique: vec![(0, true)],
            ..PostProcess::default()
        };
        post.apply(&mut rows, &mut sources);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Value::from("x (2)"));
    }
}
