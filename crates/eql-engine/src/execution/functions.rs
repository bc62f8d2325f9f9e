//! Builtin function support: `count` traversals and `parseDate` layouts.
//!
//! Date layouts use the Go reference time (`2006-01-02T15:04:05Z07:00`),
//! translated into `chrono` format specifiers before parsing. Without a
//! layout, input must be RFC 3339.

use crate::execution::condition::eval;
use crate::execution::condition::CondExpr;
use crate::execution::condition::EvalEnv;
use crate::graph::NodeData;
use crate::Error;

/// Traverse one hop from `node` along `spec` and count the reached pairs,
/// filtered by the optional condition. Attribute data is only requested
/// when a condition needs it.
pub(crate) fn count_traversal(
    env: &EvalEnv<'_>,
    node: &NodeData,
    spec: &str,
    cond: Option<&CondExpr>,
) -> Result<i64, Error> {
    let (nodes, edges) =
        env.graph
            .traverse_multi(env.part, node.key(), node.kind(), spec, cond.is_some())?;

    let Some(cond) = cond else {
        return Ok(nodes.len() as i64);
    };

    let mut count = 0;
    for (reached, edge) in nodes.iter().zip(&edges) {
        if eval(cond, env, Some(reached), Some(edge))?.to_bool() {
            count += 1;
        }
    }
    Ok(count)
}

/// Parse a date string into Unix seconds. `layout` is a Go reference
/// layout; absent, the input must be RFC 3339. The error is the reason
/// string only, the caller supplies context.
pub(crate) fn parse_date(input: &str, layout: Option<&str>) -> Result<i64, String> {
    let Some(layout) = layout else {
        return chrono::DateTime::parse_from_rfc3339(input)
            .map(|dt| dt.timestamp())
            .map_err(|err| err.to_string());
    };

    let format = reference_layout_to_format(layout);
    if format.contains("%z") || format.contains("%:z") {
        return chrono::DateTime::parse_from_str(input, &format)
            .map(|dt| dt.timestamp())
            .map_err(|err| err.to_string());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(input, &format) {
        return Ok(datetime.and_utc().timestamp());
    }
    chrono::NaiveDate::parse_from_str(input, &format)
        .map(|date| {
            date.and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time")
                .and_utc()
                .timestamp()
        })
        .map_err(|err| err.to_string())
}

/// Translate a Go reference layout into a `chrono` format string. Longest
/// reference tokens are matched first; unknown characters pass through
/// (with `%` escaped).
fn reference_layout_to_format(layout: &str) -> String {
    const TOKENS: &[(&str, &str)] = &[
        ("2006", "%Y"),
        ("January", "%B"),
        ("Monday", "%A"),
        ("Z07:00", "%:z"),
        ("-07:00", "%:z"),
        ("-0700", "%z"),
        ("Jan", "%b"),
        ("Mon", "%a"),
        ("15", "%H"),
        ("01", "%m"),
        ("02", "%d"),
        ("03", "%I"),
        ("04", "%M"),
        ("05", "%S"),
        ("06", "%y"),
        ("PM", "%p"),
        ("pm", "%P"),
    ];

    let mut format = String::with_capacity(layout.len());
    let mut rest = layout;
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                format.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let c = rest.chars().next().expect("rest is non-empty");
        if c == '%' {
            format.push_str("%%");
        } else {
            format.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    format
}
