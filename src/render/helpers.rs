//! Rust-backed helpers exposed to renderer expressions as the `fmt` table.
//!
//! ```lua
//! fmt.thousands(1234567.5)           --> "1,234,567.5"
//! fmt.yes_no(0)                      --> "NO"
//! fmt.date("2024-03-05", "%d-%b-%Y") --> "05-Mar-2024"
//! fmt.escape("<b>")                  --> "&lt;b&gt;"
//! ```

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use mlua::{Lua, Value as LuaValue};

/// Install the `fmt` helper table into the given Lua state.
pub fn register(lua: &Lua) -> mlua::Result<()> {
    let fmt = lua.create_table()?;

    fmt.set(
        "thousands",
        lua.create_function(|_, value: LuaValue| Ok(to_text(&value).map(|s| group_digits(&s))))?,
    )?;

    fmt.set(
        "yes_no",
        lua.create_function(|_, value: LuaValue| {
            Ok(if is_truthy(&value) { "YES" } else { "NO" })
        })?,
    )?;

    fmt.set(
        "date",
        lua.create_function(
            |_, (value, pattern, upper): (LuaValue, String, Option<bool>)| {
                let Some(text) = to_text(&value) else {
                    return Ok(None);
                };
                let formatted = format_date(&text, &pattern)
                    .map_err(mlua::Error::RuntimeError)?
                    .unwrap_or(text);
                Ok(Some(if upper.unwrap_or(false) {
                    formatted.to_uppercase()
                } else {
                    formatted
                }))
            },
        )?,
    )?;

    fmt.set(
        "escape",
        lua.create_function(|_, value: LuaValue| Ok(to_text(&value).map(|s| escape_html(&s))))?,
    )?;

    lua.globals().set("fmt", fmt)?;
    Ok(())
}

/// Text form of a scalar Lua value; `nil` has none.
fn to_text(value: &LuaValue) -> Option<String> {
    match value {
        LuaValue::Nil => None,
        LuaValue::Boolean(b) => Some(b.to_string()),
        LuaValue::Integer(i) => Some(i.to_string()),
        LuaValue::Number(n) => Some(number_text(*n)),
        LuaValue::String(s) => Some(s.to_string_lossy().to_string()),
        other => Some(other.type_name().to_string()),
    }
}

fn number_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// JavaScript-style truthiness.
fn is_truthy(value: &LuaValue) -> bool {
    match value {
        LuaValue::Nil => false,
        LuaValue::Boolean(b) => *b,
        LuaValue::Integer(i) => *i != 0,
        LuaValue::Number(n) => *n != 0.0 && !n.is_nan(),
        LuaValue::String(s) => !s.as_bytes().is_empty(),
        _ => true,
    }
}

/// Insert `,` separators into the leading integer digits of `text`.
///
/// Anything after the first non-digit (decimal part, units) is kept as is.
pub fn group_digits(text: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, tail) = rest.split_at(digits_end);
    if digits.len() <= 3 {
        return text.to_string();
    }

    let mut grouped = String::with_capacity(text.len() + digits.len() / 3);
    grouped.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push_str(tail);
    grouped
}

/// Reformat a date/time string with a strftime pattern.
///
/// Returns `Ok(None)` when the text is not a recognised date, and an error
/// when the pattern itself is invalid.
pub fn format_date(text: &str, pattern: &str) -> Result<Option<String>, String> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date pattern '{}'", pattern));
    }

    let Some(datetime) = parse_datetime(text.trim()) else {
        return Ok(None);
    };

    let mut out = String::new();
    write!(out, "{}", datetime.format_with_items(StrftimeItems::new(pattern)))
        .map_err(|_| format!("cannot format '{}' with '{}'", text, pattern))?;
    Ok(Some(out))
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
