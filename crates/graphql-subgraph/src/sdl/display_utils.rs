use std::fmt::{self, Write};

use crate::registry::{Deprecation, MetaInputValue};

pub(crate) const INDENT: &str = "  ";

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub(crate) fn write_quoted(sdl: &mut impl Write, s: &str) -> fmt::Result {
    sdl.write_char('"')?;
    for c in s.chars() {
        match c {
            '\r' => sdl.write_str("\\r"),
            '\n' => sdl.write_str("\\n"),
            '\t' => sdl.write_str("\\t"),
            '\\' => sdl.write_str("\\\\"),
            '"' => sdl.write_str("\\\""),
            c if c.is_control() => write!(sdl, "\\u{:04x}", c as u32),
            c => sdl.write_char(c),
        }?
    }
    sdl.write_char('"')
}

pub(crate) fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    // Writing to a String never fails
    write_quoted(&mut out, s).ok();
    out
}

/// A description block, followed by a newline.
///
/// Descriptions of items inside a block get a blank line before them, unless they come first.
pub(crate) fn description(description: &str, indentation: &str, first_in_block: bool) -> String {
    let lines = description.lines().map(escape_block_quote).collect::<Vec<_>>();
    let mut out = String::new();

    if !indentation.is_empty() && !first_in_block {
        out.push('\n');
    }

    match lines.as_slice() {
        [line] if line.chars().count() < 70 && !line.ends_with('"') => {
            out.push_str(&format!("{indentation}\"\"\"{line}\"\"\"\n"));
        }
        lines => {
            out.push_str(&format!("{indentation}\"\"\"\n"));
            for line in lines {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("{indentation}{line}\n"));
                }
            }
            out.push_str(&format!("{indentation}\"\"\"\n"));
        }
    }

    out
}

/// A description written as `#` comments, followed by a newline
pub(crate) fn comment_description(description: &str, indentation: &str, first_in_block: bool) -> String {
    let mut out = String::new();

    if !indentation.is_empty() && !first_in_block {
        out.push('\n');
    }

    for line in description.lines() {
        if line.is_empty() {
            out.push_str(&format!("{indentation}#\n"));
        } else {
            out.push_str(&format!("{indentation}# {line}\n"));
        }
    }

    out
}

fn escape_block_quote(line: &str) -> String {
    line.replace(r#"""""#, r#"\""""#)
}

/// ` {` followed by one line per entry and `}`, or nothing at all without entries
pub(crate) fn block(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    format!(" {{\n{}\n}}", lines.join("\n"))
}

pub(crate) fn implements(interfaces: &[String]) -> String {
    if interfaces.is_empty() {
        return String::new();
    }
    format!(" implements {}", interfaces.join(" & "))
}

pub(crate) fn deprecated(deprecation: &Deprecation) -> String {
    match deprecation {
        Deprecation::NoDeprecated => String::new(),
        Deprecation::Deprecated { reason } => match reason.as_deref() {
            None | Some("" | DEFAULT_DEPRECATION_REASON) => " @deprecated".to_string(),
            Some(reason) => format!(" @deprecated(reason: {})", quoted(reason)),
        },
    }
}

pub(crate) fn input_value(input: &MetaInputValue) -> String {
    match &input.default_value {
        Some(default_value) => format!("{}: {} = {default_value}", input.name, input.ty),
        None => format!("{}: {}", input.name, input.ty),
    }
}
