//! Printed forms of values.
//!
//! The long form is what the runtime echoes for results: strings quoted
//! and escaped, instance names bracketed, floats always recognizable as
//! floats. The display form prints lexemes bare, the way `printout`
//! shows them.

use std::fmt::Write as _;

use clp_ir::{DataValue, ExternalAddress, Payload, TypeCode};

use crate::errors::unknown_logical_name;
use crate::Environment;

impl Environment {
    /// Long printed form of `value`.
    pub fn format_value(&self, value: &DataValue) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, true);
        out
    }

    /// Display form: lexemes without quotes or brackets.
    pub fn display_value(&self, value: &DataValue) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, false);
        out
    }

    /// Cells of a list in long form, space separated, without parentheses.
    pub fn implode(&self, value: &DataValue) -> String {
        let Some(cells) = self.list_cells(value) else {
            return self.format_value(value);
        };
        let mut out = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            self.write_value(&mut out, cell, true);
        }
        out
    }

    /// Write the long form of `value` to a logical channel.
    ///
    /// An unrecognized channel is a user error (`[ROUTER1]`).
    pub fn print_value(&mut self, logical: &str, value: &DataValue) -> bool {
        let text = self.format_value(value);
        self.print_router(logical, &text)
    }

    /// Write raw text to a logical channel.
    pub fn print_router(&mut self, logical: &str, text: &str) -> bool {
        if self.router.write(logical, text).is_ok() {
            return true;
        }
        self.report_error(&unknown_logical_name(logical));
        false
    }

    fn write_value(&self, out: &mut String, value: &DataValue, long: bool) {
        match (value.code, value.payload) {
            (_, Payload::Void) => {}
            (TypeCode::INTEGER, Payload::Integer(_)) => {
                if let Some(n) = self.integer_of(value) {
                    let _ = write!(out, "{n}");
                }
            }
            (TypeCode::FLOAT, Payload::Float(_)) => {
                if let Some(x) = self.float_of(value) {
                    out.push_str(&format_float(x));
                }
            }
            (TypeCode::STRING, Payload::Symbol(id)) => {
                let text = self.symbol_text(id);
                if long {
                    out.push('"');
                    for c in text.chars() {
                        if matches!(c, '"' | '\\') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push('"');
                } else {
                    out.push_str(text);
                }
            }
            (TypeCode::INSTANCE_NAME, Payload::Symbol(id)) => {
                let text = self.symbol_text(id);
                if long {
                    let _ = write!(out, "[{text}]");
                } else {
                    out.push_str(text);
                }
            }
            (_, Payload::Symbol(id)) => out.push_str(self.symbol_text(id)),
            (_, Payload::List(_)) => {
                out.push('(');
                if let Some(cells) = self.list_cells(value) {
                    for (i, cell) in cells.iter().enumerate() {
                        if i > 0 {
                            out.push(' ');
                        }
                        self.write_value(out, cell, long);
                    }
                }
                out.push(')');
            }
            (_, Payload::ExternalAddress(_)) => {
                if let Some(address) = self.external_address_of(value) {
                    self.write_external_address(out, address, long);
                }
            }
            (_, Payload::Bitmap(id)) => {
                let _ = write!(out, "<Bitmap-{}>", id.raw());
            }
            (code, payload) => match self.primitive(code).and_then(|p| p.print.clone()) {
                Some(print) => out.push_str(&print(self, value)),
                None => {
                    let raw = match payload {
                        Payload::Opaque(raw) => raw,
                        _ => 0,
                    };
                    let _ = write!(out, "<{}-{raw}>", code.describe());
                }
            },
        }
    }

    fn write_external_address(&self, out: &mut String, address: ExternalAddress, long: bool) {
        match self.ext_address_type(address.type_index) {
            Some(kind) => {
                let hook = if long { &kind.print_long } else { &kind.print_short };
                match hook {
                    Some(print) => out.push_str(&print(self, address)),
                    None => {
                        let _ = write!(out, "<Pointer-{}-{:#x}>", kind.name, address.address);
                    }
                }
            }
            None => {
                let _ = write!(out, "<Pointer-{:#x}>", address.address);
            }
        }
    }
}

/// Shortest round-tripping text that still reads back as a float.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-5..1e15).contains(&magnitude) {
        return format!("{x:e}");
    }
    let text = x.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
