//! Synthesized Values
//!
//! The value domain of the simulated environment: concrete literals,
//! containers of synthesized values, and placeholders standing in for
//! anything that could not be resolved without running the program.

use std::fmt::{self, Write as _};

/// Longest text a fold, a rendered call or a trace step carries before it
/// is clipped with a `...` marker.
pub const MAX_RENDER_LEN: usize = 10_000;

/// A value held in the simulated variable environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Insertion-ordered mapping.
    Dict(Vec<(Value, Value)>),
    Placeholder(Placeholder),
}

/// Why a value could not be resolved concretely.
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder {
    /// A name read before any assignment to it.
    Unresolved(String),
    /// A list subscript outside the list.
    IndexError,
    /// A subscript on anything but a list indexed by an integer.
    ComplexSubscript,
    /// An expression shape the evaluator does not fold.
    ComplexExpression,
    /// A call rendered as text instead of being executed.
    Call(String),
    /// A binary operation that could not be computed, as `(left op right)`.
    Folded(String),
    /// Evaluation failed outright.
    Error(String),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Unresolved(name) => write!(f, "<unresolved {}>", name),
            Placeholder::IndexError => f.write_str("<index_error>"),
            Placeholder::ComplexSubscript => f.write_str("<complex_subscript>"),
            Placeholder::ComplexExpression => f.write_str("<complex_expression>"),
            Placeholder::Call(text) | Placeholder::Folded(text) => f.write_str(text),
            Placeholder::Error(message) => write!(f, "<error: {}>", message),
        }
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Value::Placeholder(_))
    }

    /// Truthiness used by the condition-loop replay and reported for
    /// conditionals:
    ///
    /// - `None` is false, a bool is itself;
    /// - numbers are false only when zero;
    /// - strings, lists and mappings are false only when empty;
    /// - placeholders are always true, since their rendering is never empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::Placeholder(_) => true,
        }
    }

    /// Host-language type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) | Value::Placeholder(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    /// Quoted rendering, used for container elements and quoted input values.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        let _ = self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut impl fmt::Write) -> fmt::Result {
        match self {
            Value::Str(s) => write_quoted(out, s),
            Value::Placeholder(p) => write_quoted(out, &p.to_string()),
            other => write!(out, "{}", other),
        }
    }

    /// Plain rendering cut after `limit` bytes, with `...` appended when
    /// anything was dropped. Stops walking the value once the limit is hit.
    pub fn render_bounded(&self, limit: usize) -> String {
        let mut writer = Bounded {
            out: String::new(),
            limit,
            clipped: false,
        };
        if write!(writer, "{}", self).is_err() && writer.clipped {
            writer.out.push_str("...");
        }
        writer.out
    }

    /// Size charged against the folding limits: string length, plus one per
    /// container entry and the weight of every entry.
    pub fn weight(&self) -> usize {
        match self {
            Value::Str(s) => s.len(),
            Value::List(items) => items
                .iter()
                .fold(items.len(), |acc, item| acc.saturating_add(item.weight())),
            Value::Dict(entries) => entries.iter().fold(entries.len(), |acc, (k, v)| {
                acc.saturating_add(k.weight()).saturating_add(v.weight())
            }),
            Value::Placeholder(
                Placeholder::Unresolved(text)
                | Placeholder::Call(text)
                | Placeholder::Folded(text)
                | Placeholder::Error(text),
            ) => text.len(),
            _ => 1,
        }
    }

    /// Container nesting: 0 for scalars, 1 for a flat list or mapping.
    pub fn depth(&self) -> usize {
        match self {
            Value::List(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Value::Dict(entries) => 1 + entries.iter().map(|(k, v)| k.depth().max(v.depth())).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Mapping-key equality: numbers compare across int, float and bool,
    /// placeholders compare as the text they render to.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Placeholder(p), Value::Str(s)) | (Value::Str(s), Value::Placeholder(p)) => return p.to_string() == *s,
            (Value::Placeholder(a), Value::Placeholder(b)) => return a.to_string() == b.to_string(),
            _ => {}
        }
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

/// Plain rendering: strings and placeholders unquoted, container elements
/// quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::Placeholder(p) => write!(f, "{}", p),
            Value::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_repr(f)?;
                }
                f.write_char(']')
            }
            Value::Dict(entries) => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.write_repr(f)?;
                    f.write_str(": ")?;
                    value.write_repr(f)?;
                }
                f.write_char('}')
            }
        }
    }
}

impl From<Placeholder> for Value {
    fn from(p: Placeholder) -> Self {
        Value::Placeholder(p)
    }
}

/// Shortest round-trip float text; integral values keep a trailing `.0`,
/// very large or very small magnitudes switch to exponent form.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{:e}", x);
        if let Some((mantissa, exponent)) = text.split_once('e') {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exp.abs());
        }
        return text;
    }
    let text = format!("{}", x);
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

fn write_quoted(out: &mut impl fmt::Write, s: &str) -> fmt::Result {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    out.write_char(delimiter)?;
    for c in s.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            '\r' => out.write_str("\\r")?,
            c if c == delimiter => {
                out.write_char('\\')?;
                out.write_char(c)?;
            }
            c => out.write_char(c)?,
        }
    }
    out.write_char(delimiter)
}

/// Cut `text` to at most `limit` bytes on a char boundary, marking the cut
/// with `...`.
pub fn clip(text: &mut String, limit: usize) {
    if text.len() > limit {
        let cut = floor_boundary(text, limit);
        text.truncate(cut);
        text.push_str("...");
    }
}

fn floor_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Writer that keeps at most `limit` bytes and fails once it overflows.
struct Bounded {
    out: String,
    limit: usize,
    clipped: bool,
}

impl fmt::Write for Bounded {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.limit.saturating_sub(self.out.len());
        if s.len() <= room {
            self.out.push_str(s);
            return Ok(());
        }
        self.out.push_str(&s[..floor_boundary(s, room)]);
        self.clipped = true;
        Err(fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(7.0).to_string(), "7.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::str("hi").to_string(), "hi");
    }

    #[test]
    fn test_float_exponent_form() {
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_container_rendering_quotes_elements() {
        let list = Value::List(vec![Value::Int(1), Value::str("a"), Value::Placeholder(Placeholder::IndexError)]);
        assert_eq!(list.to_string(), "[1, 'a', '<index_error>']");

        let dict = Value::Dict(vec![(Value::str("k"), Value::Float(1.5))]);
        assert_eq!(dict.to_string(), "{'k': 1.5}");
        assert_eq!(Value::Dict(vec![]).to_string(), "{}");
    }

    #[test]
    fn test_repr_picks_delimiter() {
        assert_eq!(Value::str("it's").repr(), "\"it's\"");
        assert_eq!(Value::str("a\nb").repr(), "'a\\nb'");
        assert_eq!(Value::Int(5).repr(), "5");
    }

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(Placeholder::Unresolved("z".into()).to_string(), "<unresolved z>");
        assert_eq!(Placeholder::ComplexSubscript.to_string(), "<complex_subscript>");
        assert_eq!(Placeholder::Error("boom".into()).to_string(), "<error: boom>");
        assert_eq!(Placeholder::Call("len(x)".into()).to_string(), "len(x)");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("0").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::List(vec![Value::None]).is_truthy());
        assert!(!Value::Dict(vec![]).is_truthy());
        assert!(Value::Placeholder(Placeholder::ComplexExpression).is_truthy());
    }

    #[test]
    fn test_key_eq_across_numbers() {
        assert!(Value::Int(1).key_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).key_eq(&Value::Int(1)));
        assert!(!Value::str("1").key_eq(&Value::Int(1)));
    }

    #[test]
    fn test_key_eq_placeholder_matches_its_text() {
        let unresolved = Value::Placeholder(Placeholder::Unresolved("a".into()));
        assert!(unresolved.key_eq(&Value::str("<unresolved a>")));
        assert!(Value::str("<unresolved a>").key_eq(&unresolved));
        assert!(!unresolved.key_eq(&Value::str("a")));
        let call = Value::Placeholder(Placeholder::Call("f(1)".into()));
        assert!(call.key_eq(&Value::Placeholder(Placeholder::Folded("f(1)".into()))));
    }

    #[test]
    fn test_weight_counts_nested_entries() {
        assert_eq!(Value::str("abcd").weight(), 4);
        assert_eq!(Value::Int(9).weight(), 1);
        let inner = Value::List(vec![Value::Int(0); 3]);
        assert_eq!(inner.weight(), 6);
        let outer = Value::List(vec![inner.clone(), inner]);
        assert_eq!(outer.weight(), 14);
        assert_eq!(outer.depth(), 2);
        assert_eq!(Value::Dict(vec![(Value::str("k"), Value::str("vv"))]).weight(), 4);
    }

    #[test]
    fn test_render_bounded_clips_long_values() {
        let list = Value::List(vec![Value::str("abc"); 1000]);
        let text = list.render_bounded(20);
        assert_eq!(text, "['abc', 'abc', 'abc'...");
        assert_eq!(Value::Int(12).render_bounded(20), "12");
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        let mut text = "héllo".to_string();
        clip(&mut text, 2);
        assert_eq!(text, "h...");
        let mut short = "ok".to_string();
        clip(&mut short, 10);
        assert_eq!(short, "ok");
    }
}
