//! The intermediate statement - a typed segment stream.
//!
//! The builder renders into `Statement` rather than into a string: source
//! models, quoted identifiers and bind markers stay distinct segment kinds
//! until execution, when each is serialized for the chosen dialect. The
//! text form (`[identifier]` brackets, `:name:` markers) is still available
//! through `Display` and is the stable rendering contract.
//!
//! User-supplied fragments (conditions, raw column strings) are folded in
//! through a small scanner that lifts embedded `[...]` and `:name:` spans
//! into their typed segments while leaving single-quoted string literals
//! untouched, so markers inside literals can never collide.

// =============================================================================
// Segments
// =============================================================================

/// One piece of an intermediate statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal SQL text: keywords, operators, user expressions.
    Sql(String),
    /// A source model reference; resolved through the model registry.
    Source(String),
    /// A plain identifier; rendered with dialect quoting.
    Ident(String),
    /// A bind marker; rendered in the driver's native syntax.
    Bind(String),
}

/// A rendered intermediate statement.
///
/// Immutable once produced by the builder; `Display` yields the bracket/colon
/// text form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    segments: Vec<Segment>,
}

impl Statement {
    pub fn new() -> Self {
        Statement::default()
    }

    /// Append literal SQL text.
    pub fn sql(&mut self, text: impl Into<String>) -> &mut Self {
        self.segments.push(Segment::Sql(text.into()));
        self
    }

    /// Append a source model reference.
    pub fn source(&mut self, model: impl Into<String>) -> &mut Self {
        self.segments.push(Segment::Source(model.into()));
        self
    }

    /// Append a quoted identifier.
    pub fn ident(&mut self, name: impl Into<String>) -> &mut Self {
        self.segments.push(Segment::Ident(name.into()));
        self
    }

    /// Append a bind marker.
    pub fn bind(&mut self, name: impl Into<String>) -> &mut Self {
        self.segments.push(Segment::Bind(name.into()));
        self
    }

    /// Append user-supplied SQL text, lifting embedded `[...]` spans into
    /// identifier segments and `:name:` spans into bind segments. Content
    /// inside single-quoted literals stays verbatim.
    pub fn fragment(&mut self, text: &str) -> &mut Self {
        scan_fragment(text, &mut self.segments);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Source model names in first-appearance order, deduplicated.
    pub fn sources(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Source(model) = segment {
                if !out.contains(&model.as_str()) {
                    out.push(model);
                }
            }
        }
        out
    }

    /// Bind marker names in first-appearance order, deduplicated.
    pub fn bind_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Bind(name) = segment {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
        }
        out
    }

    /// The bracket/colon text form.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Sql(s) => out.push_str(s),
                Segment::Source(m) | Segment::Ident(m) => {
                    out.push('[');
                    out.push_str(m);
                    out.push(']');
                }
                Segment::Bind(b) => {
                    out.push(':');
                    out.push_str(b);
                    out.push(':');
                }
            }
        }
        out
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

// =============================================================================
// Fragment scanning
// =============================================================================

fn is_marker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn flush(buf: &mut String, segments: &mut Vec<Segment>) {
    if !buf.is_empty() {
        segments.push(Segment::Sql(std::mem::take(buf)));
    }
}

fn scan_fragment(text: &str, segments: &mut Vec<Segment>) {
    let chars: Vec<char> = text.chars().collect();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' => {
                // String literal: copy verbatim through the closing quote,
                // honoring '' escapes.
                buf.push('\'');
                i += 1;
                while i < chars.len() {
                    buf.push(chars[i]);
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            buf.push('\'');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '[' => match chars[i + 1..].iter().position(|&c| c == ']') {
                Some(offset) => {
                    flush(&mut buf, segments);
                    let name: String = chars[i + 1..i + 1 + offset].iter().collect();
                    segments.push(Segment::Ident(name));
                    i += offset + 2;
                }
                None => {
                    // Unterminated bracket: keep the rest as plain text.
                    buf.extend(&chars[i..]);
                    i = chars.len();
                }
            },
            ':' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_marker_char(chars[end]) {
                    end += 1;
                }
                if end > start && chars.get(end) == Some(&':') {
                    flush(&mut buf, segments);
                    segments.push(Segment::Bind(chars[start..end].iter().collect()));
                    i = end + 1;
                } else {
                    // A lone colon, or a colon-prefixed word without the
                    // closing marker: plain text.
                    buf.extend(&chars[i..end]);
                    i = end;
                }
            }
            c => {
                buf.push(c);
                i += 1;
            }
        }
    }

    flush(&mut buf, segments);
}
