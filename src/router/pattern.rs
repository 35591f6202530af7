//! Route pattern compilation.
//!
//! Patterns may mix literal path text with three dynamic forms:
//!
//! - shorthand tokens: `/:module`, `/:controller`, `/:namespace`, `/:action`
//!   (word segments), `/:params` (an optional catch-all tail) and `/:int`
//!   (a positional digit segment);
//! - named placeholders: `{name}` for a word segment, `{name:regex}` for a
//!   custom expression;
//! - raw regex fragments, passed through untouched.
//!
//! After substitution a pattern with no `(` or `[` is matched by literal
//! string equality. Anything else is anchored with `^...$` and compiled on
//! first use; a malformed expression surfaces as [`RouteError::Compilation`]
//! at that point, not at construction.

use once_cell::unsync::OnceCell;
use regex::Regex;

/// Error type for route matching.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Pattern `{pattern}` failed to compile: {source}")]
    Compilation {
        pattern: String,
        source: regex::Error,
    },
}

pub type RouteResult<T> = Result<T, RouteError>;

/// Shorthand substitution table, applied in order.
const SHORTHANDS: &[(&str, &str)] = &[
    ("/:module", "/(?P<module>[\\w-]+)"),
    ("/:controller", "/(?P<controller>[\\w-]+)"),
    ("/:namespace", "/(?P<namespace>[\\w-]+)"),
    ("/:action", "/(?P<action>[\\w-]+)"),
    ("/:params", "(?P<params>/.+)?"),
    ("/:int", "/(\\d+)"),
];

// =============================================================================
// Compiled pattern
// =============================================================================

/// A route pattern after substitution, holding its lazily-built matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    transformed: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Literal,
    Regex(OnceCell<Result<Regex, regex::Error>>),
}

impl CompiledPattern {
    /// Substitute shorthands and placeholders. Never fails: regex problems
    /// are deferred to the first match attempt.
    pub fn compile(pattern: &str) -> Self {
        let mut transformed = pattern.to_string();
        if transformed.contains(':') {
            for (token, replacement) in SHORTHANDS {
                if transformed.contains(token) {
                    transformed = transformed.replace(token, replacement);
                }
            }
        }
        if transformed.contains('{') {
            transformed = replace_placeholders(&transformed);
        }

        let kind = if transformed.contains('(') || transformed.contains('[') {
            PatternKind::Regex(OnceCell::new())
        } else {
            PatternKind::Literal
        };

        CompiledPattern {
            source: pattern.to_string(),
            transformed,
            kind,
        }
    }

    /// The pattern as it was written.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// The pattern after substitution.
    pub fn transformed(&self) -> &str {
        &self.transformed
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, PatternKind::Literal)
    }

    /// Match `path`, yielding captures on success.
    pub fn matches(&self, path: &str) -> RouteResult<Option<PatternMatch>> {
        match &self.kind {
            PatternKind::Literal => Ok((self.transformed == path).then(PatternMatch::default)),
            PatternKind::Regex(cell) => {
                let compiled =
                    cell.get_or_init(|| Regex::new(&format!("^{}$", self.transformed)));
                let regex = compiled.as_ref().map_err(|e| RouteError::Compilation {
                    pattern: self.source.clone(),
                    source: e.clone(),
                })?;
                Ok(regex
                    .captures(path)
                    .map(|caps| PatternMatch::from_captures(regex, &caps)))
            }
        }
    }
}

/// The captures of one successful match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternMatch {
    named: Vec<(String, String)>,
    positional: Vec<Option<String>>,
}

impl PatternMatch {
    fn from_captures(regex: &Regex, caps: &regex::Captures<'_>) -> Self {
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        let positional = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        PatternMatch { named, positional }
    }

    pub fn named(&self) -> impl Iterator<Item = (&str, &str)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get_named(&self, name: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Capture group by one-based position; `None` when absent or when the
    /// group did not participate in the match.
    pub fn position(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.positional.get(i))
            .and_then(|v| v.as_deref())
    }
}

// =============================================================================
// Placeholder substitution
// =============================================================================

/// Replace `{name}` and `{name:regex}` runs. A run whose leading character
/// is not a letter or underscore (a `{1,3}` quantifier, say) stays verbatim.
fn replace_placeholders(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let Some(end) = matching_brace(&chars, i) else {
            // Unterminated brace: leave the rest untouched.
            out.extend(&chars[i..]);
            break;
        };
        let inner: String = chars[i + 1..end].iter().collect();
        match parse_placeholder(&inner) {
            Some((name, Some(regex))) => {
                out.push_str(&format!("(?P<{}>{})", name, regex));
            }
            Some((name, None)) => {
                out.push_str(&format!("(?P<{}>[\\w_]+)", name));
            }
            None => {
                out.push('{');
                out.push_str(&inner);
                out.push('}');
            }
        }
        i = end + 1;
    }

    out
}

/// Index of the brace closing the one at `open`, depth-aware so custom
/// sub-expressions like `{id:\d{1,3}}` keep their inner braces.
fn matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a placeholder body into (name, optional regex); `None` when the
/// body is not a valid placeholder name.
fn parse_placeholder(inner: &str) -> Option<(&str, Option<&str>)> {
    let (name, regex) = match inner.find(':') {
        Some(idx) => (&inner[..idx], Some(&inner[idx + 1..])),
        None => (inner, None),
    };
    let mut cs = name.chars();
    let first = cs.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !cs.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, regex))
}
