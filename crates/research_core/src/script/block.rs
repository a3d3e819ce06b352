//! Brace-block extraction and typed block parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::value::{parse_value, Block, CompareOp, Value};

static QUOTED_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quoted element pattern is valid"));

/// Body of a brace block together with where scanning should resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Text between the opening brace and its matching close.
    pub body: String,
    /// Index of the first line after the closing brace.
    pub next: usize,
}

/// Line index and byte column into a slice of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Pos {
    line: usize,
    col: usize,
}

impl Pos {
    const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Where a block body lies: from just after the opening brace up to its
/// matching close (exclusive).
#[derive(Debug, Clone, Copy)]
struct Span {
    start: Pos,
    end: Pos,
    /// First line after the closing brace, or the limit line when the
    /// block is unterminated.
    next: usize,
    closed: bool,
}

/// Text of `line` between `from` and `to`, clamped to the line.
fn slice_of<S: AsRef<str>>(lines: &[S], line: usize, from: Pos, to: Pos) -> &str {
    let Some(text) = lines.get(line) else {
        return "";
    };
    let text: &str = text.as_ref();
    let lo = if line == from.line { from.col.min(text.len()) } else { 0 };
    let hi = if line == to.line { to.col.min(text.len()) } else { text.len() };
    text.get(lo..hi.max(lo)).unwrap_or("")
}

/// Find the block opening at or after `from`, scanning no further than
/// `limit`. A `}` before the opening brace is ignored.
fn locate_block<S: AsRef<str>>(lines: &[S], from: Pos, limit: Pos) -> Span {
    let mut depth = 0usize;
    let mut start = None;

    for line in from.line..=limit.line.min(lines.len().saturating_sub(1)) {
        let text = slice_of(lines, line, from, limit);
        let base = if line == from.line { from.col } else { 0 };
        for (off, ch) in text.char_indices() {
            match ch {
                '{' => {
                    depth += 1;
                    if start.is_none() {
                        start = Some(Pos::new(line, base + off + 1));
                    }
                }
                '}' if depth > 0 => {
                    depth -= 1;
                    if let (0, Some(start)) = (depth, start) {
                        return Span {
                            start,
                            end: Pos::new(line, base + off),
                            next: line + 1,
                            closed: true,
                        };
                    }
                }
                _ => {}
            }
        }
    }

    let end = limit.min(Pos::new(lines.len(), 0));
    Span {
        start: start.unwrap_or(end),
        end,
        next: end.line,
        closed: false,
    }
}

/// The pieces of a span, one per line it touches.
fn span_pieces<'a, S: AsRef<str>>(
    lines: &'a [S],
    span: Span,
) -> impl Iterator<Item = &'a str> {
    (span.start.line..=span.end.line)
        .map(move |line| slice_of(lines, line, span.start, span.end))
}

/// Extract the brace-delimited block that opens on `lines[start]`.
///
/// The first `{` is not part of the body. Every character seen while the
/// block is open is kept, and a newline is appended after each line that
/// ends with the block still open. When the matching `}` is reached the
/// scan stops and [`Extracted::next`] is the following line. An
/// unterminated block runs to the end, with `next == lines.len()`.
#[must_use]
pub fn extract_block<S: AsRef<str>>(lines: &[S], start: usize) -> Extracted {
    let span = locate_block(lines, Pos::new(start, 0), Pos::new(lines.len(), 0));
    Extracted {
        body: span_pieces(lines, span).collect::<Vec<_>>().join("\n"),
        next: span.next,
    }
}

/// Whether a block body should be read as an array.
///
/// After trimming braces and whitespace from both ends, a body containing
/// no `=` is an array. A map whose only entries are comparisons is
/// therefore read as an array of bare words.
#[must_use]
pub fn is_array(body: &str) -> bool {
    !body
        .trim_matches(|c| matches!(c, '{' | '}' | ' ' | '\n' | '\t'))
        .contains('=')
}

/// Parse an array body.
///
/// If the body contains quoted strings, only those are kept, in order of
/// appearance and without their quotes. Otherwise the body is split on
/// whitespace and every token is classified with [`parse_value`].
#[must_use]
pub fn parse_array(body: &str) -> Vec<Value> {
    let content = body.trim();

    let quoted: Vec<Value> = QUOTED_ELEMENT
        .captures_iter(content)
        .map(|caps| Value::String(caps[1].to_string()))
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }

    content.split_whitespace().map(parse_value).collect()
}

/// One `key <op> value` line.
struct Entry {
    key: String,
    op: Option<CompareOp>,
    value: String,
}

impl Entry {
    /// Split a line into key, operator and value text.
    ///
    /// The first `=` decides. `<=`, `>=` and `!=` become comparisons, `?=`
    /// and `==` are treated as plain assignment. Lines without `=` are
    /// accepted only as `key < value` or `key > value` with an unquoted key.
    fn parse(line: &str) -> Option<Self> {
        if let Some(pos) = line.find('=') {
            let (mut key, mut value) = (&line[..pos], &line[pos + 1..]);
            let mut op = None;
            if let Some(last) = key.trim_end().chars().last() {
                let stripped = &key.trim_end()[..key.trim_end().len() - last.len_utf8()];
                match last {
                    '<' => (key, op) = (stripped, Some(CompareOp::Le)),
                    '>' => (key, op) = (stripped, Some(CompareOp::Ge)),
                    '!' => (key, op) = (stripped, Some(CompareOp::Ne)),
                    '?' => key = stripped,
                    _ => {}
                }
            }
            if let Some(rest) = value.strip_prefix('=') {
                value = rest;
            }
            return Some(Self {
                key: key.trim().to_string(),
                op,
                value: value.trim().to_string(),
            });
        }

        let pos = line.find(|c| c == '<' || c == '>')?;
        let key = line[..pos].trim();
        if key.is_empty() || key.contains('"') {
            return None;
        }
        let op = if line[pos..].starts_with('<') {
            CompareOp::Lt
        } else {
            CompareOp::Gt
        };
        Some(Self {
            key: key.to_string(),
            op: Some(op),
            value: line[pos + 1..].trim().to_string(),
        })
    }

    fn into_value(self) -> Value {
        let value = parse_value(&self.value);
        match self.op {
            Some(op) => Value::Comparison {
                op,
                value: Box::new(value),
            },
            None => value,
        }
    }
}

/// A block being filled in. Frames index into one shared line array, and
/// nested map blocks get their own frame instead of a recursive call.
struct Frame {
    key: String,
    cursor: Pos,
    end: Pos,
    entries: Block,
}

enum Step {
    Continue,
    Descend(Frame),
    Finished,
}

impl Frame {
    fn new(key: String, start: Pos, end: Pos) -> Self {
        Self {
            key,
            cursor: start,
            end,
            entries: Block::new(),
        }
    }

    fn step(&mut self, lines: &[&str]) -> Step {
        let here = self.cursor;
        if here > self.end || here.line >= lines.len() {
            return Step::Finished;
        }
        self.cursor = Pos::new(here.line + 1, 0);

        let line = slice_of(lines, here.line, here, self.end).trim();
        if line.is_empty() || line == "}" {
            return Step::Continue;
        }
        let Some(entry) = Entry::parse(line) else {
            return Step::Continue;
        };

        if !entry.value.starts_with('{') {
            self.entries.insert(entry.key.clone(), entry.into_value());
            return Step::Continue;
        }

        let span = locate_block(lines, here, self.end);
        self.cursor = if span.closed {
            Pos::new(span.next, 0)
        } else {
            self.end
        };

        // Same test as `is_array`, without joining the body.
        if span_pieces(lines, span).any(|piece| piece.contains('=')) {
            return Step::Descend(Frame::new(entry.key, span.start, span.end));
        }
        let body = span_pieces(lines, span).collect::<Vec<_>>().join("\n");
        self.entries.insert(entry.key, Value::Array(parse_array(&body)));
        Step::Continue
    }
}

/// Parse a block body into its entries.
///
/// Each non-empty line other than a lone `}` is split on its first `=`.
/// A value starting with `{` opens a nested block which becomes either a
/// [`Value::Array`] or a [`Value::Map`] (see [`is_array`]). Other values are
/// classified with [`parse_value`]. Lines without `=` are skipped, except
/// `key < value` and `key > value` comparisons. Later duplicate keys
/// overwrite earlier ones.
#[must_use]
pub fn parse_block(body: &str) -> Block {
    let lines: Vec<&str> = body.split('\n').collect();
    let mut stack = vec![Frame::new(
        String::new(),
        Pos::new(0, 0),
        Pos::new(lines.len(), 0),
    )];

    while let Some(frame) = stack.last_mut() {
        match frame.step(&lines) {
            Step::Continue => {}
            Step::Descend(child) => stack.push(child),
            Step::Finished => {
                let Some(done) = stack.pop() else { break };
                match stack.last_mut() {
                    Some(parent) => {
                        parent.entries.insert(done.key, Value::Map(done.entries));
                    }
                    None => return done.entries,
                }
            }
        }
    }

    Block::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use research_test_utils::strategies::arb_block_lines;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    // ========================================================================
    // Extraction
    // ========================================================================

    #[test]
    fn test_extract_simple_block() {
        let src = lines("tech_a = {\ncost = 100\n}\nafter");
        let out = extract_block(&src, 0);
        assert_eq!(out.body, "\ncost = 100\n");
        assert_eq!(out.next, 3);
    }

    #[test]
    fn test_extract_single_line_block() {
        let src = lines("a = { x y }\nb = 1");
        let out = extract_block(&src, 0);
        assert_eq!(out.body, " x y ");
        assert_eq!(out.next, 1);
    }

    #[test]
    fn test_extract_nested_keeps_inner_braces() {
        let src = lines("a = {\nb = {\nc = 1\n}\n}");
        let out = extract_block(&src, 0);
        assert_eq!(out.body, "\nb = {\nc = 1\n}\n");
        assert_eq!(out.next, 5);
    }

    #[test]
    fn test_extract_unterminated_runs_to_end() {
        let src = lines("a = {\nb = 1\nc = 2");
        let out = extract_block(&src, 0);
        assert_eq!(out.body, "\nb = 1\nc = 2\n");
        assert_eq!(out.next, 3);
    }

    // ========================================================================
    // Disambiguation
    // ========================================================================

    #[test]
    fn test_is_array() {
        assert!(is_array(" \"tech_b\" \"tech_c\" "));
        assert!(is_array("\ncomputing\n"));
        assert!(is_array(""));
        assert!(!is_array("\ncost = 5\n"));
    }

    #[test]
    fn test_parse_array_prefers_quoted() {
        assert_eq!(
            parse_array(" \"tech_b\" stray \"tech_c\" "),
            vec![Value::String("tech_b".into()), Value::String("tech_c".into())]
        );
    }

    #[test]
    fn test_parse_array_bare_tokens() {
        assert_eq!(
            parse_array("\ncomputing 5 yes\n"),
            vec![
                Value::String("computing".into()),
                Value::Int(5),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_parse_array_empty() {
        assert!(parse_array("  ").is_empty());
    }

    // ========================================================================
    // Block parsing
    // ========================================================================

    #[test]
    fn test_parse_block_scalars() {
        let block = parse_block("cost = 100\narea = physics\nis_rare = yes\nbase_weight = 1.5\n");
        assert_eq!(block.get("cost"), Some(&Value::Int(100)));
        assert_eq!(block.get("area"), Some(&Value::String("physics".into())));
        assert_eq!(block.get("is_rare"), Some(&Value::Bool(true)));
        assert_eq!(block.get("base_weight"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_array_vs_map() {
        let block = parse_block("prerequisites = {\n\"tech_b\"\n}\nmodifier = {\nfactor = 2\n}\n");
        assert_eq!(
            block.get("prerequisites"),
            Some(&Value::Array(vec![Value::String("tech_b".into())]))
        );
        let modifier = block.get("modifier").and_then(Value::as_map);
        assert_eq!(
            modifier.and_then(|m| m.get("factor")),
            Some(&Value::Int(2))
        );
    }

    #[test]
    fn test_deep_nesting() {
        let body = "a = {\nb = {\nc = {\nd = 1\n}\n}\ne = 2\n}\nf = 3\n";
        let block = parse_block(body);
        let a = block.get("a").and_then(Value::as_map).expect("a is a map");
        let b = a.get("b").and_then(Value::as_map).expect("b is a map");
        let c = b.get("c").and_then(Value::as_map).expect("c is a map");
        assert_eq!(c.get("d"), Some(&Value::Int(1)));
        assert_eq!(a.get("e"), Some(&Value::Int(2)));
        assert_eq!(block.get("f"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_lines_without_operator_skipped() {
        let block = parse_block("stray\ncost = 5\n}\n");
        assert_eq!(block.len(), 1);
        assert_eq!(block.get("cost"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let block = parse_block("cost = 5\ncost = 7\n");
        assert_eq!(block.get("cost"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_comparison_entries() {
        let block = parse_block("years_passed > 10\nnum_planets <= 3\nhas_x != yes\nflag ?= yes\n");
        assert_eq!(
            block.get("years_passed"),
            Some(&Value::Comparison {
                op: CompareOp::Gt,
                value: Box::new(Value::Int(10))
            })
        );
        assert_eq!(
            block.get("num_planets"),
            Some(&Value::Comparison {
                op: CompareOp::Le,
                value: Box::new(Value::Int(3))
            })
        );
        assert_eq!(
            block.get("has_x"),
            Some(&Value::Comparison {
                op: CompareOp::Ne,
                value: Box::new(Value::Bool(true))
            })
        );
        assert_eq!(block.get("flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unterminated_nested_block_keeps_entries() {
        let block = parse_block("a = {\nb = 1\n");
        let a = block.get("a").and_then(Value::as_map).expect("a is a map");
        assert_eq!(a.get("b"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_thousands_of_nesting_levels() {
        const DEPTH: usize = 5000;
        // Dropping the nested result recurses once per level.
        let walked = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let opens = "a = {\n".repeat(DEPTH);
                let closes = "}\n".repeat(DEPTH);
                let block = parse_block(&format!("{opens}b = 1\n{closes}"));
                let mut current = &block;
                let mut levels = 0;
                while let Some(inner) = current.get("a").and_then(Value::as_map) {
                    current = inner;
                    levels += 1;
                }
                (levels, current.get("b").cloned())
            })
            .expect("spawn parser thread")
            .join()
            .expect("parser thread finished");
        assert_eq!(walked, (DEPTH, Some(Value::Int(1))));
    }

    #[test]
    fn test_nested_block_inside_single_line() {
        let block = parse_block("a = { b = { c = 1 } d = { x y } }");
        let a = block.get("a").and_then(Value::as_map).expect("a is a map");
        let b = a.get("b").and_then(Value::as_map).expect("b is a map");
        assert_eq!(b.get("c"), Some(&Value::Int(1)));
    }

    proptest! {
        #[test]
        fn prop_extract_resumes_after_start((lines, inner) in arb_block_lines()) {
            let out = extract_block(&lines, 0);
            prop_assert!(out.next > 0);
            prop_assert_eq!(out.next, lines.len());
            let body_lines: Vec<&str> = out.body.lines().filter(|l| !l.is_empty()).collect();
            prop_assert_eq!(body_lines, inner.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
