//! Comment stripping and line layout.

/// Remove comments, surrounding whitespace and blank lines.
///
/// A `#` anywhere on a line truncates it. A leading UTF-8 byte order mark
/// is dropped. The result has one trimmed, non-empty line per input line
/// that had content, each terminated by `\n`.
#[must_use]
pub fn strip_comments(source: &str) -> String {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut out = String::with_capacity(source.len());

    for line in source.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if !line.is_empty() {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    Operator,
    Word,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
}

/// Bytes that can start an operator. `!` and `?` only do so before `=`.
fn operator_len(bytes: &[u8], at: usize) -> Option<usize> {
    let next_is_eq = bytes.get(at + 1) == Some(&b'=');
    match bytes[at] {
        b'<' | b'>' | b'=' if next_is_eq => Some(2),
        b'<' | b'>' | b'=' => Some(1),
        b'!' | b'?' if next_is_eq => Some(2),
        _ => None,
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let (kind, end) = match b {
            b'{' => (TokenKind::Open, i + 1),
            b'}' => (TokenKind::Close, i + 1),
            b'"' => {
                // Quoted strings never span lines.
                let rest = &bytes[i + 1..];
                let end = match rest.iter().position(|&c| c == b'"' || c == b'\n') {
                    Some(off) if rest[off] == b'"' => i + off + 2,
                    Some(off) => i + off + 1,
                    None => bytes.len(),
                };
                (TokenKind::Word, end)
            }
            _ => {
                if let Some(len) = operator_len(bytes, i) {
                    (TokenKind::Operator, i + len)
                } else {
                    let mut end = i + 1;
                    while end < bytes.len() {
                        let c = bytes[end];
                        if c.is_ascii_whitespace()
                            || matches!(c, b'{' | b'}' | b'"')
                            || operator_len(bytes, end).is_some()
                        {
                            break;
                        }
                        end += 1;
                    }
                    (TokenKind::Word, end)
                }
            }
        };

        tokens.push(Token {
            kind,
            text: &text[i..end],
        });
        i = end;
    }

    tokens
}

fn flush_line(out: &mut String, line: &mut Vec<&str>) {
    if !line.is_empty() {
        out.push_str(&line.join(" "));
        out.push('\n');
        line.clear();
    }
}

/// Re-lay script text so that the line-based parser sees one entry per line.
///
/// Every `{` ends its line, every `}` stands on a line of its own, and a
/// word followed by an operator starts a new line. Bare words that are not
/// keys (array elements) stay together on the current line. Tokens are
/// re-joined with single spaces.
///
/// ```
/// use research_core::script::normalize_layout;
///
/// let text = normalize_layout("tech_a = { cost = 100 area = physics }");
/// assert_eq!(text, "tech_a = {\ncost = 100\narea = physics\n}\n");
/// ```
#[must_use]
pub fn normalize_layout(text: &str) -> String {
    let tokens = tokenize(text);
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut line: Vec<&str> = Vec::new();
    let mut expect_value = false;

    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Open => {
                line.push(token.text);
                flush_line(&mut out, &mut line);
                expect_value = false;
            }
            TokenKind::Close => {
                flush_line(&mut out, &mut line);
                out.push_str("}\n");
                expect_value = false;
            }
            TokenKind::Operator => {
                line.push(token.text);
                expect_value = true;
            }
            TokenKind::Word if expect_value => {
                line.push(token.text);
                expect_value = false;
            }
            TokenKind::Word => {
                let starts_entry = tokens
                    .get(idx + 1)
                    .is_some_and(|next| next.kind == TokenKind::Operator);
                if starts_entry {
                    flush_line(&mut out, &mut line);
                }
                line.push(token.text);
            }
        }
    }
    flush_line(&mut out, &mut line);

    out
}

/// Full preprocessing pass: [`strip_comments`] then [`normalize_layout`].
#[must_use]
pub fn preprocess(source: &str) -> String {
    normalize_layout(&strip_comments(source))
}
