//! HTML helpers.
//!
//! - `escape()` - HTML entity escaping
//! - element classification used by the pretty printer
//! - `pretty()` - re-indents rendered pages

use std::borrow::Cow;

// =============================================================================
// HTML Escaping
// =============================================================================

const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Borrows when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

// =============================================================================
// Element Classification
// =============================================================================

/// Void elements cannot have children.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose content is copied verbatim by the pretty printer.
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "pre" | "textarea")
}

/// Block-level elements (own line when pretty printing).
#[inline]
pub fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "canvas"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "noscript"
            | "ol"
            | "p"
            | "section"
            | "table"
            | "tfoot"
            | "ul"
            | "video"
    )
}

/// Document structure elements that also get their own line.
#[inline]
fn is_structural_element(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "head"
            | "body"
            | "title"
            | "meta"
            | "link"
            | "base"
            | "template"
            | "thead"
            | "tbody"
            | "tr"
            | "td"
            | "th"
            | "caption"
            | "colgroup"
            | "col"
            | "select"
            | "option"
            | "optgroup"
            | "details"
            | "summary"
            | "dialog"
            | "picture"
            | "source"
            | "iframe"
    )
}

#[inline]
fn breaks_line(tag: &str) -> bool {
    is_block_element(tag) || is_structural_element(tag)
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, PartialEq)]
enum Token<'a> {
    /// `<!DOCTYPE ...>` or `<?...?>`
    Declaration(&'a str),
    Comment(&'a str),
    Open {
        name: String,
        raw: &'a str,
        self_closing: bool,
    },
    Close {
        name: String,
        raw: &'a str,
    },
    Text(&'a str),
    /// Whole raw-text element, open tag through close tag
    Verbatim(&'a str),
}

/// Byte offset just past the `>` closing the tag at the start of `s`.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in s.bytes().enumerate().skip(1) {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn tag_name(s: &str) -> String {
    s.chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn tokenize(src: &str) -> Vec<Token<'_>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < src.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        let rest = &src[pos..];
        let (token, len) = if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            (Token::Comment(&rest[..end]), end)
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            (Token::Declaration(&rest[..end]), end)
        } else if let Some(after) = rest.strip_prefix("</") {
            let Some(i) = after.find('>') else {
                pos += 1;
                continue;
            };
            let name = tag_name(after[..i].trim());
            (Token::Close { name, raw: &rest[..i + 3] }, i + 3)
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let Some(end) = tag_end(rest) else {
                pos += 1;
                continue;
            };
            let raw = &rest[..end];
            let name = tag_name(&rest[1..]);
            let self_closing = raw.ends_with("/>");

            if is_raw_text_element(&name) && !self_closing {
                let lower = rest.to_ascii_lowercase();
                let close = format!("</{name}");
                let total = match lower[end..].find(&close) {
                    Some(i) => {
                        let close_at = end + i;
                        rest[close_at..]
                            .find('>')
                            .map_or(rest.len(), |j| close_at + j + 1)
                    }
                    None => rest.len(),
                };
                (Token::Verbatim(&rest[..total]), total)
            } else {
                (
                    Token::Open {
                        name,
                        raw,
                        self_closing,
                    },
                    end,
                )
            }
        } else {
            pos += 1;
            continue;
        };

        if text_start < pos {
            tokens.push(Token::Text(&src[text_start..pos]));
        }
        tokens.push(token);
        pos += len;
        text_start = pos;
    }

    if text_start < src.len() {
        tokens.push(Token::Text(&src[text_start..]));
    }
    tokens
}

// =============================================================================
// Pretty Printer
// =============================================================================

struct Printer<'a> {
    out: String,
    indent: &'a str,
    depth: usize,
    /// Inline content collected for the current line
    line: String,
    /// Block open tag not yet written; lets `<p>text</p>` stay on one line
    pending: Option<String>,
}

impl Printer<'_> {
    fn push_line(&mut self, s: &str) {
        for _ in 0..self.depth {
            self.out.push_str(self.indent);
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn flush_pending(&mut self) {
        if let Some(open) = self.pending.take() {
            self.push_line(&open);
            self.depth += 1;
        }
    }

    fn flush_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        let text = line.trim();
        if !text.is_empty() {
            self.flush_pending();
            self.push_line(text);
        }
    }

    /// Flush everything and write `s` on its own line.
    fn standalone(&mut self, s: &str) {
        self.flush_line();
        self.flush_pending();
        self.push_line(s);
    }

    fn text(&mut self, text: &str) {
        let mut last_space = self.line.ends_with(' ');
        for c in text.chars() {
            if c.is_whitespace() {
                if !last_space {
                    self.line.push(' ');
                    last_space = true;
                }
            } else {
                self.line.push(c);
                last_space = false;
            }
        }
    }

    fn open_block(&mut self, raw: &str, empty: bool) {
        if empty {
            self.standalone(raw);
        } else {
            self.flush_line();
            self.flush_pending();
            self.pending = Some(raw.to_string());
        }
    }

    fn close_block(&mut self, raw: &str) {
        if let Some(open) = self.pending.take() {
            let line = std::mem::take(&mut self.line);
            self.push_line(&format!("{open}{}{raw}", line.trim()));
            return;
        }
        self.flush_line();
        self.depth = self.depth.saturating_sub(1);
        self.push_line(raw);
    }
}

/// Re-indent an HTML document.
///
/// Block and document-structure elements go on their own lines, nested by
/// `indent`. Inline content is kept on one line with whitespace collapsed.
/// Raw-text elements (`script`, `style`, `pre`, `textarea`) are copied
/// verbatim.
pub fn pretty(src: &str, indent: &str) -> String {
    let mut p = Printer {
        out: String::with_capacity(src.len() + src.len() / 4),
        indent,
        depth: 0,
        line: String::new(),
        pending: None,
    };

    for token in tokenize(src) {
        match token {
            Token::Declaration(s) | Token::Comment(s) | Token::Verbatim(s) => p.standalone(s),
            Token::Text(s) => p.text(s),
            Token::Open {
                name,
                raw,
                self_closing,
            } => {
                if breaks_line(&name) {
                    p.open_block(raw, self_closing || is_void_element(&name));
                } else {
                    p.line.push_str(raw);
                }
            }
            Token::Close { name, raw } => {
                if breaks_line(&name) {
                    p.close_block(raw);
                } else {
                    p.line.push_str(raw);
                }
            }
        }
    }

    p.flush_line();
    p.flush_pending();
    p.out
}
