//! Source rewrites applied before a file is written to its workspace.
//!
//! The Java rename works on a token stream rather than raw text: comments,
//! string, char and text-block literals are skipped, and brace depth is
//! tracked so only a top-level `class` declaration is picked.

use std::borrow::Cow;

/// Rewrite applied to source text before it is written to the workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceTransform {
    #[default]
    None,
    /// Rename the entry class to the request identifier so that the file
    /// name, the compiled class file and the `java` invocation agree.
    RenameMainClass,
}

impl SourceTransform {
    pub fn apply<'a>(self, source: &'a str, id: &str) -> Cow<'a, str> {
        match self {
            Self::None => Cow::Borrowed(source),
            Self::RenameMainClass => rename_main_class(source, id),
        }
    }
}

/// Modifiers that may precede `class` in a top-level declaration.
const CLASS_MODIFIERS: &[&str] = &["public", "final", "abstract", "static", "strictfp", "sealed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ident,
    Punct(u8),
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: Kind,
    text: &'a str,
    start: usize,
    end: usize,
    /// Brace nesting at the token; 0 is top level.
    depth: usize,
}

impl Token<'_> {
    fn is_ident(&self, word: &str) -> bool {
        self.kind == Kind::Ident && self.text == word
    }
}

fn is_ident_start(b: u8) -> bool {
    // Bytes >= 0x80 belong to non-ASCII identifier characters; token bounds
    // therefore always fall on ASCII bytes and are valid char boundaries.
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

/// Index just past the literal whose body starts at `i` and ends at `close`.
fn skip_literal(bytes: &[u8], mut i: usize, close: &[u8]) -> usize {
    while let Some(&b) = bytes.get(i) {
        if b == b'\\' {
            i += 2;
            continue;
        }
        if bytes.get(i..).is_some_and(|rest| rest.starts_with(close)) {
            return i + close.len();
        }
        i += 1;
    }
    bytes.len()
}

/// Tokens of the code regions of `source`.
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let at = |i: usize| bytes.get(i).copied();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while let Some(b) = at(i) {
        let start = i;
        match b {
            b'/' if at(i + 1) == Some(b'/') => {
                i = find_from(bytes, i + 2, b"\n").unwrap_or(bytes.len());
            }
            b'/' if at(i + 1) == Some(b'*') => {
                i = find_from(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2);
            }
            b'"' if at(i + 1) == Some(b'"') && at(i + 2) == Some(b'"') => {
                i = skip_literal(bytes, i + 3, b"\"\"\"");
            }
            b'"' => i = skip_literal(bytes, i + 1, b"\""),
            b'\'' => i = skip_literal(bytes, i + 1, b"'"),
            b if is_ident_start(b) => {
                while at(i).is_some_and(is_ident_part) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: Kind::Ident,
                    text: source.get(start..i).unwrap_or_default(),
                    start,
                    end: i,
                    depth,
                });
            }
            b if b.is_ascii_digit() => {
                while at(i).is_some_and(is_ident_part) {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                i += 1;
                if b == b'}' {
                    depth = depth.saturating_sub(1);
                }
                tokens.push(Token {
                    kind: Kind::Punct(b),
                    text: source.get(start..i).unwrap_or_default(),
                    start,
                    end: i,
                    depth,
                });
                if b == b'{' {
                    depth += 1;
                }
            }
        }
    }
    tokens
}

/// The public top-level class if there is one, otherwise the first
/// top-level class.
fn main_class_name<'a>(tokens: &[Token<'a>]) -> Option<&'a str> {
    let mut first = None;
    for (idx, token) in tokens.iter().enumerate() {
        if token.depth != 0 || !token.is_ident("class") {
            continue;
        }
        // `Foo.class` literal
        let previous = idx.checked_sub(1).and_then(|p| tokens.get(p));
        if previous.is_some_and(|t| t.kind == Kind::Punct(b'.')) {
            continue;
        }
        let Some(name) = tokens.get(idx + 1).filter(|t| t.kind == Kind::Ident) else {
            continue;
        };
        let is_public = tokens
            .get(..idx)
            .unwrap_or_default()
            .iter()
            .rev()
            .take_while(|t| t.kind == Kind::Ident && CLASS_MODIFIERS.contains(&t.text))
            .any(|t| t.text == "public");
        if is_public {
            return Some(name.text);
        }
        first.get_or_insert(name.text);
    }
    first
}

fn rename_main_class<'a>(source: &'a str, id: &str) -> Cow<'a, str> {
    let tokens = tokenize(source);
    let Some(name) = main_class_name(&tokens) else {
        return Cow::Borrowed(source);
    };
    if name == id {
        return Cow::Borrowed(source);
    }

    let mut renamed = String::with_capacity(source.len() + id.len());
    let mut copied = 0;
    for token in tokens.iter().filter(|t| t.is_ident(name)) {
        renamed.push_str(source.get(copied..token.start).unwrap_or_default());
        renamed.push_str(id);
        copied = token.end;
    }
    renamed.push_str(source.get(copied..).unwrap_or_default());
    Cow::Owned(renamed)
}
