#![forbid(unsafe_code)]

//! Syntax tokenization engine.
//!
//! A token model, the [`Tokenizer`] trait, and a configurable
//! [`GenericTokenizer`] that handles the lexical patterns shared by scripting
//! languages: line comments, single and triple-quoted strings (with prefixes),
//! numbers, decorators and keyword classes.

use std::ops::Range;

// ---------------------------------------------------------------------------
// Token kinds
// ---------------------------------------------------------------------------

/// Semantic token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Builtin,
    Literal,
    String,
    Number,
    Comment,
    Decorator,
    /// Name following a function-defining keyword.
    FunctionName,
    /// Name following a class-defining keyword.
    ClassName,
    Identifier,
    Operator,
    Punctuation,
    Delimiter,
    Whitespace,
}

impl TokenKind {
    /// CSS class used by the highlighting stylesheet, if the kind is styled.
    #[must_use]
    pub const fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Keyword => Some("hljs-keyword"),
            Self::Builtin => Some("hljs-built_in"),
            Self::Literal => Some("hljs-literal"),
            Self::String => Some("hljs-string"),
            Self::Number => Some("hljs-number"),
            Self::Comment => Some("hljs-comment"),
            Self::Decorator => Some("hljs-meta"),
            Self::FunctionName => Some("hljs-title function_"),
            Self::ClassName => Some("hljs-title class_"),
            Self::Identifier
            | Self::Operator
            | Self::Punctuation
            | Self::Delimiter
            | Self::Whitespace => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A token with a kind and a byte range in the source text.
///
/// Ranges satisfy `start <= end <= source.len()` and fall on char boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, range: Range<usize>) -> Self {
        debug_assert!(range.start <= range.end, "token range must be ordered");
        Self { kind, range }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.start >= self.range.end
    }

    /// The token's text within `source`.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }

    fn shifted(mut self, offset: usize) -> Self {
        self.range.start += offset;
        self.range.end += offset;
        self
    }
}

// ---------------------------------------------------------------------------
// Line state
// ---------------------------------------------------------------------------

/// Lexical state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineState {
    #[default]
    Normal,
    /// Inside a triple-quoted string opened with this quote.
    InTriple(Quote),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    Double,
    Single,
}

impl Quote {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'"' => Some(Self::Double),
            b'\'' => Some(Self::Single),
            _ => None,
        }
    }

    const fn byte(self) -> u8 {
        match self {
            Self::Double => b'"',
            Self::Single => b'\'',
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer trait
// ---------------------------------------------------------------------------

/// Line-oriented tokenizer.
///
/// Implementors tokenize one line given the state left by the previous line;
/// the provided [`Tokenizer::tokenize`] threads that state through a whole
/// buffer.
pub trait Tokenizer: Send + Sync {
    /// Language identifier, as used in `language-*` classes.
    fn name(&self) -> &'static str;

    /// File extensions handled (without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Tokenize a single line. Ranges are offsets within `line`.
    fn tokenize_line(&self, line: &str, state: LineState) -> (Vec<Token>, LineState);

    /// Tokenize a full buffer. Handles LF and CRLF line endings; line
    /// terminators are not covered by any token.
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut state = LineState::Normal;
        let mut offset = 0usize;

        for segment in text.split_inclusive('\n') {
            let line = segment.strip_suffix('\n').unwrap_or(segment);
            let line = line.strip_suffix('\r').unwrap_or(line);
            let (line_tokens, next) = self.tokenize_line(line, state);
            tokens.extend(line_tokens.into_iter().map(|t| t.shifted(offset)));
            offset += segment.len();
            state = next;
        }

        tokens
    }
}

// ---------------------------------------------------------------------------
// GenericTokenizer
// ---------------------------------------------------------------------------

/// Configuration for a [`GenericTokenizer`].
pub struct GenericTokenizerConfig {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub builtins: &'static [&'static str],
    pub literals: &'static [&'static str],
    /// Keywords whose following identifier is a definition of the given kind.
    pub definitions: &'static [(&'static str, TokenKind)],
    pub line_comment: &'static str,
    /// Characters that may prefix a string literal (e.g. `rb"..."`).
    pub string_prefixes: &'static str,
    pub triple_quotes: bool,
    pub decorators: bool,
}

/// A configurable tokenizer for scripting languages.
pub struct GenericTokenizer {
    config: GenericTokenizerConfig,
}

impl GenericTokenizer {
    #[must_use]
    pub const fn new(config: GenericTokenizerConfig) -> Self {
        Self { config }
    }

    fn classify_word(&self, word: &str) -> TokenKind {
        let config = &self.config;
        if config.keywords.contains(&word) {
            TokenKind::Keyword
        } else if config.literals.contains(&word) {
            TokenKind::Literal
        } else if config.builtins.contains(&word) {
            TokenKind::Builtin
        } else {
            TokenKind::Identifier
        }
    }

    fn definition_kind(&self, keyword: &str) -> Option<TokenKind> {
        self.config
            .definitions
            .iter()
            .find(|(kw, _)| *kw == keyword)
            .map(|(_, kind)| *kind)
    }

    fn is_string_prefix(&self, word: &str) -> bool {
        word.len() <= 2 && word.chars().all(|c| self.config.string_prefixes.contains(c))
    }

    fn opens_triple(&self, bytes: &[u8], pos: usize) -> bool {
        self.config.triple_quotes
            && bytes.len() >= pos + 3
            && bytes[pos + 1] == bytes[pos]
            && bytes[pos + 2] == bytes[pos]
    }

    /// Scan a string whose opening quote is at `quote_pos`.
    ///
    /// Returns the end offset and the state after the line.
    fn scan_string(&self, bytes: &[u8], quote_pos: usize) -> (usize, LineState) {
        let quote = bytes[quote_pos];
        if self.opens_triple(bytes, quote_pos) {
            return match find_triple_close(bytes, quote_pos + 3, quote) {
                Some(end) => (end, LineState::Normal),
                None => (
                    bytes.len(),
                    Quote::from_byte(quote).map_or(LineState::Normal, LineState::InTriple),
                ),
            };
        }
        let mut end = quote_pos + 1;
        while end < bytes.len() {
            if bytes[end] == b'\\' {
                end = (end + 2).min(bytes.len());
            } else if bytes[end] == quote {
                return (end + 1, LineState::Normal);
            } else {
                end += 1;
            }
        }
        // Single-quoted strings do not span lines.
        (bytes.len(), LineState::Normal)
    }

    /// Continue a triple-quoted string from the previous line.
    fn continue_triple(&self, line: &str, quote: Quote) -> (Vec<Token>, LineState) {
        match find_triple_close(line.as_bytes(), 0, quote.byte()) {
            Some(end) => {
                let mut tokens = vec![Token::new(TokenKind::String, 0..end)];
                let (rest, state) = self.tokenize_normal(&line[end..], end);
                tokens.extend(rest);
                (tokens, state)
            }
            None => (
                vec![Token::new(TokenKind::String, 0..line.len())],
                LineState::InTriple(quote),
            ),
        }
    }

    /// Tokenize a line in normal context.
    fn tokenize_normal(&self, line: &str, base: usize) -> (Vec<Token>, LineState) {
        let bytes = line.as_bytes();
        let mut tokens = Vec::new();
        let mut pending_definition: Option<TokenKind> = None;
        let mut pos = 0;

        while pos < bytes.len() {
            let ch = bytes[pos];

            if ch.is_ascii_whitespace() {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                tokens.push(Token::new(TokenKind::Whitespace, base + start..base + pos));
                continue;
            }

            if !self.config.line_comment.is_empty()
                && line[pos..].starts_with(self.config.line_comment)
            {
                tokens.push(Token::new(TokenKind::Comment, base + pos..base + bytes.len()));
                return (tokens, LineState::Normal);
            }

            if ch == b'"' || ch == b'\'' {
                let start = pos;
                let (end, state) = self.scan_string(bytes, pos);
                tokens.push(Token::new(TokenKind::String, base + start..base + end));
                if state != LineState::Normal {
                    return (tokens, state);
                }
                pos = end;
                continue;
            }

            if ch.is_ascii_digit()
                || (ch == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
            {
                let end = scan_number(bytes, pos);
                tokens.push(Token::new(TokenKind::Number, base + pos..base + end));
                pos = end;
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == b'_' {
                let start = pos;
                let end = scan_word(bytes, pos);
                let word = &line[start..end];

                if self.is_string_prefix(word)
                    && bytes.get(end).is_some_and(|&b| b == b'"' || b == b'\'')
                {
                    let (string_end, state) = self.scan_string(bytes, end);
                    tokens.push(Token::new(TokenKind::String, base + start..base + string_end));
                    if state != LineState::Normal {
                        return (tokens, state);
                    }
                    pos = string_end;
                    continue;
                }

                let mut kind = self.classify_word(word);
                if let Some(definition) = pending_definition.take()
                    && kind == TokenKind::Identifier
                {
                    kind = definition;
                }
                if kind == TokenKind::Keyword {
                    pending_definition = self.definition_kind(word);
                }
                tokens.push(Token::new(kind, base + start..base + end));
                pos = end;
                continue;
            }

            if self.config.decorators
                && ch == b'@'
                && bytes
                    .get(pos + 1)
                    .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_')
            {
                let start = pos;
                pos += 1;
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'_' | b'.'))
                {
                    pos += 1;
                }
                tokens.push(Token::new(TokenKind::Decorator, base + start..base + pos));
                continue;
            }

            if matches!(ch, b'(' | b')' | b'[' | b']' | b'{' | b'}') {
                tokens.push(Token::new(TokenKind::Delimiter, base + pos..base + pos + 1));
                pos += 1;
                continue;
            }

            if is_operator_byte(ch) {
                let start = pos;
                while pos < bytes.len() && is_operator_byte(bytes[pos]) {
                    pos += 1;
                }
                tokens.push(Token::new(TokenKind::Operator, base + start..base + pos));
                continue;
            }

            // Everything else, advancing by the full UTF-8 width.
            let width = line[pos..].chars().next().map_or(1, char::len_utf8);
            tokens.push(Token::new(
                TokenKind::Punctuation,
                base + pos..base + pos + width,
            ));
            pos += width;
        }

        (tokens, LineState::Normal)
    }
}

impl Tokenizer for GenericTokenizer {
    fn name(&self) -> &'static str {
        self.config.name
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.config.extensions
    }

    fn tokenize_line(&self, line: &str, state: LineState) -> (Vec<Token>, LineState) {
        match state {
            LineState::InTriple(quote) => self.continue_triple(line, quote),
            LineState::Normal => self.tokenize_normal(line, 0),
        }
    }
}

fn scan_word(bytes: &[u8], pos: usize) -> usize {
    let mut end = pos;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    end
}

fn scan_number(bytes: &[u8], pos: usize) -> usize {
    let mut end = pos;
    if bytes[end] == b'0'
        && bytes
            .get(end + 1)
            .is_some_and(|b| matches!(b | 0x20, b'x' | b'o' | b'b'))
    {
        end += 2;
        while end < bytes.len() && (bytes[end].is_ascii_hexdigit() || bytes[end] == b'_') {
            end += 1;
        }
        return end;
    }
    let digits = |mut i: usize| {
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
        i
    };
    end = digits(end);
    if end < bytes.len() && bytes[end] == b'.' {
        end = digits(end + 1);
    }
    if end < bytes.len() && (bytes[end] | 0x20) == b'e' {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            end = digits(exp);
        }
    }
    if end < bytes.len() && (bytes[end] | 0x20) == b'j' {
        end += 1;
    }
    end
}

/// Offset just past the closing triple quote, searching from `from`.
fn find_triple_close(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut pos = from;
    while pos < bytes.len() {
        if bytes[pos] == b'\\' {
            pos += 2;
        } else if bytes[pos] == quote
            && bytes.get(pos + 1) == Some(&quote)
            && bytes.get(pos + 2) == Some(&quote)
        {
            return Some(pos + 3);
        } else {
            pos += 1;
        }
    }
    None
}

fn is_operator_byte(b: u8) -> bool {
    matches!(
        b,
        b'+' | b'-' | b'*' | b'/' | b'%' | b'=' | b'!' | b'<' | b'>' | b'&' | b'|' | b'^' | b'~'
            | b'@'
    )
}
