#![forbid(unsafe_code)]

//! Python configuration for the generic tokenizer.

use crate::tokenizer::{GenericTokenizer, GenericTokenizerConfig, TokenKind};

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

const LITERALS: &[&str] = &["True", "False", "None", "Ellipsis", "NotImplemented", "__debug__"];

const BUILTINS: &[&str] = &[
    "abs", "all", "any", "bin", "bool", "bytes", "callable", "chr", "dict", "divmod",
    "enumerate", "filter", "float", "format", "frozenset", "getattr", "hasattr", "hash", "hex",
    "id", "input", "int", "isinstance", "issubclass", "iter", "len", "list", "map", "max", "min",
    "next", "object", "oct", "open", "ord", "pow", "print", "range", "repr", "reversed", "round",
    "set", "setattr", "slice", "sorted", "str", "sum", "super", "tuple", "type", "zip",
];

/// Create a generic tokenizer configured for Python.
#[must_use]
pub fn python_tokenizer() -> GenericTokenizer {
    GenericTokenizer::new(GenericTokenizerConfig {
        name: "python",
        extensions: &["py", "pyi"],
        keywords: KEYWORDS,
        builtins: BUILTINS,
        literals: LITERALS,
        definitions: &[("def", TokenKind::FunctionName), ("class", TokenKind::ClassName)],
        line_comment: "#",
        string_prefixes: "rRbBfFuU",
        triple_quotes: true,
        decorators: true,
    })
}
