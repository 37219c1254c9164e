//! Token types and line segmentation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Script a body of poem text is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    #[default]
    Devanagari,
    /// Roman transliteration (IAST)
    Roman,
}

impl Script {
    pub fn other(self) -> Script {
        match self {
            Script::Devanagari => Script::Roman,
            Script::Roman => Script::Devanagari,
        }
    }

    /// Devanagari if `text` contains any Devanagari character, Roman otherwise.
    pub fn detect(text: &str) -> Script {
        if text.chars().any(is_devanagari) {
            Script::Devanagari
        } else {
            Script::Roman
        }
    }

    /// Whether `c` can continue a word token in this script.
    pub fn is_word_char(self, c: char) -> bool {
        match self {
            Script::Devanagari => {
                (is_devanagari(c) && !is_danda(c))
                    || c.is_ascii_alphanumeric()
                    || c == '_'
                    || is_joiner(c)
            }
            Script::Roman => c.is_alphanumeric() || is_combining_mark(c) || c == '_',
        }
    }

    /// Whether `c` survives key cleaning in this script.
    pub fn is_key_char(self, c: char) -> bool {
        match self {
            Script::Devanagari => is_devanagari(c),
            // Letters, numbers and marks, so macroned vowels keep their diacritics
            Script::Roman => c.is_alphanumeric() || is_combining_mark(c),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Script::Devanagari => f.write_str("devanagari"),
            Script::Roman => f.write_str("roman"),
        }
    }
}

impl FromStr for Script {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "devanagari" | "deva" | "marathi" => Ok(Script::Devanagari),
            "roman" | "iast" | "latin" => Ok(Script::Roman),
            other => Err(format!("unknown script '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Separator,
}

/// A contiguous span of one line of poem text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Exact original substring
    pub raw_text: String,
    pub kind: TokenKind,
    /// Script-normalized lookup key; `None` for separators and for words
    /// with no letters of the active script.
    pub clean_key: Option<String>,
}

impl Token {
    fn word(raw: &str, script: Script) -> Self {
        Self {
            raw_text: raw.to_string(),
            kind: TokenKind::Word,
            clean_key: clean_key(raw, script),
        }
    }

    fn separator(raw: &str) -> Self {
        Self {
            raw_text: raw.to_string(),
            kind: TokenKind::Separator,
            clean_key: None,
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Words with a usable key get a presenter; everything else is inert text.
    pub fn is_interactive(&self) -> bool {
        self.is_word() && self.clean_key.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Space,
    Punct,
}

fn classify(c: char, script: Script) -> CharClass {
    if script.is_word_char(c) {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punct
    }
}

/// Split one line into word and separator tokens.
///
/// Whitespace runs become a single separator, every other non-word character
/// is its own separator. Concatenating the `raw_text` of the result always
/// reproduces `line`.
pub fn segment(line: &str, script: Script) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let class = classify(c, script);
        let mut end = start + c.len_utf8();

        if class != CharClass::Punct {
            while let Some(&(idx, next)) = chars.peek() {
                if classify(next, script) != class {
                    break;
                }
                end = idx + next.len_utf8();
                chars.next();
            }
        }

        let raw = &line[start..end];
        tokens.push(match class {
            CharClass::Word => Token::word(raw, script),
            CharClass::Space | CharClass::Punct => Token::separator(raw),
        });
    }

    tokens
}

/// Strip everything outside the script's key characters.
///
/// Roman keys are NFC-normalized, so precomposed and decomposed diacritics
/// produce the same key.
pub fn clean_key(raw: &str, script: Script) -> Option<String> {
    let key: String = match script {
        Script::Devanagari => raw.chars().filter(|&c| script.is_key_char(c)).collect(),
        Script::Roman => raw.nfc().filter(|&c| script.is_key_char(c)).collect(),
    };
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Devanagari block U+0900..U+097F
fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn is_danda(c: char) -> bool {
    c == '\u{0964}' || c == '\u{0965}'
}

// ZWNJ / ZWJ, used for eyelash ra and half forms
fn is_joiner(c: char) -> bool {
    c == '\u{200C}' || c == '\u{200D}'
}
