//! Devanagari <-> IAST transliteration
//!
//! The reader and the authoring sync only depend on the [`Transliterate`]
//! trait; [`Iast`] is the scheme shipped with the crate.

use crate::tokens::Script;
use unicode_normalization::UnicodeNormalization;

const VIRAMA: char = '\u{094D}';
const NUKTA: char = '\u{093C}';

pub trait Transliterate {
    fn transliterate(&self, text: &str, from: Script, to: Script) -> String;
}

impl<F> Transliterate for F
where
    F: Fn(&str, Script, Script) -> String,
{
    fn transliterate(&self, text: &str, from: Script, to: Script) -> String {
        self(text, from, to)
    }
}

/// Sanskrit-style IAST scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iast;

impl Transliterate for Iast {
    fn transliterate(&self, text: &str, from: Script, to: Script) -> String {
        match (from, to) {
            (Script::Devanagari, Script::Roman) => devanagari_to_iast(text),
            (Script::Roman, Script::Devanagari) => iast_to_devanagari(text),
            _ => text.to_string(),
        }
    }
}

fn consonant_to_iast(c: char) -> Option<&'static str> {
    Some(match c {
        'क' => "k", 'ख' => "kh", 'ग' => "g", 'घ' => "gh", 'ङ' => "ṅ",
        'च' => "c", 'छ' => "ch", 'ज' => "j", 'झ' => "jh", 'ञ' => "ñ",
        'ट' => "ṭ", 'ठ' => "ṭh", 'ड' => "ḍ", 'ढ' => "ḍh", 'ण' => "ṇ",
        'त' => "t", 'थ' => "th", 'द' => "d", 'ध' => "dh", 'न' => "n",
        'प' => "p", 'फ' => "ph", 'ब' => "b", 'भ' => "bh", 'म' => "m",
        'य' => "y", 'र' => "r", 'ल' => "l", 'व' => "v",
        'श' => "ś", 'ष' => "ṣ", 'स' => "s", 'ह' => "h", 'ळ' => "ḷ",
        _ => return None,
    })
}

fn vowel_to_iast(c: char) -> Option<&'static str> {
    Some(match c {
        'अ' => "a", 'आ' => "ā", 'इ' => "i", 'ई' => "ī", 'उ' => "u", 'ऊ' => "ū",
        'ऋ' => "ṛ", 'ॠ' => "ṝ", 'ऌ' => "l̥", 'ए' => "e", 'ऐ' => "ai",
        'ओ' => "o", 'औ' => "au",
        _ => return None,
    })
}

fn vowel_sign_to_iast(c: char) -> Option<&'static str> {
    Some(match c {
        'ा' => "ā", 'ि' => "i", 'ी' => "ī", 'ु' => "u", 'ू' => "ū",
        'ृ' => "ṛ", 'ॄ' => "ṝ", 'े' => "e", 'ै' => "ai", 'ो' => "o", 'ौ' => "au",
        _ => return None,
    })
}

fn other_to_iast(c: char) -> Option<&'static str> {
    Some(match c {
        'ं' => "ṃ", 'ः' => "ḥ", 'ँ' => "m̐", 'ऽ' => "'", '।' => ".", '॥' => "..",
        'ॐ' => "oṃ",
        '०' => "0", '१' => "1", '२' => "2", '३' => "3", '४' => "4",
        '५' => "5", '६' => "6", '७' => "7", '८' => "8", '९' => "9",
        _ => return None,
    })
}

fn devanagari_to_iast(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(cons) = consonant_to_iast(c) {
            out.push_str(cons);
            if chars.peek() == Some(&NUKTA) {
                chars.next();
            }
            match chars.peek().copied() {
                Some(VIRAMA) => {
                    chars.next();
                }
                Some(next) => match vowel_sign_to_iast(next) {
                    Some(sign) => {
                        out.push_str(sign);
                        chars.next();
                    }
                    None => out.push('a'),
                },
                None => out.push('a'),
            }
        } else if let Some(s) = vowel_to_iast(c).or_else(|| other_to_iast(c)) {
            out.push_str(s);
        } else if c != NUKTA && c != VIRAMA && vowel_sign_to_iast(c).is_none() {
            out.push(c);
        }
    }

    out
}

// Longest tokens first so aspirates and diphthongs win over their prefixes.
const IAST_CONSONANTS: &[(&str, char)] = &[
    ("kh", 'ख'), ("gh", 'घ'), ("ch", 'छ'), ("jh", 'झ'), ("ṭh", 'ठ'),
    ("ḍh", 'ढ'), ("th", 'थ'), ("dh", 'ध'), ("ph", 'फ'), ("bh", 'भ'),
    ("k", 'क'), ("g", 'ग'), ("ṅ", 'ङ'), ("c", 'च'), ("j", 'ज'), ("ñ", 'ञ'),
    ("ṭ", 'ट'), ("ḍ", 'ड'), ("ṇ", 'ण'), ("t", 'त'), ("d", 'द'), ("n", 'न'),
    ("p", 'प'), ("b", 'ब'), ("m", 'म'), ("y", 'य'), ("r", 'र'), ("l", 'ल'),
    ("v", 'व'), ("ś", 'श'), ("ṣ", 'ष'), ("s", 'स'), ("h", 'ह'), ("ḷ", 'ळ'),
];

// (iast, independent vowel, vowel sign after a consonant)
const IAST_VOWELS: &[(&str, char, Option<char>)] = &[
    ("ai", 'ऐ', Some('ै')), ("au", 'औ', Some('ौ')),
    ("ā", 'आ', Some('ा')), ("ī", 'ई', Some('ी')), ("ū", 'ऊ', Some('ू')),
    ("ṝ", 'ॠ', Some('ॄ')), ("ṛ", 'ऋ', Some('ृ')),
    ("a", 'अ', None), ("i", 'इ', Some('ि')), ("u", 'उ', Some('ु')),
    ("e", 'ए', Some('े')), ("o", 'ओ', Some('ो')),
];

const IAST_MARKS: &[(&str, &str)] = &[
    ("m̐", "ँ"), ("ṃ", "ं"), ("ṁ", "ं"), ("ḥ", "ः"), ("..", "॥"), (".", "।"), ("'", "ऽ"),
];

fn iast_to_devanagari(text: &str) -> String {
    let input: String = text.to_lowercase().nfc().collect();
    let mut out = String::with_capacity(input.len() * 2);
    let mut rest = input.as_str();
    let mut after_consonant = false;

    while !rest.is_empty() {
        // marks first: "m̐" would otherwise be read as the consonant m
        if let Some((iast, dev)) = IAST_MARKS.iter().find(|(i, _)| rest.starts_with(i)) {
            if after_consonant {
                out.push(VIRAMA);
                after_consonant = false;
            }
            out.push_str(dev);
            rest = &rest[iast.len()..];
            continue;
        }

        if let Some((iast, dev)) = IAST_CONSONANTS.iter().find(|(i, _)| rest.starts_with(i)) {
            if after_consonant {
                out.push(VIRAMA);
            }
            out.push(*dev);
            after_consonant = true;
            rest = &rest[iast.len()..];
            continue;
        }

        if let Some((iast, independent, sign)) =
            IAST_VOWELS.iter().find(|(i, _, _)| rest.starts_with(i))
        {
            if after_consonant {
                // inherent 'a' needs no sign
                match sign {
                    Some(sign) => out.push(*sign),
                    None if *iast == "a" => {}
                    None => {
                        out.push(VIRAMA);
                        out.push(*independent);
                    }
                }
            } else {
                out.push(*independent);
            }
            after_consonant = false;
            rest = &rest[iast.len()..];
            continue;
        }

        if after_consonant {
            out.push(VIRAMA);
            after_consonant = false;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(ascii_digit_to_devanagari(c).unwrap_or(c));
        }
        rest = chars.as_str();
    }

    if after_consonant {
        out.push(VIRAMA);
    }

    out
}

fn ascii_digit_to_devanagari(c: char) -> Option<char> {
    c.to_digit(10)
        .filter(|_| c.is_ascii_digit())
        .and_then(|d| char::from_u32('०' as u32 + d))
}
