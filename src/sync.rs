//! Dual-script authoring fields kept in step by transliteration

use crate::tokens::Script;
use crate::transliterate::Transliterate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Devanagari,
    Roman,
}

impl Field {
    pub fn script(self) -> Script {
        match self {
            Field::Devanagari => Script::Devanagari,
            Field::Roman => Script::Roman,
        }
    }

    pub fn other(self) -> Field {
        match self {
            Field::Devanagari => Field::Roman,
            Field::Roman => Field::Devanagari,
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Script::from_str(s).map(|script| match script {
            Script::Devanagari => Field::Devanagari,
            Script::Roman => Field::Roman,
        })
    }
}

/// A Devanagari field and its Roman counterpart.
///
/// With auto-sync on, every edit overwrites the other field with the
/// transliteration of the new value. With it off the fields are independent.
/// Turning auto-sync on never reconciles fields that already diverged.
pub struct ScriptSync<T: Transliterate> {
    devanagari: String,
    roman: String,
    auto_sync: bool,
    translit: T,
}

impl<T: Transliterate> ScriptSync<T> {
    /// Starts with auto-sync off.
    pub fn new(devanagari: impl Into<String>, roman: impl Into<String>, translit: T) -> Self {
        Self {
            devanagari: devanagari.into(),
            roman: roman.into(),
            auto_sync: false,
            translit,
        }
    }

    pub fn devanagari(&self) -> &str {
        &self.devanagari
    }

    pub fn roman(&self) -> &str {
        &self.roman
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Devanagari => &self.devanagari,
            Field::Roman => &self.roman,
        }
    }

    pub fn auto_sync(&self) -> bool {
        self.auto_sync
    }

    pub fn set_auto_sync(&mut self, enabled: bool) {
        self.auto_sync = enabled;
    }

    pub fn toggle_auto_sync(&mut self) -> bool {
        self.auto_sync = !self.auto_sync;
        self.auto_sync
    }

    /// Replace `field` with `value`. Returns whether the other field was rewritten.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.auto_sync {
            let other = self.translit.transliterate(
                &value,
                field.script(),
                field.other().script(),
            );
            *self.slot(field.other()) = other;
        }
        *self.slot(field) = value;
        self.auto_sync
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Devanagari => &mut self.devanagari,
            Field::Roman => &mut self.roman,
        }
    }

    pub fn into_parts(self) -> (String, String) {
        (self.devanagari, self.roman)
    }
}
