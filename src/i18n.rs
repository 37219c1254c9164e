//! UI string lookup for the two interface languages

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Marathi,
    Roman,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Marathi => "marathi",
            Language::Roman => "roman",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "marathi" | "mr" => Ok(Language::Marathi),
            "roman" | "en" | "english" => Ok(Language::Roman),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    Loading,
    DefinitionNotFound,
    HeadingMarathi,
    HeadingEnglish,
    Synonyms,
    Antonyms,
    ReaderTitle,
    ShowRoman,
    ShowDevanagari,
    GenderMasculine,
    GenderFeminine,
    GenderNeuter,
    AutoSyncOn,
    AutoSyncOff,
}

pub fn t(language: Language, key: Text) -> &'static str {
    match language {
        Language::Marathi => match key {
            Text::Loading => "शोधत आहे...",
            Text::DefinitionNotFound => "अर्थ सापडला नाही",
            Text::HeadingMarathi => "मराठी",
            Text::HeadingEnglish => "ENGLISH",
            Text::Synonyms => "समानार्थी",
            Text::Antonyms => "विरुद्धार्थी",
            Text::ReaderTitle => "संवादात्मक वाचक",
            Text::ShowRoman => "रोमन लिपी",
            Text::ShowDevanagari => "देवनागरी",
            Text::GenderMasculine => "पुल्लिंग",
            Text::GenderFeminine => "स्त्रीलिंग",
            Text::GenderNeuter => "नपुंसकलिंग",
            Text::AutoSyncOn => "स्वयं-समक्रमण चालू",
            Text::AutoSyncOff => "स्वयं-समक्रमण बंद",
        },
        Language::Roman => match key {
            Text::Loading => "Looking up...",
            Text::DefinitionNotFound => "Definition Not Found",
            Text::HeadingMarathi => "मराठी",
            Text::HeadingEnglish => "ENGLISH",
            Text::Synonyms => "Synonyms",
            Text::Antonyms => "Antonyms",
            Text::ReaderTitle => "Interactive Reader",
            Text::ShowRoman => "Roman Script",
            Text::ShowDevanagari => "देवनागरी",
            Text::GenderMasculine => "masculine",
            Text::GenderFeminine => "feminine",
            Text::GenderNeuter => "neuter",
            Text::AutoSyncOn => "Auto-Sync ON",
            Text::AutoSyncOff => "Auto-Sync OFF",
        },
    }
}
