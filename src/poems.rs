//! Poem, poet and request payload types exchanged with the backend

use crate::words::{WordEntry, WordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub type PoemId = i64;
pub type PoetId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoemStatus {
    Draft,
    #[default]
    Pending,
    Approved,
}

impl PoemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PoemStatus::Draft => "draft",
            PoemStatus::Pending => "pending",
            PoemStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for PoemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(PoemStatus::Draft),
            "pending" => Ok(PoemStatus::Pending),
            "approved" => Ok(PoemStatus::Approved),
            other => Err(format!("unknown poem status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poet {
    pub id: PoetId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_roman: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_span: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poem_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poem {
    pub id: PoemId,
    pub title: String,
    #[serde(default)]
    pub title_roman: Option<String>,
    pub body_marathi: String,
    #[serde(default)]
    pub body_roman: Option<String>,
    #[serde(default)]
    pub poet_id: Option<PoetId>,
    #[serde(default)]
    pub poet: Option<Poet>,
    #[serde(default)]
    pub book_id: Option<i64>,
    #[serde(default)]
    pub chhanda_id: Option<i64>,
    #[serde(default)]
    pub chhanda_name: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PoemStatus,
    #[serde(default)]
    pub words: Vec<WordEntry>,
}

impl Poem {
    /// Roman body, if present and not blank.
    pub fn roman_body(&self) -> Option<&str> {
        self.body_roman
            .as_deref()
            .filter(|body| !body.trim().is_empty())
    }

    pub fn poet_name(&self) -> Option<&str> {
        self.poet.as_ref().map(|p| p.name.as_str())
    }
}

/// `POST /api/poems/submit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoemSubmission {
    pub title: String,
    pub body_marathi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_roman: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_roman: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poet_id: Option<PoetId>,
}

/// `PATCH /api/admin/poems/{id}`, only the fields being changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_roman: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_marathi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_roman: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poet_id: Option<PoetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chhanda_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chhanda_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_slug: Option<String>,
}

impl PoemUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PoemUpdate::default()
    }
}

/// `PATCH /api/admin/words/{id}`. Uses the field names the admin endpoint expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devnagri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inscript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_mr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of the bulk word endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordIds<'a> {
    pub word_ids: &'a [WordId],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

/// Display label for chhanda and genre list items, which arrive either as
/// bare strings or as objects with a `name`.
pub fn reference_label(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
