//! Godwa - Marathi poetry reader
//!
//! Word-level annotation engine: line segmentation, per-session word
//! resolution, tooltip state machines and dual-script (Devanagari/IAST)
//! reading and authoring, plus a client for the Godwa backend.

// Script and token types come first, everything else builds on them
pub mod tokens;
pub mod i18n;
pub mod words;
pub mod transliterate;
pub mod cache;
pub mod presenter;
pub mod reader;
pub mod sync;
pub mod poems;
pub mod error;
pub mod config;
pub mod api;
pub mod state;

pub use api::ApiClient;
pub use cache::{ResolutionStatus, ResolverStats, Subscription, WordLookup, WordResolver};
pub use config::{get_data_dir, ClientConfig};
pub use error::GodwaError;
pub use presenter::{Disclosure, Presenter, PresenterEvent, PresenterState, GRACE_PERIOD};
pub use reader::{compose, Layout, LineLayout, Reader, Slot};
pub use state::AppState;
pub use sync::{Field, ScriptSync};
pub use tokens::{clean_key, segment, Script, Token, TokenKind};
pub use transliterate::{Iast, Transliterate};
pub use words::{Gender, WordEntry, WordIndex, WordMetadata};
