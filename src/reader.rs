//! Poem reader: line layout, script toggle and cross-script glossing

use crate::cache::{WordLookup, WordResolver};
use crate::poems::Poem;
use crate::presenter::{Disclosure, Presenter};
use crate::tokens::{clean_key, segment, Script, Token};
use crate::transliterate::Transliterate;
use crate::words::{WordEntry, WordIndex};
use std::sync::Arc;
use std::time::Duration;

const VIRAMA: char = '\u{094D}';

/// One rendered token: inert text or an interactive word.
#[derive(Debug)]
pub enum Slot {
    Text(Token),
    Word(Presenter),
}

impl Slot {
    pub fn token(&self) -> &Token {
        match self {
            Slot::Text(token) => token,
            Slot::Word(presenter) => presenter.token(),
        }
    }

    pub fn presenter(&self) -> Option<&Presenter> {
        match self {
            Slot::Word(presenter) => Some(presenter),
            Slot::Text(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct LineLayout {
    pub slots: Vec<Slot>,
    /// The displayed script has no text for this line.
    pub omitted: bool,
}

impl LineLayout {
    pub fn text(&self) -> String {
        self.slots.iter().map(|s| s.token().raw_text.as_str()).collect()
    }
}

#[derive(Debug)]
pub struct Layout {
    pub mode: Script,
    /// Only offered when the poem has a Roman body.
    pub toggle_available: bool,
    pub lines: Vec<LineLayout>,
}

impl Layout {
    pub fn slot(&self, line: usize, slot: usize) -> Option<&Slot> {
        self.lines.get(line)?.slots.get(slot)
    }

    pub fn presenter_mut(&mut self, line: usize, slot: usize) -> Option<&mut Presenter> {
        match self.lines.get_mut(line)?.slots.get_mut(slot)? {
            Slot::Word(presenter) => Some(presenter),
            Slot::Text(_) => None,
        }
    }

    /// Position of the first interactive word whose key or text matches `word`.
    pub fn find_word(&self, word: &str) -> Option<(usize, usize)> {
        let word = word.trim();
        self.lines.iter().enumerate().find_map(|(line_idx, line)| {
            line.slots.iter().position(|slot| {
                slot.presenter().is_some_and(|p| {
                    let token = p.token();
                    token.raw_text == word || token.clean_key.as_deref() == Some(word)
                })
            })
            .map(|slot_idx| (line_idx, slot_idx))
        })
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Lay out a poem in the requested script.
///
/// `poem_text` is the Devanagari body and drives the line count; Roman lines
/// are matched by position. Asking for Roman without a Roman body falls back
/// to Devanagari.
pub fn compose<T: Transliterate>(
    poem_text: &str,
    alt_text: Option<&str>,
    index: &WordIndex,
    mode: Script,
    translit: &T,
    grace: Duration,
) -> Layout {
    let toggle_available = alt_text.is_some();
    let mode = if toggle_available { mode } else { Script::Devanagari };
    let primary = split_lines(poem_text);
    let alternate = alt_text.map(split_lines).unwrap_or_default();

    let lines = primary
        .iter()
        .enumerate()
        .map(|(idx, primary_line)| {
            let line = match mode {
                Script::Devanagari => Some(*primary_line),
                Script::Roman => alternate.get(idx).copied(),
            };
            match line {
                Some(line) => LineLayout {
                    slots: segment(line, mode)
                        .into_iter()
                        .map(|token| slot_for(token, mode, index, translit, grace))
                        .collect(),
                    omitted: false,
                },
                None => LineLayout {
                    slots: Vec::new(),
                    omitted: true,
                },
            }
        })
        .collect();

    Layout {
        mode,
        toggle_available,
        lines,
    }
}

/// Devanagari key for a Roman word, used for index fallback and remote lookups.
///
/// Roman text drops the final inherent vowel ("pāūs" for पाऊस), so a
/// word-final virama from transliteration is removed.
pub fn roman_lookup_key<T: Transliterate>(translit: &T, roman: &str) -> Option<String> {
    let devanagari = translit.transliterate(&roman.to_lowercase(), Script::Roman, Script::Devanagari);
    let key = clean_key(&devanagari, Script::Devanagari)?;
    match key.strip_suffix(VIRAMA) {
        Some(stem) if !stem.is_empty() => Some(stem.to_string()),
        _ => Some(key),
    }
}

fn slot_for<T: Transliterate>(
    token: Token,
    mode: Script,
    index: &WordIndex,
    translit: &T,
    grace: Duration,
) -> Slot {
    let key = match token.clean_key.clone() {
        Some(key) if token.is_word() => key,
        _ => return Slot::Text(token),
    };

    let (lookup_key, preloaded) = match mode {
        Script::Devanagari => (key.clone(), index.find_devanagari(&key).cloned()),
        Script::Roman => {
            let devanagari_key = roman_lookup_key(translit, &key);
            let preloaded = index
                .find_alternate(&key)
                .or_else(|| index.find_devanagari(&key))
                .or_else(|| {
                    devanagari_key
                        .as_deref()
                        .and_then(|k| index.find_devanagari(k))
                })
                .cloned();
            (devanagari_key.unwrap_or(key), preloaded)
        }
    };

    match Presenter::new(token.clone(), Some(lookup_key), preloaded, grace) {
        Some(presenter) => Slot::Word(presenter),
        None => Slot::Text(token),
    }
}

/// A mounted poem view.
///
/// Owns the poem's word index and a fresh [`WordResolver`]; the cache lives
/// exactly as long as the reader. Switching script rebuilds the layout (and
/// its presenters) but keeps the cache.
pub struct Reader<L: WordLookup, T: Transliterate> {
    body: String,
    alternate: Option<String>,
    index: WordIndex,
    resolver: WordResolver<L>,
    translit: T,
    grace: Duration,
    layout: Layout,
}

impl<L: WordLookup, T: Transliterate> Reader<L, T> {
    pub fn new(poem: &Poem, lookup: Arc<L>, translit: T, grace: Duration) -> Self {
        Self::from_parts(
            poem.body_marathi.clone(),
            poem.roman_body().map(str::to_string),
            poem.words.clone(),
            lookup,
            translit,
            grace,
        )
    }

    pub fn from_parts(
        body: String,
        alternate: Option<String>,
        words: Vec<WordEntry>,
        lookup: Arc<L>,
        translit: T,
        grace: Duration,
    ) -> Self {
        let index = WordIndex::new(words);
        let layout = compose(
            &body,
            alternate.as_deref(),
            &index,
            Script::Devanagari,
            &translit,
            grace,
        );
        Self {
            body,
            alternate,
            index,
            resolver: WordResolver::new(lookup),
            translit,
            grace,
            layout,
        }
    }

    pub fn mode(&self) -> Script {
        self.layout.mode
    }

    pub fn toggle_available(&self) -> bool {
        self.layout.toggle_available
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn index(&self) -> &WordIndex {
        &self.index
    }

    pub fn resolver(&self) -> &WordResolver<L> {
        &self.resolver
    }

    pub fn set_mode(&mut self, mode: Script) {
        if mode == self.layout.mode {
            return;
        }
        self.layout = compose(
            &self.body,
            self.alternate.as_deref(),
            &self.index,
            mode,
            &self.translit,
            self.grace,
        );
    }

    pub fn toggle_script(&mut self) -> Script {
        self.set_mode(self.layout.mode.other());
        self.layout.mode
    }

    /// Click on the token at `(line, slot)`. `None` for inert tokens.
    pub fn activate(&mut self, line: usize, slot: usize) -> Option<&Disclosure> {
        let presenter = self.layout.presenter_mut(line, slot)?;
        Some(presenter.activate(&self.resolver))
    }

    /// Wait for the presenter at `(line, slot)` to stop loading.
    pub async fn settle(&mut self, line: usize, slot: usize) -> Option<&Disclosure> {
        let presenter = self.layout.presenter_mut(line, slot)?;
        Some(presenter.settle().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::{word, FakeLookup};
    use crate::presenter::GRACE_PERIOD;
    use crate::transliterate::Iast;

    const BODY: &str = "राम गेला.\nमन रमे";
    const ROMAN: &str = "Rāma gelā.\nmana rame";

    fn rama() -> WordEntry {
        let mut entry = word(1, "राम", "भगवान राम");
        entry.alternate_script = Some("rāma".into());
        entry
    }

    #[test]
    fn test_compose_devanagari() {
        let index = WordIndex::new(vec![rama()]);
        let layout = compose(BODY, None, &index, Script::Devanagari, &Iast, GRACE_PERIOD);

        assert!(!layout.toggle_available);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].text(), "राम गेला.");
        assert_eq!(layout.lines[0].slots.len(), 4);
        assert!(matches!(layout.lines[0].slots[1], Slot::Text(_)));
        assert!(matches!(layout.lines[0].slots[3], Slot::Text(_)));

        let rama_presenter = layout.lines[0].slots[0].presenter().unwrap();
        assert_eq!(rama_presenter.preloaded().map(|e| e.id), Some(1));
        let gela = layout.lines[0].slots[2].presenter().unwrap();
        assert!(gela.preloaded().is_none());
        assert_eq!(gela.lookup_key(), "गेला");
    }

    #[test]
    fn test_roman_requested_without_roman_body() {
        let index = WordIndex::default();
        let layout = compose(BODY, None, &index, Script::Roman, &Iast, GRACE_PERIOD);
        assert_eq!(layout.mode, Script::Devanagari);
        assert_eq!(layout.lines[1].text(), "मन रमे");
    }

    #[test]
    fn test_roman_cross_reference() {
        let index = WordIndex::new(vec![rama()]);
        let layout = compose(BODY, Some(ROMAN), &index, Script::Roman, &Iast, GRACE_PERIOD);

        assert!(layout.toggle_available);
        assert_eq!(layout.mode, Script::Roman);
        assert_eq!(layout.lines[0].text(), "Rāma gelā.");

        // capitalised Roman token still finds the entry through its alternate form
        let rama_presenter = layout.lines[0].slots[0].presenter().unwrap();
        assert_eq!(rama_presenter.preloaded().map(|e| e.id), Some(1));

        // unknown Roman word resolves remotely under its Devanagari form
        let gela = layout.lines[0].slots[2].presenter().unwrap();
        assert!(gela.preloaded().is_none());
        assert_eq!(gela.lookup_key(), "गेला");

        let unknown = compose("x", Some("Gelā"), &WordIndex::default(), Script::Roman, &Iast, GRACE_PERIOD);
        assert_eq!(unknown.lines[0].slots[0].presenter().unwrap().lookup_key(), "गेला");
    }

    #[test]
    fn test_roman_via_transliterated_devanagari() {
        let index = WordIndex::new(vec![word(2, "मन", "चित्त")]);
        let layout = compose(BODY, Some(ROMAN), &index, Script::Roman, &Iast, GRACE_PERIOD);
        let mana = layout.lines[1].slots[0].presenter().unwrap();
        assert_eq!(mana.preloaded().map(|e| e.id), Some(2));
    }

    #[test]
    fn test_decomposed_roman_body_matches_alternate() {
        let mut paus = word(9, "पाऊस", "वर्षा");
        paus.alternate_script = Some("pāūs".into());
        let index = WordIndex::new(vec![paus]);

        for roman in ["pāūs", "pa\u{0304}u\u{0304}s"] {
            let layout = compose("पाऊस", Some(roman), &index, Script::Roman, &Iast, GRACE_PERIOD);
            let presenter = layout.lines[0].slots[0].presenter().unwrap();
            assert_eq!(presenter.preloaded().map(|e| e.id), Some(9));
            assert_eq!(presenter.lookup_key(), "पाऊस");
        }
    }

    #[test]
    fn test_roman_lookup_key_drops_final_virama() {
        assert_eq!(roman_lookup_key(&Iast, "pāūs").as_deref(), Some("पाऊस"));
        assert_eq!(roman_lookup_key(&Iast, "Rāma").as_deref(), Some("राम"));
        assert_eq!(roman_lookup_key(&Iast, "-").as_deref(), None);
    }

    #[test]
    fn test_missing_roman_lines_are_omitted() {
        let index = WordIndex::default();
        let layout = compose(BODY, Some("Rāma gelā."), &index, Script::Roman, &Iast, GRACE_PERIOD);
        assert_eq!(layout.lines.len(), 2);
        assert!(!layout.lines[0].omitted);
        assert!(layout.lines[1].omitted);
        assert!(layout.lines[1].slots.is_empty());
    }

    #[test]
    fn test_find_word() {
        let index = WordIndex::default();
        let layout = compose(BODY, None, &index, Script::Devanagari, &Iast, GRACE_PERIOD);
        assert_eq!(layout.find_word("रमे"), Some((1, 2)));
        assert_eq!(layout.find_word("."), None);
        assert_eq!(layout.find_word("कमळ"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reader_preloaded_word_needs_no_request() {
        let lookup = FakeLookup::new(100, vec![]);
        let mut reader = Reader::from_parts(
            BODY.to_string(),
            None,
            vec![rama()],
            lookup.clone(),
            Iast,
            GRACE_PERIOD,
        );

        assert_eq!(reader.activate(0, 0), Some(&Disclosure::Found(rama())));
        assert_eq!(reader.activate(0, 1), None);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_keeps_cache() {
        let lookup = FakeLookup::new(200, vec![word(3, "गेला", "निघून गेला")]);
        let mut reader = Reader::from_parts(
            BODY.to_string(),
            Some(ROMAN.to_string()),
            vec![],
            lookup.clone(),
            Iast,
            GRACE_PERIOD,
        );

        assert_eq!(reader.activate(0, 2), Some(&Disclosure::Loading));
        assert!(matches!(reader.settle(0, 2).await, Some(Disclosure::Found(_))));

        assert_eq!(reader.toggle_script(), Script::Roman);
        // fresh presenters after the toggle
        assert!(!reader.layout().lines[0].slots[2].presenter().unwrap().state().is_open);
        assert!(matches!(reader.activate(0, 2), Some(Disclosure::Found(_))));

        assert_eq!(reader.toggle_script(), Script::Devanagari);
        assert!(matches!(reader.activate(0, 2), Some(Disclosure::Found(_))));
        assert_eq!(lookup.calls(), 1);
    }
}
