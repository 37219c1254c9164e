//! CLI command handlers

use anyhow::{anyhow, bail, Context, Result};
use godwa_lib::api::ApiClient;
use godwa_lib::cache::{ResolutionStatus, WordResolver};
use godwa_lib::i18n::{t, Language, Text};
use godwa_lib::poems::{reference_label, Poem, PoemId, PoemStatus, PoemSubmission, PoemUpdate, PoetId, WordUpdate};
use godwa_lib::presenter::Disclosure;
use godwa_lib::reader::{roman_lookup_key, Reader, Slot};
use godwa_lib::state::AppState;
use godwa_lib::sync::{Field, ScriptSync};
use godwa_lib::tokens::{clean_key, Script};
use godwa_lib::transliterate::{Iast, Transliterate};
use godwa_lib::words::{WordEntry, WordId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Everything a command needs: state, UI language and output format.
pub struct Session {
    pub state: AppState,
    pub language: Language,
    pub json: bool,
}

impl Session {
    fn api(&self) -> ApiClient {
        self.state.api()
    }

    fn require_login(&self) -> Result<ApiClient> {
        let api = self.api();
        if !api.is_authenticated() {
            bail!("Not logged in. Run `godwa login <id-token>` first.");
        }
        Ok(api)
    }

    fn text(&self, key: Text) -> &'static str {
        t(self.language, key)
    }

    fn reader(&self, poem: &Poem) -> Reader<ApiClient, Iast> {
        Reader::new(
            poem,
            Arc::new(self.api()),
            Iast,
            self.state.config.grace_period,
        )
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Tooltip body for one disclosure state.
pub fn render_disclosure(disclosure: &Disclosure, language: Language) -> Vec<String> {
    match disclosure {
        Disclosure::Closed => Vec::new(),
        Disclosure::Loading => vec![t(language, Text::Loading).to_string()],
        Disclosure::NotFound => vec![t(language, Text::DefinitionNotFound).to_string()],
        Disclosure::Found(entry) => render_entry(entry, language),
    }
}

pub fn render_entry(entry: &WordEntry, language: Language) -> Vec<String> {
    let mut lines = Vec::new();

    let mut heading = entry.devnagri.clone();
    if let Some(alt) = &entry.alternate_script {
        heading.push_str(&format!(" ({})", alt));
    }
    if let Some(gender) = entry.gender {
        heading.push_str(&format!("  [{}]", gender.label(language)));
    }
    lines.push(heading);

    if let Some(pronunciation) = &entry.pronunciation {
        lines.push(format!("/{}/", pronunciation));
    }
    if let Some(def) = &entry.definition_primary {
        lines.push(format!("{}: {}", t(language, Text::HeadingMarathi), def));
    }
    if let Some(def) = &entry.definition_secondary {
        lines.push(format!("{}: {}", t(language, Text::HeadingEnglish), def));
    }
    if !entry.has_definition() {
        lines.push(t(language, Text::DefinitionNotFound).to_string());
    }
    if let Some(meta) = &entry.metadata {
        if !meta.synonyms.is_empty() {
            lines.push(format!("{}: {}", t(language, Text::Synonyms), meta.synonyms.join(", ")));
        }
        if !meta.antonyms.is_empty() {
            lines.push(format!("{}: {}", t(language, Text::Antonyms), meta.antonyms.join(", ")));
        }
    }
    lines
}

fn script_label(language: Language, mode: Script) -> &'static str {
    match mode {
        Script::Devanagari => t(language, Text::ShowDevanagari),
        Script::Roman => t(language, Text::ShowRoman),
    }
}

pub async fn read(session: &Session, id: PoemId, roman: bool, glosses: bool) -> Result<()> {
    let poem = session.api().get_poem(id).await?;
    let mut reader = session.reader(&poem);

    if roman {
        if !reader.toggle_available() {
            tracing::warn!(poem = id, "poem has no Roman text, showing Devanagari");
        }
        reader.set_mode(Script::Roman);
    }

    let title = match reader.mode() {
        Script::Roman => poem.title_roman.as_deref().unwrap_or(poem.title.as_str()),
        Script::Devanagari => poem.title.as_str(),
    };
    println!("{}", title);
    if let Some(poet) = poem.poet_name() {
        println!("{}", poet);
    }
    println!(
        "[{} | {}]",
        session.text(Text::ReaderTitle),
        script_label(session.language, reader.mode())
    );
    println!();

    if glosses {
        // open everything first so lookups run concurrently
        let positions: Vec<(usize, usize)> = reader
            .layout()
            .lines
            .iter()
            .enumerate()
            .flat_map(|(li, line)| {
                line.slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.presenter().is_some())
                    .map(move |(si, _)| (li, si))
            })
            .collect();
        for &(line, slot) in &positions {
            reader.activate(line, slot);
        }
        for &(line, slot) in &positions {
            reader.settle(line, slot).await;
        }
    }

    for line in &reader.layout().lines {
        println!("{}", line.text());
        if !glosses {
            continue;
        }
        for slot in &line.slots {
            if let Slot::Word(presenter) = slot {
                let summary = match presenter.disclosure() {
                    Disclosure::Found(entry) => entry
                        .definition_primary
                        .as_deref()
                        .or(entry.definition_secondary.as_deref())
                        .unwrap_or_else(|| session.text(Text::DefinitionNotFound))
                        .to_string(),
                    other => render_disclosure(other, session.language).join(" "),
                };
                println!("    {}: {}", presenter.token().raw_text, summary);
            }
        }
    }

    let stats = reader.resolver().stats();
    tracing::debug!(requests = stats.requests_issued, entries = stats.entries, "read finished");
    Ok(())
}

pub async fn gloss(session: &Session, id: PoemId, word: &str, roman: bool) -> Result<()> {
    let poem = session.api().get_poem(id).await?;
    let mut reader = session.reader(&poem);
    if roman {
        reader.set_mode(Script::Roman);
    }

    let (line, slot) = reader
        .layout()
        .find_word(word)
        .ok_or_else(|| anyhow!("'{}' does not appear in poem {}", word, id))?;

    if let Some(Disclosure::Loading) = reader.activate(line, slot) {
        eprintln!("{}", session.text(Text::Loading));
    }
    let disclosure = reader
        .settle(line, slot)
        .await
        .cloned()
        .unwrap_or(Disclosure::NotFound);

    if session.json {
        let entry = match &disclosure {
            Disclosure::Found(entry) => Some(entry),
            _ => None,
        };
        return print_json(&entry);
    }
    for text in render_disclosure(&disclosure, session.language) {
        println!("{}", text);
    }
    Ok(())
}

/// Resolve each word through one resolver; repeated words share a request.
pub async fn lookup(session: &Session, words: &[String], stats: bool) -> Result<()> {
    let resolver = WordResolver::new(Arc::new(session.api()));

    let mut pending = Vec::new();
    for word in words {
        let script = Script::detect(word);
        let key = match script {
            Script::Devanagari => clean_key(word, script),
            Script::Roman => roman_lookup_key(&Iast, word),
        };
        let subscription = key.as_deref().and_then(|k| resolver.resolve(k, None));
        pending.push((word, subscription));
    }

    let mut found = Vec::new();
    for (word, subscription) in pending {
        let disclosure = match subscription {
            Some(mut subscription) => match subscription.settled().await {
                ResolutionStatus::Found(entry) => Disclosure::Found(entry),
                _ => Disclosure::NotFound,
            },
            None => Disclosure::NotFound,
        };

        if session.json {
            if let Disclosure::Found(entry) = disclosure {
                found.push(entry);
            }
            continue;
        }
        println!("{}", word);
        for text in render_disclosure(&disclosure, session.language) {
            println!("  {}", text);
        }
    }

    if session.json {
        print_json(&found)?;
    }

    if stats {
        let stats = resolver.stats();
        eprintln!(
            "entries: {}  pending: {}  found: {}  not found: {}  requests: {}",
            stats.entries, stats.pending, stats.found, stats.not_found, stats.requests_issued
        );
    }
    Ok(())
}

fn print_poem_row(poem: &Poem) {
    println!(
        "{:>6}  {:<9} {}{}",
        poem.id,
        poem.status.as_str(),
        poem.title,
        poem.poet_name().map(|p| format!("  ({})", p)).unwrap_or_default()
    );
}

pub async fn poems(session: &Session, status: Option<PoemStatus>, poet: Option<PoetId>) -> Result<()> {
    let api = session.api();
    let poems = match poet {
        Some(poet) => {
            let poems = api.poems_by_poet(poet).await?;
            match status {
                Some(status) => poems.into_iter().filter(|p| p.status == status).collect(),
                None => poems,
            }
        }
        None => api.list_poems(status).await?,
    };

    if session.json {
        return print_json(&poems);
    }
    for poem in &poems {
        print_poem_row(poem);
    }
    Ok(())
}

pub async fn poets(session: &Session, search: Option<&str>) -> Result<()> {
    let api = session.api();
    let poets = match search {
        Some(query) => api.search_poets(query).await?,
        None => api.list_poets().await?,
    };

    if session.json {
        return print_json(&poets);
    }
    for poet in &poets {
        let mut row = format!("{:>6}  {}", poet.id, poet.name);
        if let Some(roman) = &poet.name_roman {
            row.push_str(&format!(" / {}", roman));
        }
        if let Some(span) = &poet.life_span {
            row.push_str(&format!("  ({})", span));
        }
        println!("{}", row);
    }
    Ok(())
}

pub fn translit(text: &str, from: Option<Script>, to: Option<Script>) -> Result<()> {
    let from = from.unwrap_or_else(|| Script::detect(text));
    let to = to.unwrap_or_else(|| from.other());
    println!("{}", Iast.transliterate(text, from, to));
    Ok(())
}

pub async fn login(session: &Session, id_token: &str) -> Result<()> {
    let auth = session.state.login(id_token).await?;
    println!("Logged in ({} token stored)", auth.token_type);
    Ok(())
}

pub fn logout(session: &Session) -> Result<()> {
    session.state.logout()?;
    println!("Logged out");
    Ok(())
}

pub fn set_language(session: &Session, language: Language) -> Result<()> {
    session.state.set_language(language)?;
    println!("{}", language.as_str());
    Ok(())
}

pub async fn submit(session: &Session, path: &Path) -> Result<()> {
    let submission: PoemSubmission = read_json_file(path)?;
    if submission.title.trim().is_empty() || submission.body_marathi.trim().is_empty() {
        bail!("Submission needs a title and a body_marathi");
    }
    let api = session.require_login()?;
    let response = api.submit_poem(&submission).await?;
    print_json(&response)
}

pub async fn admin_submissions(session: &Session) -> Result<()> {
    let poems = session.require_login()?.submissions().await?;
    if session.json {
        return print_json(&poems);
    }
    for poem in &poems {
        print_poem_row(poem);
    }
    Ok(())
}

pub async fn admin_pending_words(session: &Session) -> Result<()> {
    let words = session.require_login()?.pending_words().await?;
    if session.json {
        return print_json(&words);
    }
    for word in &words {
        println!(
            "{:>6}  {}{}",
            word.id,
            word.devnagri,
            word.alternate_script
                .as_deref()
                .map(|a| format!(" ({})", a))
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn admin_approve(session: &Session, id: PoemId) -> Result<()> {
    print_json(&session.require_login()?.approve_poem(id).await?)
}

pub async fn admin_tokenize(session: &Session, id: PoemId) -> Result<()> {
    print_json(&session.require_login()?.tokenize_poem(id).await?)
}

pub async fn admin_enrich(session: &Session, word_ids: &[WordId]) -> Result<()> {
    print_json(&session.require_login()?.bulk_enrich(word_ids).await?)
}

pub async fn admin_approve_words(session: &Session, word_ids: &[WordId]) -> Result<()> {
    print_json(&session.require_login()?.bulk_approve(word_ids).await?)
}

pub async fn admin_enrich_word(session: &Session, id: WordId) -> Result<()> {
    print_json(&session.require_login()?.enrich_word(id).await?)
}

pub async fn admin_update_word(session: &Session, id: WordId, path: &Path) -> Result<()> {
    let update: WordUpdate = read_json_file(path)?;
    print_json(&session.require_login()?.update_word(id, &update).await?)
}

pub async fn admin_update_poem(session: &Session, id: PoemId, path: &Path) -> Result<()> {
    let update: PoemUpdate = read_json_file(path)?;
    if update.is_empty() {
        bail!("{} contains no poem fields to update", path.display());
    }
    print_json(&session.require_login()?.update_poem(id, &update).await?)
}

pub async fn reference_lists(session: &Session) -> Result<()> {
    let api = session.api();
    // both lists are optional on the backend
    let chhandas = api.chhanda_list().await.unwrap_or_else(|e| {
        tracing::warn!("failed to fetch chhandas: {}", e);
        Vec::new()
    });
    let genres = api.genres().await.unwrap_or_else(|e| {
        tracing::warn!("failed to fetch genres: {}", e);
        Vec::new()
    });

    if session.json {
        return print_json(&serde_json::json!({ "chhanda": chhandas, "genres": genres }));
    }
    let labels = |items: &[serde_json::Value]| {
        items.iter().filter_map(reference_label).collect::<Vec<_>>().join(", ")
    };
    println!("chhanda: {}", labels(chhandas.as_slice()));
    println!("genres: {}", labels(genres.as_slice()));
    Ok(())
}

/// One stdin line of `godwa edit`.
#[derive(Debug, PartialEq, Eq)]
enum EditLine {
    Set(Field, String),
    AutoSync(Option<bool>),
}

/// `devanagari<TAB>text`, `roman<TAB>text` or `sync<TAB>on|off|toggle`.
/// `\n` in the text stands for a line break.
fn parse_edit_line(line: &str) -> Result<EditLine> {
    let (field, text) = line
        .split_once('\t')
        .ok_or_else(|| anyhow!("expected FIELD<TAB>TEXT, got '{}'", line))?;

    if field.trim().eq_ignore_ascii_case("sync") {
        return match text.trim().to_lowercase().as_str() {
            "on" => Ok(EditLine::AutoSync(Some(true))),
            "off" => Ok(EditLine::AutoSync(Some(false))),
            "toggle" => Ok(EditLine::AutoSync(None)),
            other => Err(anyhow!("unknown sync value '{}'", other)),
        };
    }

    let field: Field = field.parse().map_err(|e: String| anyhow!(e))?;
    Ok(EditLine::Set(field, text.replace("\\n", "\n")))
}

pub async fn edit(session: &Session, id: PoemId, auto_sync: bool, save: bool) -> Result<()> {
    let api = if save { session.require_login()? } else { session.api() };
    let poem = api.get_poem(id).await?;
    let mut sync = ScriptSync::new(
        poem.body_marathi.clone(),
        poem.body_roman.clone().unwrap_or_default(),
        Iast,
    );
    sync.set_auto_sync(auto_sync);

    let print_state = |sync: &ScriptSync<Iast>| {
        let label = if sync.auto_sync() { Text::AutoSyncOn } else { Text::AutoSyncOff };
        println!("[{}]", session.text(label));
        println!("{}:\n{}", Field::Devanagari.script(), sync.devanagari());
        println!("{}:\n{}", Field::Roman.script(), sync.roman());
    };
    print_state(&sync);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_edit_line(&line) {
            Ok(EditLine::Set(field, text)) => {
                sync.edit(field, text);
            }
            Ok(EditLine::AutoSync(Some(enabled))) => sync.set_auto_sync(enabled),
            Ok(EditLine::AutoSync(None)) => {
                sync.toggle_auto_sync();
            }
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        }
        print_state(&sync);
    }

    if save {
        let (devanagari, roman) = sync.into_parts();
        let update = PoemUpdate {
            body_marathi: Some(devanagari),
            body_roman: Some(roman),
            ..Default::default()
        };
        api.update_poem(id, &update).await?;
        tracing::info!(poem = id, "poem text saved");
    }
    Ok(())
}
