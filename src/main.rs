//! Godwa - Marathi poetry reader with word-level glossing
//! Command-line front end over `godwa_lib`

mod commands;

use clap::{Parser, Subcommand};
use commands::Session;
use godwa_lib::config::ClientConfig;
use godwa_lib::i18n::Language;
use godwa_lib::poems::{PoemId, PoemStatus, PoetId};
use godwa_lib::state::AppState;
use godwa_lib::tokens::Script;
use godwa_lib::words::WordId;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "godwa", about = "Read Marathi poetry with word glosses", version)]
struct Cli {
    /// Backend base URL (overrides GODWA_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Interface language: marathi or roman. Defaults to the saved preference.
    #[arg(long, global = true)]
    lang: Option<Language>,

    /// Emit JSON instead of text where a command supports it.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a poem line by line.
    Read {
        id: PoemId,
        /// Show the Roman text when the poem has one.
        #[arg(long)]
        roman: bool,
        /// Resolve every word and print its meaning under each line.
        #[arg(long)]
        glosses: bool,
    },
    /// Open the tooltip for one word of a poem.
    Gloss {
        id: PoemId,
        word: String,
        #[arg(long)]
        roman: bool,
    },
    /// Look up word meanings (Devanagari or IAST).
    Lookup {
        #[arg(required = true)]
        words: Vec<String>,
        /// Print resolver cache counters to stderr.
        #[arg(long)]
        stats: bool,
    },
    /// List poems.
    Poems {
        #[arg(long)]
        status: Option<PoemStatus>,
        #[arg(long)]
        poet: Option<PoetId>,
    },
    /// List or search poets.
    Poets {
        #[arg(long)]
        search: Option<String>,
    },
    /// Chhanda and genre reference lists.
    References,
    /// Transliterate between Devanagari and IAST.
    Translit {
        text: String,
        /// Source script; detected from the text when omitted.
        #[arg(long)]
        from: Option<Script>,
        #[arg(long)]
        to: Option<Script>,
    },
    /// Exchange a Google identity token for an access token.
    Login { id_token: String },
    /// Forget the stored access token.
    Logout,
    /// Save the interface language preference.
    Language { language: Language },
    /// Submit a poem from a JSON file.
    Submit { file: PathBuf },
    /// Edit a poem's Devanagari and Roman text from stdin lines.
    Edit {
        id: PoemId,
        /// Start with auto-sync on.
        #[arg(long)]
        auto_sync: bool,
        /// Save both texts when stdin closes.
        #[arg(long)]
        save: bool,
    },
    /// Moderation commands.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Poems waiting for moderation.
    Submissions,
    /// Words waiting for enrichment or approval.
    PendingWords,
    Approve { id: PoemId },
    /// Extract words from a poem on the server.
    Tokenize { id: PoemId },
    /// Queue AI enrichment for several words.
    Enrich {
        #[arg(required = true)]
        word_ids: Vec<WordId>,
    },
    ApproveWords {
        #[arg(required = true)]
        word_ids: Vec<WordId>,
    },
    EnrichWord { id: WordId },
    UpdateWord { id: WordId, file: PathBuf },
    UpdatePoem { id: PoemId, file: PathBuf },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("godwa=info,godwa_lib=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }

    let state = AppState::new(config)?;
    let language = cli.lang.unwrap_or_else(|| state.language());
    let session = Session {
        state,
        language,
        json: cli.json,
    };

    match cli.command {
        Command::Read { id, roman, glosses } => commands::read(&session, id, roman, glosses).await,
        Command::Gloss { id, word, roman } => commands::gloss(&session, id, &word, roman).await,
        Command::Lookup { words, stats } => commands::lookup(&session, &words, stats).await,
        Command::Poems { status, poet } => commands::poems(&session, status, poet).await,
        Command::Poets { search } => commands::poets(&session, search.as_deref()).await,
        Command::References => commands::reference_lists(&session).await,
        Command::Translit { text, from, to } => commands::translit(&text, from, to),
        Command::Login { id_token } => commands::login(&session, &id_token).await,
        Command::Logout => commands::logout(&session),
        Command::Language { language } => commands::set_language(&session, language),
        Command::Submit { file } => commands::submit(&session, &file).await,
        Command::Edit { id, auto_sync, save } => commands::edit(&session, id, auto_sync, save).await,
        Command::Admin(admin) => match admin {
            AdminCommand::Submissions => commands::admin_submissions(&session).await,
            AdminCommand::PendingWords => commands::admin_pending_words(&session).await,
            AdminCommand::Approve { id } => commands::admin_approve(&session, id).await,
            AdminCommand::Tokenize { id } => commands::admin_tokenize(&session, id).await,
            AdminCommand::Enrich { word_ids } => commands::admin_enrich(&session, &word_ids).await,
            AdminCommand::ApproveWords { word_ids } => {
                commands::admin_approve_words(&session, &word_ids).await
            }
            AdminCommand::EnrichWord { id } => commands::admin_enrich_word(&session, id).await,
            AdminCommand::UpdateWord { id, file } => {
                commands::admin_update_word(&session, id, &file).await
            }
            AdminCommand::UpdatePoem { id, file } => {
                commands::admin_update_poem(&session, id, &file).await
            }
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
