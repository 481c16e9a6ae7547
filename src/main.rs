//! marginalia - continuous-scroll EPUB reader core

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use marginalia::annotate::{
    AnnotationCache, AnnotationService, HttpGenerationClient, JsonFileStore, KeyValueStore,
};
use marginalia::io::ZipArchiveReader;
use marginalia::render::render_page;
use marginalia::{Error, PanelContent, ReaderConfig, ReadingSession, Result, section_text};

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(version, about = "Read EPUBs as one scroll, with definitions and summaries", long_about = None)]
#[command(after_help = "EXAMPLES:
    marginalia info book.epub               Show metadata and section count
    marginalia render book.epub -o out.html Write the assembled book as HTML
    marginalia define resolute              Look a word up (cache first)
    marginalia summarize book.epub 0        Summarize the first section")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Annotation cache file
    #[arg(long, global = true, value_name = "FILE", default_value = "marginalia-cache.json")]
    cache: PathBuf,

    /// Characters between summary markers (overrides the config file)
    #[arg(long, global = true, value_name = "CHARS")]
    interval: Option<usize>,

    /// Never call the generation endpoint
    #[arg(long, global = true)]
    offline: bool,

    /// Log pipeline and cache activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show book metadata, spine length and marker count
    Info { book: PathBuf },
    /// Assemble, segment and tokenize a book, then write it as HTML
    Render {
        book: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List summary sections with their length
    Sections { book: PathBuf },
    /// Define a word or phrase
    Define {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
    /// Forget a cached definition
    Unmark { word: String },
    /// Summarize the section ending at a marker
    Summarize { book: PathBuf, section: usize },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("marginalia=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ReaderConfig> {
    let mut config = match &cli.config {
        Some(path) => ReaderConfig::load(path)?,
        None => ReaderConfig::default(),
    };
    if let Some(interval) = cli.interval {
        config.summary_interval = interval;
    }
    config.validate()?;
    Ok(config)
}

fn annotation_service(cli: &Cli, config: &ReaderConfig) -> Result<AnnotationService> {
    let store: Rc<dyn KeyValueStore> = Rc::new(JsonFileStore::open(&cli.cache)?);
    let cache = AnnotationCache::new(store, config.summary_key_prefix);
    let client = HttpGenerationClient::from_config(config)?;
    let mut service = AnnotationService::new(Box::new(client), cache, config.clone());
    service.set_online(!cli.offline);
    Ok(service)
}

fn open_session(cli: &Cli, path: &Path) -> Result<ReadingSession> {
    let config = load_config(cli)?;
    let service = annotation_service(cli, &config)?;
    let mut archive = ZipArchiveReader::open(path)?;
    let session = ReadingSession::open(&mut archive, config, service)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = fs::metadata(path)?.len();
    session.remember_file(&name, size)?;
    Ok(session)
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Info { book } => show_info(&cli, book),
        Command::Render { book, output } => render(&cli, book, output.as_deref()),
        Command::Sections { book } => list_sections(&cli, book),
        Command::Define { words } => define(&cli, &words.join(" ")).await,
        Command::Unmark { word } => {
            let config = load_config(&cli)?;
            annotation_service(&cli, &config)?.remove_word(word)?;
            println!("Removed definition for \"{}\"", word.trim());
            Ok(())
        }
        Command::Summarize { book, section } => summarize(&cli, book, *section).await,
    }
}

fn show_info(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli, path)?;
    let package = session.package();
    let meta = &package.metadata;
    let report = session.report();

    println!("File: {}", path.display());
    if !meta.title.is_empty() {
        println!("Title: {}", meta.title);
    }
    if !meta.creators.is_empty() {
        println!("Authors: {}", meta.creators.join(", "));
    }
    if !meta.language.is_empty() {
        println!("Language: {}", meta.language);
    }
    println!("Package: {}", package.opf_path);
    println!("Spine items: {}", package.content_paths.len());
    println!("Documents assembled: {}", report.documents);
    if !report.skipped_documents.is_empty() {
        println!("Documents skipped: {}", report.skipped_documents.join(", "));
    }
    println!("Images inlined: {}", report.images_inlined);
    if !report.missing_images.is_empty() {
        println!("Images missing: {}", report.missing_images.len());
    }
    println!("Summary markers: {}", session.markers().len());
    Ok(())
}

fn render(cli: &Cli, path: &Path, output: Option<&Path>) -> Result<()> {
    let mut session = open_session(cli, path)?;
    let units = session.wrap_all();
    let title = session.package().metadata.title.clone();
    let page = render_page(session.document(), session.words(), &title);

    match output {
        Some(out) => {
            fs::write(out, page)?;
            eprintln!("Wrote {} ({units} words)", out.display());
        }
        None => print!("{page}"),
    }
    Ok(())
}

fn list_sections(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli, path)?;
    let markers = session.markers();
    if markers.is_empty() {
        println!("No summary markers");
        return Ok(());
    }
    for index in 0..markers.len() {
        let text = section_text(session.document(), index, usize::MAX).unwrap_or_default();
        let preview: String = text.chars().take(60).collect();
        println!("{index:>4}  {:>7} chars  {preview}", text.chars().count());
    }
    Ok(())
}

async fn define(cli: &Cli, word: &str) -> Result<()> {
    let config = load_config(cli)?;
    let service = annotation_service(cli, &config)?;
    let def = service.lookup_word(word).await?;
    println!("{}", word.trim());
    println!("Definition: {}", def.definition);
    if !def.example.is_empty() {
        println!("Example: {}", def.example);
    }
    Ok(())
}

async fn summarize(cli: &Cli, path: &Path, section: usize) -> Result<()> {
    let mut session = open_session(cli, path)?;
    if section >= session.markers().len() {
        return Err(Error::Config(format!(
            "section {section} does not exist ({} markers)",
            session.markers().len()
        )));
    }
    match session.activate_marker(section).await {
        PanelContent::Summary { summary } => println!("{summary}"),
        PanelContent::Message { text, .. } => println!("{text}"),
        PanelContent::Definition { .. } => {}
    }
    Ok(())
}
