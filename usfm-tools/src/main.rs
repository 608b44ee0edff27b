mod config;
mod files;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::ToolConfig;
use std::fs;
use std::path::{Path, PathBuf};
use usfm_core::metadata::DEFAULT_VERSIFICATION;
use usfm_core::{
    BibleMetadata, Book, DirectoryStore, ResourceStore, VersificationScheme, detect_book_id,
    versification_for_language,
};

#[derive(Parser, Debug)]
#[command(
    name = "usfm-tools",
    about = "Verify and re-chunk USFM scripture manuscripts",
    long_about = "Checks USFM books against a versification scheme and rewrites them with chunk markers"
)]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every USFM file in a directory
    Verify {
        /// Directory holding the USFM files
        #[arg(short, long)]
        dir: PathBuf,

        /// Versification scheme (overrides config)
        #[arg(short, long)]
        versification: Option<String>,

        /// Directory holding versification and chunk data (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Check every USFM file in a directory and write it out with new chunk markers
    Rechunk {
        /// Directory holding the USFM files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory (defaults to <dir>/rechunked)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Versification scheme (overrides config)
        #[arg(short, long, conflicts_with_all = ["lang", "meta"])]
        versification: Option<String>,

        /// Pick the versification scheme used for this language
        #[arg(long, conflicts_with = "meta")]
        lang: Option<String>,

        /// Pick the versification scheme from a meta.json file
        #[arg(long)]
        meta: Option<PathBuf>,

        /// Insert paragraph markers from the paragraph table
        #[arg(long, default_value_t = false)]
        paragraphs: bool,

        /// Directory holding versification and chunk data (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the versification data directory
    SetDataDir {
        path: PathBuf,
    },
    /// Set the default versification scheme
    SetVersification {
        name: String,
    },
    /// Set the chunk boundary marker
    SetChunkMarker {
        marker: String,
    },
}

/// Findings for one file.
struct FileReport {
    path: PathBuf,
    book_id: String,
    errors: Vec<String>,
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    let mut config = ToolConfig::load()?;

    match action {
        ConfigAction::Show => {
            println!("Config file: {}", ToolConfig::config_path().display());
            println!();
            println!("{:#?}", config);
            return Ok(());
        }
        ConfigAction::SetDataDir { path } => {
            let path = path
                .canonicalize()
                .with_context(|| format!("Data directory not found: {}", path.display()))?;
            println!("Data directory set to: {}", path.display());
            config.data_dir = Some(path);
        }
        ConfigAction::SetVersification { name } => {
            println!("Default versification set to: {}", name);
            config.versification = name.clone();
        }
        ConfigAction::SetChunkMarker { marker } => {
            if !marker.starts_with('\\') {
                bail!("Chunk marker must be a USFM tag such as \\s5, got {}", marker);
            }
            println!("Chunk marker set to: {}", marker);
            config.chunk_marker = marker.clone();
        }
    }

    config.save()
}

/// Resolve the reference data store from the flag or the config.
fn open_store(data_dir: Option<&Path>, config: &ToolConfig) -> Result<DirectoryStore> {
    let Some(dir) = data_dir.or(config.data_dir.as_deref()) else {
        bail!("No data directory configured. Use --data-dir or `usfm-tools config set-data-dir`");
    };
    if !dir.is_dir() {
        bail!("Data directory not found: {}", dir.display());
    }
    Ok(DirectoryStore::new(dir))
}

/// Pick the scheme name: explicit flag, then language, then metadata, then config.
fn choose_versification(
    versification: Option<&str>,
    lang: Option<&str>,
    meta: Option<&Path>,
    config: &ToolConfig,
) -> Result<String> {
    if let Some(name) = versification {
        return Ok(name.to_string());
    }
    if let Some(lang) = lang {
        return Ok(versification_for_language(lang).to_string());
    }
    if let Some(path) = meta {
        let meta = BibleMetadata::load(path)
            .with_context(|| format!("Failed to read metadata from {}", path.display()))?;
        if meta.versification != DEFAULT_VERSIFICATION {
            return Ok(meta.versification);
        }
        return Ok(versification_for_language(&meta.lang).to_string());
    }
    Ok(config.versification.clone())
}

fn load_scheme(store: &DirectoryStore, name: &str) -> Result<VersificationScheme> {
    store
        .versification(name)
        .with_context(|| format!("Failed to load versification {}", name))
}

/// Read a manuscript and create its book.
fn open_book(path: &Path, scheme: &VersificationScheme, config: &ToolConfig) -> Result<(Book, String)> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let book_id = detect_book_id(&text)
        .with_context(|| format!("No \\id line in {}", path.display()))?;
    let book = Book::create(scheme, &book_id)
        .with_context(|| format!("Cannot check {}", path.display()))?
        .with_chunk_marker(config.chunk_marker.clone());
    Ok((book, text))
}

fn verify_file(path: &Path, scheme: &VersificationScheme, config: &ToolConfig) -> Result<FileReport> {
    let (book, text) = open_book(path, scheme, config)?;
    let book = book
        .set_usfm(&text)
        .clean_usfm()
        .verify_usfm_tags()
        .verify_chapters_and_verses();

    Ok(FileReport {
        path: path.to_path_buf(),
        book_id: book.book_id().to_string(),
        errors: book.validation_errors(),
    })
}

fn rechunk_file(
    path: &Path,
    out_dir: &Path,
    store: &DirectoryStore,
    scheme: &VersificationScheme,
    config: &ToolConfig,
    paragraphs: bool,
) -> Result<FileReport> {
    let (book, text) = open_book(path, scheme, config)?;
    let book_id = book.book_id().to_string();

    let chunks = store
        .chunks(scheme.name(), &book_id)
        .with_context(|| format!("Failed to load chunks for {}", book_id))?;
    let paragraph_spec = if paragraphs {
        Some(
            store
                .paragraphs(&book_id)
                .with_context(|| format!("Failed to load paragraphs for {}", book_id))?,
        )
    } else {
        None
    };

    let book = book.process(&text, &chunks, paragraph_spec.as_ref());
    let mut errors = book.validation_errors();
    for gap in book.chunking_gaps() {
        eprintln!("  Warning: chunk {} of {} was not placed", gap, book_id);
    }

    let target = out_dir.join(book.file_name());
    if errors.is_empty() {
        fs::write(&target, book.usfm())
            .with_context(|| format!("Failed to write {}", target.display()))?;
    } else {
        errors.push(format!("{} was not written", target.display()));
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        book_id,
        errors,
    })
}

/// Print the per-book findings and return whether everything was clean.
fn print_reports(reports: &[Result<FileReport>], files: &[PathBuf]) -> bool {
    let mut clean = true;

    for (report, path) in reports.iter().zip(files) {
        match report {
            Ok(report) if report.errors.is_empty() => {
                eprintln!("{} ({}): OK", report.path.display(), report.book_id);
            }
            Ok(report) => {
                clean = false;
                eprintln!(
                    "{} ({}): {} problem(s)",
                    report.path.display(),
                    report.book_id,
                    report.errors.len()
                );
                for error in &report.errors {
                    eprintln!("  {}", error);
                }
            }
            Err(e) => {
                clean = false;
                eprintln!("{}: {:#}", path.display(), e);
            }
        }
    }

    clean
}

fn find_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let files = files::find_usfm_files(dir)?;
    if files.is_empty() {
        bail!("No USFM files found in {}", dir.display());
    }
    log::info!("Found {} USFM file(s) in {}", files.len(), dir.display());
    Ok(files)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let clean = match &args.command {
        Commands::Config { action } => return handle_config_command(action),
        Commands::Verify {
            dir,
            versification,
            data_dir,
        } => {
            let config = ToolConfig::load()?;
            let store = open_store(data_dir.as_deref(), &config)?;
            let name = choose_versification(versification.as_deref(), None, None, &config)?;
            let scheme = load_scheme(&store, &name)?;

            let files = find_files(dir)?;
            let reports: Vec<_> = files
                .iter()
                .map(|path| verify_file(path, &scheme, &config))
                .collect();
            print_reports(&reports, &files)
        }
        Commands::Rechunk {
            dir,
            out,
            versification,
            lang,
            meta,
            paragraphs,
            data_dir,
        } => {
            let config = ToolConfig::load()?;
            let store = open_store(data_dir.as_deref(), &config)?;
            let name = choose_versification(
                versification.as_deref(),
                lang.as_deref(),
                meta.as_deref(),
                &config,
            )?;
            let scheme = load_scheme(&store, &name)?;

            let out_dir = out.clone().unwrap_or_else(|| dir.join("rechunked"));
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;

            let files = find_files(dir)?;
            let reports: Vec<_> = files
                .iter()
                .map(|path| rechunk_file(path, &out_dir, &store, &scheme, &config, *paragraphs))
                .collect();
            print_reports(&reports, &files)
        }
    };

    if !clean {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_versification_flag_wins() {
        let config = ToolConfig::default();
        let name = choose_versification(Some("avd"), Some("ru"), None, &config).unwrap();
        assert_eq!(name, "avd");
    }

    #[test]
    fn test_versification_from_language() {
        let config = ToolConfig::default();
        assert_eq!(
            choose_versification(None, Some("hu"), None, &config).unwrap(),
            "ufw-odx"
        );
    }

    #[test]
    fn test_versification_from_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.json");
        fs::write(
            &path,
            r#"{"lang": "bn", "name": "", "slug": "", "checking_entity": "",
                "checking_level": "1", "comments": "", "contributors": "",
                "publish_date": "2017-01-01", "source_text": "", "source_text_version": "",
                "version": "1"}"#,
        )
        .unwrap();

        let config = ToolConfig::default();
        assert_eq!(
            choose_versification(None, None, Some(&path), &config).unwrap(),
            "ufw-bn"
        );
    }

    #[test]
    fn test_versification_from_config() {
        let config = ToolConfig {
            versification: "rsc".to_string(),
            ..ToolConfig::default()
        };
        assert_eq!(choose_versification(None, None, None, &config).unwrap(), "rsc");
    }

    #[test]
    fn test_store_requires_data_dir() {
        let config = ToolConfig::default();
        assert!(open_store(None, &config).is_err());

        let dir = TempDir::new().unwrap();
        assert!(open_store(Some(dir.path()), &config).is_ok());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["usfm-tools", "--debug", "verify", "-d", "books", "-v", "rsc"])
            .unwrap();
        assert!(args.debug);
        match args.command {
            Commands::Verify { dir, versification, .. } => {
                assert_eq!(dir, PathBuf::from("books"));
                assert_eq!(versification.as_deref(), Some("rsc"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rechunk_writes_clean_books() {
        let data = TempDir::new().unwrap();
        let scheme_dir = data.path().join("ufw");
        fs::create_dir_all(scheme_dir.join("chunks")).unwrap();
        fs::write(scheme_dir.join("ufw.vrs"), "JON 1:3\n").unwrap();
        fs::write(scheme_dir.join("books.json"), r#"{"JON": ["Jonah", 32]}"#).unwrap();
        fs::write(
            scheme_dir.join("chunks").join("jon.json"),
            r#"[{"chapter": 1, "first_verses": [1, 3]}]"#,
        )
        .unwrap();

        let books = TempDir::new().unwrap();
        let path = books.path().join("jonah.usfm");
        fs::write(&path, "\\id JON\n\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n").unwrap();

        let store = DirectoryStore::new(data.path());
        let scheme = store.versification("ufw").unwrap();
        let report = rechunk_file(
            &path,
            books.path(),
            &store,
            &scheme,
            &ToolConfig::default(),
            false,
        )
        .unwrap();

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        let written = fs::read_to_string(books.path().join("32-JON.usfm")).unwrap();
        assert_eq!(
            written,
            "\\id JON\n\n\\s5\n\\c 1\n\\v 1 a\n\\v 2 b\n\n\\s5\n\\v 3 c\n"
        );
    }

    #[test]
    fn test_verify_reports_findings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jonah.usfm");
        fs::write(&path, "\\id JON\n\\c 1\n\\v 1 a\n\\v 3 c\n").unwrap();

        let scheme = VersificationScheme::parse("ufw", "JON 1:3\n", r#"{"JON": ["Jonah", 32]}"#)
            .unwrap();
        let report = verify_file(&path, &scheme, &ToolConfig::default()).unwrap();
        assert_eq!(report.book_id, "JON");
        assert_eq!(report.errors, vec!["Verse not found, JON 1:2"]);
    }
}
