//! patchmerge command-line tool.
//!
//! Provides subcommands for detecting conflicts between JSON Patch groups,
//! seeding default resolutions, merging (optionally interactively), applying
//! the merged patches to a document, and generating / validating the
//! configuration file.

mod prompt;
mod request;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use patchmerge_core::{apply_patches, detect_conflicts, initialize_resolutions, AppConfig};

use request::MergeRequest;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// patchmerge command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "patchmerge",
    version,
    about = "Detect and resolve conflicts between JSON Patch sets"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List conflicting paths between patch groups.
    Detect {
        /// Merge request or patch-group file (JSON).
        input: PathBuf,

        /// Print conflicts as JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Write JSON output here instead of stdout (implies --json).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the first-option default resolution for every conflict.
    Defaults {
        /// Merge request or patch-group file (JSON).
        input: PathBuf,

        /// Write output here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge patch groups into a single patch list.
    Resolve {
        /// Merge request or patch-group file (JSON).
        input: PathBuf,

        /// Choose the winning hash for a path (PATH=HASH). Repeatable.
        #[arg(short, long = "select", value_parser = parse_selection)]
        selections: Vec<(String, String)>,

        /// Seed first-option resolutions for conflicts left unchosen.
        #[arg(long)]
        defaults: bool,

        /// Pick a winner for each conflict interactively.
        #[arg(short, long)]
        interactive: bool,

        /// Apply the merged patches to this document and print the result.
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Write output here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let log_filter = init_logging(cli.verbose);

    match cli.command {
        Commands::Init { output } => cmd_init(output),
        Commands::Validate => cmd_validate(cli.config.as_deref()),
        _ => {
            let config = AppConfig::load_or_default(cli.config.as_deref())
                .context("failed to load configuration")?;
            if std::env::var_os("RUST_LOG").is_none() {
                let level = log_directive(cli.verbose, &config.logging.level);
                log_filter
                    .reload(EnvFilter::new(level))
                    .context("failed to apply configured log level")?;
            }

            match cli.command {
                Commands::Detect {
                    input,
                    json,
                    output,
                } => cmd_detect(&config, &input, json, output.as_deref()),
                Commands::Defaults { input, output } => {
                    cmd_defaults(&config, &input, output.as_deref())
                }
                Commands::Resolve {
                    input,
                    selections,
                    defaults,
                    interactive,
                    document,
                    output,
                } => cmd_resolve(
                    &config,
                    ResolveArgs {
                        input,
                        selections,
                        defaults,
                        interactive,
                        document,
                        output,
                    },
                ),
                _ => unreachable!(),
            }
        }
    }
}

/// Install the subscriber before the config is read, at `warn` (or `debug`
/// with `--verbose`). `RUST_LOG` wins over both. The returned handle swaps in
/// the configured level once the config is loaded.
fn init_logging(verbose: bool) -> reload::Handle<EnvFilter, Registry> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose, "warn")));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
    handle
}

fn log_directive(verbose: bool, level: &str) -> &str {
    if verbose {
        "debug"
    } else {
        level
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_detect(config: &AppConfig, input: &Path, json: bool, output: Option<&Path>) -> Result<()> {
    let request = MergeRequest::load(input)?;
    let conflicts = detect_conflicts(&request.patch_groups);

    if json || output.is_some() {
        return emit(config, &conflicts, output);
    }

    if conflicts.is_empty() {
        println!("{}", style::success("No conflicts"));
        return Ok(());
    }

    println!("{}", style::header(&format!("Conflicts ({})", conflicts.len())));
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Path", "Options", "Candidates"]);

    for c in &conflicts {
        let candidates = c
            .options
            .iter()
            .map(|h| style::short_hash(h, 10))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&c.path),
            Cell::new(c.options.len()),
            Cell::new(candidates),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn cmd_defaults(config: &AppConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let request = MergeRequest::load(input)?;
    let conflicts = match request.conflicts {
        Some(conflicts) => conflicts,
        None => detect_conflicts(&request.patch_groups),
    };
    emit(config, &initialize_resolutions(&conflicts), output)
}

struct ResolveArgs {
    input: PathBuf,
    selections: Vec<(String, String)>,
    defaults: bool,
    interactive: bool,
    document: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn cmd_resolve(config: &AppConfig, args: ResolveArgs) -> Result<()> {
    let mut session = MergeRequest::load(&args.input)?.into_session();

    for (path, hash) in &args.selections {
        session
            .select(path, hash)
            .with_context(|| format!("cannot select '{}' for '{}'", hash, path))?;
    }

    if args.interactive {
        prompt::choose_resolutions(&mut session)?;
    }

    if args.defaults || config.merge.seed_defaults {
        session = session.with_default_resolutions();
    }

    let resolved = session.resolve();

    if !resolved.is_fully_resolved() {
        let count = resolved.unresolved_conflicts.len();
        warn!(count, "unresolved conflict hashes remain");
        if config.merge.fail_on_unresolved {
            anyhow::bail!("{} unresolved conflict hash(es) remain", count);
        }
        eprintln!(
            "{}",
            style::warn(&format!(
                "{} conflict hash(es) unresolved, first options were used",
                count
            ))
        );
    }

    match args.document {
        Some(ref doc_path) => {
            let base = request::load_document(doc_path)?;
            let merged = apply_patches(&base, &resolved.resolved_patches)
                .context("failed to apply merged patches")?;
            emit(config, &merged, args.output.as_deref())?;
        }
        None => emit(config, &resolved, args.output.as_deref())?,
    }

    Ok(())
}

fn cmd_init(output: Option<PathBuf>) -> Result<()> {
    let output = match output.or_else(AppConfig::default_path) {
        Some(path) => path,
        None => anyhow::bail!("no config directory found; pass --output"),
    };

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let contents = format!(
        "# patchmerge configuration\n\n{}",
        AppConfig::default().to_toml()?
    );
    std::fs::write(&output, contents).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    Ok(())
}

fn cmd_validate(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => println!("Validating configuration: {}", p.display()),
        None => println!("Validating default configuration"),
    }

    let config = AppConfig::load_or_default(path).context("configuration is invalid")?;

    println!();
    println!("  Log level          : {}", config.logging.level);
    println!("  Pretty output      : {}", config.output.pretty);
    println!("  Seed defaults      : {}", config.merge.seed_defaults);
    println!("  Fail on unresolved : {}", config.merge.fail_on_unresolved);
    println!();
    println!("{}", style::success("Configuration is valid."));
    Ok(())
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Print `value` as JSON to `output` or stdout.
fn emit<T: Serialize>(config: &AppConfig, value: &T, output: Option<&Path>) -> Result<()> {
    let text = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match output {
        Some(path) => std::fs::write(path, text + "\n")
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Parse `PATH=HASH`. Splits on the last `=` so paths may contain one.
fn parse_selection(s: &str) -> Result<(String, String), String> {
    match s.rsplit_once('=') {
        Some((path, hash)) if !path.is_empty() && !hash.is_empty() => {
            Ok((path.to_string(), hash.to_string()))
        }
        _ => Err(format!("expected PATH=HASH, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            parse_selection("/a=h1"),
            Ok(("/a".to_string(), "h1".to_string()))
        );
        assert_eq!(
            parse_selection("/k=v=h2"),
            Ok(("/k=v".to_string(), "h2".to_string()))
        );
        assert!(parse_selection("/a").is_err());
        assert!(parse_selection("=h1").is_err());
        assert!(parse_selection("/a=").is_err());
    }

    #[test]
    fn test_resolve_args_parse() {
        let cli = Cli::try_parse_from([
            "patchmerge",
            "resolve",
            "req.json",
            "-s",
            "/a=h2",
            "--select",
            "/b=h4",
            "--defaults",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                selections,
                defaults,
                interactive,
                ..
            } => {
                assert_eq!(selections.len(), 2);
                assert!(defaults);
                assert!(!interactive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_emit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let config = AppConfig::default();
        emit(&config, &vec!["h1", "h2"], Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vec!["h1", "h2"]);
    }

    #[test]
    fn test_resolve_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("req.json");
        let output = dir.path().join("merged.json");
        std::fs::write(
            &input,
            r#"[[{"op":"add","path":"/a","value":1,"hash":"h1"},
                 {"op":"replace","path":"/b","value":true,"hash":"h3"}],
                [{"op":"add","path":"/a","value":2,"hash":"h2"}]]"#,
        )
        .unwrap();

        let args = ResolveArgs {
            input,
            selections: vec![("/a".into(), "h2".into())],
            defaults: false,
            interactive: false,
            document: None,
            output: Some(output.clone()),
        };
        cmd_resolve(&AppConfig::default(), args).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let set: patchmerge_core::ResolvedPatchSet = serde_json::from_str(&text).unwrap();
        assert!(set.is_fully_resolved());
        let hashes: Vec<&str> = set.resolved_patches.iter().map(|p| p.hash.as_str()).collect();
        assert_eq!(hashes, vec!["h3", "h2"]);
    }

    #[test]
    fn test_resolve_fails_on_unresolved_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("req.json");
        std::fs::write(
            &input,
            r#"[[{"op":"add","path":"/a","value":1,"hash":"h1"}],
                [{"op":"add","path":"/a","value":2,"hash":"h2"}]]"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.merge.fail_on_unresolved = true;
        let output = dir.path().join("out.json");
        let args = ResolveArgs {
            input: input.clone(),
            selections: Vec::new(),
            defaults: false,
            interactive: false,
            document: None,
            output: Some(output.clone()),
        };
        assert!(cmd_resolve(&config, args).is_err());
        assert!(!output.exists(), "no merged output may be left behind");

        let document = dir.path().join("base.json");
        std::fs::write(&document, "{}").unwrap();
        let args = ResolveArgs {
            input,
            selections: Vec::new(),
            defaults: false,
            interactive: false,
            document: Some(document),
            output: Some(output.clone()),
        };
        assert!(cmd_resolve(&config, args).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(true, "error"), "debug");
        assert_eq!(log_directive(false, "error"), "error");
    }

    #[test]
    fn test_detect_writes_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("groups.json");
        let output = dir.path().join("conflicts.json");
        std::fs::write(
            &input,
            r#"[[{"op":"add","path":"/a","value":1,"hash":"h1"},
                 {"op":"add","path":"/b","value":1,"hash":"h3"}],
                [{"op":"add","path":"/a","value":2,"hash":"h2"}]]"#,
        )
        .unwrap();

        cmd_detect(&AppConfig::default(), &input, true, Some(&output)).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        let conflicts: Vec<patchmerge_core::ConflictDetail> = serde_json::from_str(&text).unwrap();
        assert_eq!(
            conflicts,
            vec![patchmerge_core::ConflictDetail::new("/a", vec!["h1".into(), "h2".into()])]
        );

        // Table rendering goes to stdout.
        cmd_detect(&AppConfig::default(), &input, false, None).unwrap();
    }

    #[test]
    fn test_defaults_detects_when_conflicts_absent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("groups.json");
        let output = dir.path().join("defaults.json");
        std::fs::write(
            &input,
            r#"[[{"op":"add","path":"/a","value":1,"hash":"h1"}],
                [{"op":"add","path":"/a","value":2,"hash":"h2"}]]"#,
        )
        .unwrap();

        cmd_defaults(&AppConfig::default(), &input, Some(&output)).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        let resolutions: Vec<patchmerge_core::ConflictResolution> =
            serde_json::from_str(&text).unwrap();
        assert_eq!(
            resolutions,
            vec![patchmerge_core::ConflictResolution::new("/a", "h1")]
        );
    }

    #[test]
    fn test_defaults_uses_supplied_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("request.json");
        let output = dir.path().join("defaults.json");
        // The supplied list orders h2 first and adds an option-less path;
        // detection would have produced ["h1", "h2"] for /a only.
        std::fs::write(
            &input,
            r#"{
                "patchGroups": [[{"op":"add","path":"/a","value":1,"hash":"h1"}],
                                [{"op":"add","path":"/a","value":2,"hash":"h2"}]],
                "conflicts": [{"path":"/a","options":["h2","h1"]},
                              {"path":"/z","options":[]}]
            }"#,
        )
        .unwrap();

        cmd_defaults(&AppConfig::default(), &input, Some(&output)).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        let resolutions: Vec<patchmerge_core::ConflictResolution> =
            serde_json::from_str(&text).unwrap();
        assert_eq!(
            resolutions,
            vec![patchmerge_core::ConflictResolution::new("/a", "h2")]
        );
    }
}
