use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use collabmap_collect::{CollectOptions, Collector};
use collabmap_core::config_file::{
    self, CategoryConfig, ClassifierConfig, CollectConfig, ConfigFile, InstitutionSource,
    NameOrder, TokenizerConfig,
};
use collabmap_core::{
    AffiliationPipeline, Connections, CountsByInstitution, FrequencyOptions, KeywordTaxonomy,
    MatchMode, compute_frequency, compute_stats, load_json, save_json,
};
use collabmap_reporting::{ExportFormat, export_stats, write_report};
use tracing_subscriber::{EnvFilter, fmt};

mod output;

use output::ColorMode;

/// Institutional collaboration mapper - from faculty rosters to co-author
/// affiliation statistics
#[derive(Parser, Debug)]
#[command(name = "collabmap", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl configured rosters and scrape co-author affiliations
    Collect {
        /// Comma-separated institution aliases to collect (default: all)
        #[arg(long, value_delimiter = ',')]
        range: Vec<String>,

        /// Where to write member → raw affiliations
        #[arg(short, long, default_value = "connections.json")]
        output: PathBuf,
    },

    /// Canonicalize affiliations and count collaborators per institution
    Count {
        #[arg(long, default_value = "connections.json")]
        connections: PathBuf,

        #[arg(short, long, default_value = "counts.json")]
        output: PathBuf,

        /// Raw affiliations considered per member
        #[arg(long)]
        top_k: Option<usize>,

        /// Drop collaborators seen fewer times than this
        #[arg(long)]
        min_occur: Option<usize>,
    },

    /// Compute per-institution collaboration statistics
    Stats {
        #[arg(long, default_value = "connections.json")]
        connections: PathBuf,

        /// Precomputed counts; recomputed from connections when omitted
        #[arg(long)]
        counts: Option<PathBuf>,

        /// Output format (default: from --output extension, else text)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Canonicalize raw affiliation strings
    Classify {
        /// Raw affiliation strings
        #[arg(required = true)]
        raw: Vec<String>,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the platform config file location
    Path,
    /// Print the effective (merged) configuration
    Show,
    /// Write a starter config to the platform location
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FormatArg {
    Csv,
    Json,
    Text,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Text => ExportFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color = ColorMode(!cli.no_color);
    let config = config_file::load_config();

    match cli.command {
        Command::Collect { range, output } => collect(&config, range, &output, color).await,
        Command::Count {
            connections,
            output,
            top_k,
            min_occur,
        } => count(&config, &connections, &output, top_k, min_occur, color),
        Command::Stats {
            connections,
            counts,
            format,
            output,
        } => stats(&config, &connections, counts.as_deref(), format, output),
        Command::Classify { raw } => classify(&config, &raw, cli.verbose > 0, color),
        Command::Config { action } => config_command(&config, action),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn pipeline(config: &ConfigFile) -> anyhow::Result<AffiliationPipeline> {
    let affiliation = config
        .affiliation_config()
        .context("invalid tokenizer/taxonomy configuration")?;
    Ok(AffiliationPipeline::new(affiliation))
}

fn frequency_options(
    config: &ConfigFile,
    top_k: Option<usize>,
    min_occur: Option<usize>,
) -> FrequencyOptions {
    let defaults = FrequencyOptions::default();
    let collect = config.collect.as_ref();
    FrequencyOptions {
        top_k: top_k
            .or_else(|| collect.and_then(|c| c.top_k))
            .unwrap_or(defaults.top_k),
        min_occur: min_occur
            .or_else(|| collect.and_then(|c| c.min_occur))
            .unwrap_or(defaults.min_occur),
    }
}

async fn collect(
    config: &ConfigFile,
    range: Vec<String>,
    output: &Path,
    color: ColorMode,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let sources = config.institutions.as_deref().unwrap_or_default();
    if sources.is_empty() {
        anyhow::bail!(
            "No institutions configured. Add [[institutions]] entries to {} (see: collabmap config init)",
            config_file::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ".collabmap.toml".to_string())
        );
    }

    let mut options = CollectOptions::from_config(config.collect.as_ref());
    if let Ok(proxy) = std::env::var("COLLABMAP_PROXY")
        && !proxy.trim().is_empty()
    {
        options.proxy = Some(proxy.trim().to_string());
    }
    let collector = Collector::new(options)?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:40.cyan/dim}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let aliases = (!range.is_empty()).then_some(range.as_slice());
    let on_event = |event: collabmap_collect::CollectEvent| {
        use collabmap_collect::CollectEvent;
        match &event {
            CollectEvent::InstitutionStarted {
                institution,
                members,
            } => {
                bar.reset();
                bar.set_length(*members as u64);
                bar.set_message(institution.clone());
            }
            CollectEvent::MemberCollected { .. } | CollectEvent::MemberSkipped { .. } => {
                bar.inc(1)
            }
            _ => {}
        }
        if let Some(line) = output::describe_event(&event, color) {
            bar.println(line);
        }
    };

    let connections: Connections = tokio::select! {
        c = collector.collect(sources, aliases, on_event) => c,
        _ = tokio::signal::ctrl_c() => {
            bar.abandon_with_message("interrupted");
            anyhow::bail!("Interrupted; nothing written");
        }
    };
    bar.finish_and_clear();

    save_json(&connections, output)?;
    let members: usize = connections.values().map(|m| m.len()).sum();
    println!(
        "Collected {} members across {} institutions → {}",
        members,
        connections.len(),
        output.display()
    );
    Ok(())
}

fn count(
    config: &ConfigFile,
    connections: &Path,
    output: &Path,
    top_k: Option<usize>,
    min_occur: Option<usize>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let pipeline = pipeline(config)?;
    let connections: Connections = load_json(connections)?;
    let options = frequency_options(config, top_k, min_occur);
    tracing::debug!(top_k = options.top_k, min_occur = options.min_occur, "counting collaborators");

    let counts = compute_frequency(&connections, &pipeline, options);
    save_json(&counts, output)?;

    let mut stdout = std::io::stdout();
    output::print_counts_summary(&mut stdout, &counts, 5, color)?;
    writeln!(stdout, "Counts written to {}", output.display())?;
    Ok(())
}

fn stats(
    config: &ConfigFile,
    connections: &Path,
    counts: Option<&Path>,
    format: Option<FormatArg>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let connections: Connections = load_json(connections)?;
    let counts: CountsByInstitution = match counts {
        Some(path) => load_json(path)?,
        None => {
            let pipeline = pipeline(config)?;
            compute_frequency(&connections, &pipeline, frequency_options(config, None, None))
        }
    };

    let stats = compute_stats(&connections, &counts);
    let format = resolve_format(format, output.as_deref());
    let content = export_stats(&stats, format).map_err(anyhow::Error::msg)?;

    match output {
        Some(path) => write_report(&content, &path).map_err(anyhow::Error::msg)?,
        None => print!("{}", content),
    }
    Ok(())
}

fn resolve_format(format: Option<FormatArg>, output: Option<&Path>) -> ExportFormat {
    if let Some(f) = format {
        return f.into();
    }
    output
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension)
        .unwrap_or(ExportFormat::Text)
}

fn classify(
    config: &ConfigFile,
    raw: &[String],
    verbose: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    let pipeline = pipeline(config)?;
    let mut stdout = std::io::stdout();
    for r in raw {
        let result = pipeline.canonicalize(r);
        output::print_classification(&mut stdout, r, result.as_ref(), verbose, color)?;
    }
    Ok(())
}

fn config_command(config: &ConfigFile, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Path => {
            let path = config_file::config_path().context("Could not determine config directory")?;
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Init { force } => {
            let path = config_file::config_path().context("Could not determine config directory")?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            config_file::save_config_to(&starter_config(), &path).map_err(anyhow::Error::msg)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Built-in defaults spelled out, plus one example institution.
fn starter_config() -> ConfigFile {
    let defaults = CollectOptions::default();
    let affiliation = collabmap_core::AffiliationConfig::default();

    ConfigFile {
        tokenizer: Some(TokenizerConfig {
            delimiters: Some(
                affiliation
                    .tokenizer()
                    .delimiters()
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            ),
            extra_delimiters: None,
        }),
        classifier: Some(ClassifierConfig {
            match_mode: Some(MatchMode::default()),
        }),
        taxonomy: Some(
            KeywordTaxonomy::default()
                .categories()
                .iter()
                .map(|c| CategoryConfig {
                    label: c.label.clone(),
                    kind: c.kind,
                    keywords: c.keywords.clone(),
                })
                .collect(),
        ),
        collect: Some(CollectConfig {
            top_k: Some(defaults.top_k),
            min_occur: Some(FrequencyOptions::default().min_occur),
            max_attempts: Some(defaults.policy.max_attempts),
            timeout_secs: Some(defaults.policy.timeout.as_secs()),
            delay_min_ms: Some(defaults.delay_min.as_millis() as u64),
            delay_max_ms: Some(defaults.delay_max.as_millis() as u64),
            proxy: None,
            user_agents: None,
            search_urls: Some(defaults.search_urls),
            coauthor_selector: Some(defaults.coauthor_selector),
        }),
        institutions: Some(vec![InstitutionSource {
            name: "Zhejiang University".to_string(),
            alias: "ZJU".to_string(),
            url: "https://example.edu/faculty".to_string(),
            selector: "ul.faculty li a".to_string(),
            name_order: NameOrder::GivenFirst,
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_resolution() {
        assert_eq!(resolve_format(Some(FormatArg::Json), Some(Path::new("x.csv"))), ExportFormat::Json);
        assert_eq!(resolve_format(None, Some(Path::new("out/stats.CSV"))), ExportFormat::Csv);
        assert_eq!(resolve_format(None, Some(Path::new("stats"))), ExportFormat::Text);
        assert_eq!(resolve_format(None, None), ExportFormat::Text);
    }

    #[test]
    fn frequency_options_precedence() {
        let config = ConfigFile {
            collect: Some(CollectConfig {
                top_k: Some(3),
                min_occur: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            frequency_options(&config, Some(7), None),
            FrequencyOptions {
                top_k: 7,
                min_occur: 2
            }
        );
        assert_eq!(
            frequency_options(&ConfigFile::default(), None, None),
            FrequencyOptions::default()
        );
    }

    #[test]
    fn starter_config_round_trips_and_builds() {
        let starter = starter_config();
        let text = toml::to_string_pretty(&starter).unwrap();
        let back: ConfigFile = toml::from_str(&text).unwrap();
        assert_eq!(back, starter);

        let affiliation = back.affiliation_config().unwrap();
        assert_eq!(affiliation.taxonomy(), &KeywordTaxonomy::default());
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from(["collabmap", "--no-color", "collect", "--range", "zju,thu"])
            .unwrap();
        assert!(cli.no_color);
        match cli.command {
            Command::Collect { range, output } => {
                assert_eq!(range, vec!["zju", "thu"]);
                assert_eq!(output, PathBuf::from("connections.json"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["collabmap", "classify"]).is_err());
        let cli = Cli::try_parse_from(["collabmap", "stats", "--format", "csv", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
