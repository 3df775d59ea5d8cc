use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cli::{logging, report};
use labeler_core::analyzer;
use labeler_core::config::{self, AppConfig};
use labeler_core::pipeline;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Label(args) => run_label(cfg, args).await,
        Commands::Analyze { output, top, json } => {
            let path = output.unwrap_or(cfg.output.path);
            run_analyze(&path, top, json)
        }
    }
}

#[derive(Parser)]
#[command(name = "image-labeler")]
#[command(about = "Label images in a folder with a cloud recognition service", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder and write one label line per image
    Label(LabelArgs),
    /// Count label occurrences in a results file
    Analyze {
        /// Results file (defaults to output.path from config)
        #[arg(short, long)]
        output: Option<String>,
        /// Only show the N most frequent labels
        #[arg(long)]
        top: Option<usize>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct LabelArgs {
    /// Folder where images are located
    #[arg(short, long)]
    folder: Option<String>,
    /// File to store image labels
    #[arg(short, long)]
    output: Option<String>,
    /// Maximum number of concurrent service calls
    #[arg(long)]
    pool_size: Option<usize>,
    /// API key for the recognition service
    #[arg(long, env = "LABELER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Provider: google|openai|noop
    #[arg(long)]
    provider: Option<String>,
    /// Maximum labels requested per image
    #[arg(long)]
    max_results: Option<usize>,
    /// Descend into subfolders
    #[arg(long, default_value_t = false)]
    recursive: bool,
    /// Overwrite the results file instead of appending
    #[arg(long, default_value_t = false)]
    truncate: bool,
    /// Print label frequencies of the results file afterwards
    #[arg(long, default_value_t = false)]
    analyze: bool,
    /// Output JSON summary
    #[arg(long)]
    json: bool,
}

fn apply_overrides(cfg: &mut AppConfig, args: &LabelArgs) {
    if let Some(folder) = &args.folder {
        cfg.scan.folder = folder.clone();
    }
    if let Some(output) = &args.output {
        cfg.output.path = output.clone();
    }
    if let Some(n) = args.pool_size {
        cfg.workers.pool_size = n;
    }
    if let Some(key) = &args.api_key {
        cfg.provider.api_key = Some(key.clone());
    }
    if let Some(name) = &args.provider {
        cfg.provider.name = name.to_lowercase();
    }
    if let Some(n) = args.max_results {
        cfg.provider.max_results = n;
    }
    if args.recursive {
        cfg.scan.recursive = true;
    }
    if args.truncate {
        cfg.output.append = false;
    }
}

async fn run_label(mut cfg: AppConfig, args: LabelArgs) -> Result<()> {
    apply_overrides(&mut cfg, &args);
    info!("Extracting image labels from: {}.", cfg.scan.folder);

    let summary = pipeline::run(&cfg).await?;
    if args.json {
        let mut summary_json = report::summary_json(&summary, &cfg.output.path);
        if args.analyze {
            let counts = analyzer::count_labels(Path::new(&cfg.output.path))?;
            if let Some(obj) = summary_json.as_object_mut() {
                obj.insert("labels".into(), report::counts_json(&counts));
            }
        }
        println!("{}", serde_json::to_string_pretty(&summary_json)?);
    } else {
        println!("{}", report::summary_text(&summary, &cfg.output.path));
        if args.analyze {
            info!("Analyzing images from {}.", cfg.output.path);
            let counts = analyzer::count_labels(Path::new(&cfg.output.path))?;
            println!("{}", report::counts_text(&counts));
        }
    }
    info!("Run completed.");
    Ok(())
}

fn run_analyze(path: &str, top: Option<usize>, json: bool) -> Result<()> {
    let counts = analyzer::count_labels(Path::new(path))?;
    let shown = report::limit(&counts, top);
    if json {
        println!("{}", serde_json::to_string_pretty(&report::counts_json(shown))?);
    } else {
        println!("{}", report::counts_text(shown));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "image-labeler",
            "label",
            "--folder",
            "art",
            "--pool-size",
            "3",
            "--provider",
            "NOOP",
            "--truncate",
            "--recursive",
        ])
        .unwrap();
        let Commands::Label(args) = cli.command else {
            panic!("expected label command");
        };
        let mut cfg = AppConfig::default();
        apply_overrides(&mut cfg, &args);
        assert_eq!(cfg.scan.folder, "art");
        assert_eq!(cfg.workers.pool_size, 3);
        assert_eq!(cfg.provider.name, "noop");
        assert!(!cfg.output.append);
        assert!(cfg.scan.recursive);
        assert_eq!(cfg.output.path, config::DEFAULT_OUTPUT);
    }

    #[test]
    fn analyze_parses_top() {
        let cli = Cli::try_parse_from(["image-labeler", "analyze", "--top", "5", "--json"]).unwrap();
        match cli.command {
            Commands::Analyze { top, json, output } => {
                assert_eq!(top, Some(5));
                assert!(json);
                assert!(output.is_none());
            }
            _ => panic!("expected analyze command"),
        }
    }
}
