use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use edgepanel::actor::workspace_preview::PreviewOptions;
use edgepanel::common::config::{Config, config_file};
use edgepanel::common::log::init_logging;
use edgepanel::layout_engine::hot_corner::HotCornerPolicy;
use edgepanel::layout_engine::panel_settings::PanelSettings;
use edgepanel::model::server::ResolveReport;
use edgepanel::sys::screen::TopologySnapshot;
use edgepanel::sys::settings::MemorySettings;
use tracing::debug;

#[derive(Parser)]
#[command(name = "edgepanel", version, about = "Inspect edge panel layouts offline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve panels, hot corners and preview sizes for a topology
    Resolve {
        /// Config file; defaults to the user config, or built-in defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Monitor layout in RON
        #[arg(long)]
        topology: PathBuf,
        /// Number of workspaces shown in each preview
        #[arg(long, default_value_t = 4)]
        workspaces: usize,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Parse and validate a config file
    CheckConfig { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Tree,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::read(path).with_context(|| format!("reading config {}", path.display()));
    }
    let default = config_file();
    if default.exists() {
        return Config::read(&default)
            .with_context(|| format!("reading config {}", default.display()));
    }
    debug!(path = %default.display(), "no user config; using defaults");
    Ok(Config::default())
}

fn resolve(
    config: &Config,
    topology: &Path,
    workspaces: usize,
    format: Format,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(topology)
        .with_context(|| format!("reading topology {}", topology.display()))?;
    let snapshot = TopologySnapshot::from_ron(&text)
        .with_context(|| format!("parsing topology {}", topology.display()))?;

    let store = MemorySettings::from_config(config);
    let policy = HotCornerPolicy {
        enabled: config.panel.enable_hot_corners,
        force: config.panel.force_hot_corner,
    };
    let report = ResolveReport::build(
        &PanelSettings::load(&store),
        &PreviewOptions::load(&store),
        &snapshot,
        policy,
        workspaces,
    );
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Tree => {
            let mut out = String::new();
            ascii_tree::write_tree(&mut out, &report.tree()).context("rendering tree")?;
            print!("{out}");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    sigpipe::reset();
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve { config, topology, workspaces, format } => {
            let config = load_config(config.as_deref())?;
            resolve(&config, &topology, workspaces, format)
        }
        Command::CheckConfig { path } => {
            let config = Config::read(&path)
                .with_context(|| format!("checking config {}", path.display()))?;
            println!("{}: ok ({} settings)", path.display(), config.to_settings().len());
            Ok(())
        }
    }
}
