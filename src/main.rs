use cabin_viewer::app::{run_gui, run_headless};
use cabin_viewer::io::config::Config;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "cabin-viewer")]
#[command(about = "Software-rasterized walk-through of a cabin in a moonlit forest")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render one frame to a PNG instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Output image for headless mode
    #[arg(short, long, value_name = "FILE", default_value = "cabin.png")]
    output: PathBuf,

    /// Tree placement seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Program state file (overrides the config)
    #[arg(long, value_name = "FILE")]
    state: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => {
                info!("Loaded config from '{}'.", path.display());
                config
            }
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            warn!("No config file given; using defaults.");
            Config::default()
        }
    };

    if let Some(seed) = cli.seed {
        config.scene.tree_seed = Some(seed);
    }
    if let Some(state) = cli.state {
        config.scene.state_file = state;
    }

    let result = if cli.headless {
        run_headless(config, &cli.output)
    } else {
        run_gui(config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
