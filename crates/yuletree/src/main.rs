mod cli;
mod gesture_feed;
mod paths;
mod run;
mod script;

use std::path::Path;

use anyhow::{Context, Result};
use cli::{Command, ConfigAction};
use paths::{load_scene_config, read_scene_config, AppPaths, ENV_CONFIG_DIR};

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Command::Run(args) => run::run(args),
        Command::Config(config_cmd) => handle_config_command(config_cmd.action),
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Where => run_config_where(),
        ConfigAction::Check { file } => run_config_check(&file),
        ConfigAction::Print { config } => run_config_print(config.as_deref()),
    }
}

fn run_config_where() -> Result<()> {
    let paths = AppPaths::discover()?;
    let scene_file = paths.scene_file();
    println!("Configuration:");
    println!("  config dir: {}", paths.config_dir().display());
    println!(
        "  scene file: {} ({})",
        scene_file.display(),
        if scene_file.is_file() {
            "present"
        } else {
            "missing; defaults apply"
        }
    );
    println!("  override:   set {ENV_CONFIG_DIR} to use another directory");
    Ok(())
}

fn run_config_check(file: &Path) -> Result<()> {
    let config = read_scene_config(file)?;
    println!(
        "{}: ok (ornaments={}, gifts={}, max_photos={}, seed={})",
        file.display(),
        config.counts.ornaments,
        config.counts.gifts,
        config.counts.max_photos,
        config.seed
    );
    Ok(())
}

fn run_config_print(explicit: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (config, origin) = load_scene_config(explicit, &paths)?;
    let rendered = config
        .to_toml_string()
        .context("failed to render configuration")?;
    println!("# source: {origin}");
    print!("{rendered}");
    Ok(())
}
