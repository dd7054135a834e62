use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paneconfig::EditConfig;
use renderer::{EditWindowConfig, Renderer};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Explicit(path) => write!(f, "{} (--config)", path.display()),
            ConfigOrigin::Discovered(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Defaults => f.write_str("built-in defaults"),
        }
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (mut config, origin) = load_config(args.config.as_deref(), &paths)?;
    apply_overrides(&mut config, &args)?;
    tracing::info!(config = %origin, "configuration loaded");

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let window_config = EditWindowConfig::from_config(&config, args.shader_compiler);
    for pane in &window_config.panes {
        tracing::debug!(
            pane = %pane.label,
            vertex = %pane.vertex_shader,
            fragment = %pane.fragment_shader,
            "pane shaders"
        );
    }

    Renderer::new(window_config).run()
}

/// Loads `explicit` when given, else `panedit.toml` from the config
/// directory, else the built-in defaults.
pub fn load_config(explicit: Option<&Path>, paths: &AppPaths) -> Result<(EditConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        let config = EditConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok((config, ConfigOrigin::Explicit(path.to_path_buf())));
    }

    let discovered = paths.config_file();
    if discovered.is_file() {
        let config = EditConfig::load(&discovered)
            .with_context(|| format!("failed to load config {}", discovered.display()))?;
        return Ok((config, ConfigOrigin::Discovered(discovered)));
    }

    Ok((EditConfig::default(), ConfigOrigin::Defaults))
}

fn apply_overrides(config: &mut EditConfig, args: &RunArgs) -> Result<()> {
    if let Some(size) = args.size {
        config.window.width = size.width;
        config.window.height = size.height;
    }
    if let Some(title) = &args.title {
        config.window.title = title.clone();
    }
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
