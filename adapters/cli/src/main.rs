#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the isometric garden editor.

mod app;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use iso_garden_catalog::SpriteManifest;
use iso_garden_rendering::{Presentation, RenderingBackend};
use iso_garden_rendering_macroquad::MacroquadBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{app::Editor, config::GardenConfig};

const WINDOW_TITLE: &str = "Isometric Garden";

/// Command-line options; each one overrides the matching configuration key.
#[derive(Debug, Parser)]
#[command(name = "iso-garden", version, about = "Isometric garden layout editor")]
struct Args {
    /// Configuration file; `garden.toml` is read when present.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Profile whose garden is edited; omit for an anonymous session.
    #[arg(long)]
    profile: Option<String>,
    /// Directory holding the local layout cache.
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
    /// JSON file used as the remote store.
    #[arg(long, value_name = "PATH")]
    remote_file: Option<PathBuf>,
    /// Treat the remote store as unreachable.
    #[arg(long)]
    offline: bool,
    /// Draw every plant with its colour fill.
    #[arg(long)]
    no_sprites: bool,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,
}

impl Args {
    fn apply_to(&self, config: &mut GardenConfig) {
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(remote_file) = &self.remote_file {
            config.remote_file = Some(remote_file.clone());
        }
    }
}

/// Entry point for the garden editor.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = GardenConfig::load(args.config.as_deref())
        .context("failed to load the editor configuration")?;
    args.apply_to(&mut config);
    info!(
        profile = config.profile.as_deref().unwrap_or("anonymous"),
        cache = %config.local_cache().path().display(),
        "starting garden editor"
    );

    let mut editor = Editor::open(&config, args.offline)?;

    let mut presentation = Presentation::new(WINDOW_TITLE);
    if !args.no_sprites {
        match SpriteManifest::from_path(&config.manifest, editor.catalog()) {
            Ok(manifest) => presentation = presentation.with_sprites(manifest),
            Err(error) => warn!(
                error = %format!("{error:#}"),
                "sprites unavailable; drawing colour fills"
            ),
        }
    }

    let mut backend = MacroquadBackend::new()
        .with_show_fps(args.show_fps)
        .with_sprite_loading(!args.no_sprites);
    if args.vsync {
        backend = backend.with_vsync(true);
    }

    backend.run(presentation, move |input, frames| editor.frame(input, frames))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_configuration_file() {
        let args = Args::parse_from([
            "iso-garden",
            "--profile",
            "ada",
            "--cache-dir",
            "/tmp/garden",
            "--offline",
        ]);
        let mut config = GardenConfig::parse("profile = \"bob\"\nremote_file = \"remote.json\"")
            .expect("valid config");
        args.apply_to(&mut config);

        assert!(args.offline);
        assert_eq!(config.profile.as_deref(), Some("ada"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/garden"));
        assert_eq!(config.remote_file, Some(PathBuf::from("remote.json")));
    }

    #[test]
    fn flags_default_to_an_anonymous_windowed_session() {
        let args = Args::parse_from(["iso-garden"]);
        assert!(args.profile.is_none());
        assert!(!args.no_sprites && !args.vsync && !args.show_fps);
    }
}
