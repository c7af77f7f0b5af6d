use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use glam::Vec3;
use solidkit::gizmo::{Camera, HeadlessViewport, Viewport};
use solidkit::settings::Config;
use solidkit::{init_logging_with, run_scripted_session, Editor};

/// Config path from the first argument, else the platform default.
fn config_path() -> anyhow::Result<PathBuf> {
    match std::env::args_os().nth(1) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(Config::default_path()?),
    }
}

fn main() -> anyhow::Result<()> {
    let path = config_path()?;
    let config = Config::load_or_default(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    init_logging_with(&config.logging.level)?;
    tracing::info!("SolidKit {} (config: {})", solidkit::VERSION, path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();

    let report = local.block_on(&runtime, async {
        let viewport = Rc::new(HeadlessViewport::new(
            1,
            Camera::top(Vec3::ZERO, 10.0).with_gizmo_scale(config.interaction.gizmo_scale),
            1280.0,
            720.0,
        ));
        let editor = Editor::new(config, vec![viewport.clone() as Rc<dyn Viewport>])?;
        let journal = editor.journal();
        let report = run_scripted_session(&editor, &viewport).await;
        tokio::task::yield_now().await;
        journal.abort();
        report
    })?;

    for item in &report.items {
        tracing::info!("{}: {:?}", item.name, item.properties);
    }
    tracing::info!(
        "History: {:?} (redo available: {})",
        report.undo_names,
        report.can_redo
    );
    Ok(())
}
