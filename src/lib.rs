//! Sushi - local 3D asset library
//!
//! Process shell around `sushi_core`: CLI dispatch, logging setup and the
//! command surface a GUI frontend binds to.

pub mod cli;
pub mod commands;
pub mod logging;

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use anyhow::Context;
use serde::Serialize;
use sushi_core::{LoggingEventSink, SharedEventSink, SharedPathProvider, SushiCore};

use cli::{Cli, Commands};

/// Application state
pub struct AppState {
    pub core: SushiCore,
    file_server_url: RwLock<Option<String>>,
}

impl AppState {
    pub fn new(core: SushiCore) -> Self {
        Self {
            core,
            file_server_url: RwLock::new(None),
        }
    }

    pub fn set_file_server_url(&self, url: Option<String>) {
        if let Ok(mut current) = self.file_server_url.write() {
            *current = url;
        }
    }

    pub fn file_server_url(&self) -> Option<String> {
        self.file_server_url.read().ok().and_then(|url| url.clone())
    }

    /// Row limit for the recent views
    pub fn recent_limit(&self) -> u32 {
        self.core.settings.library.recent_limit
    }
}

pub fn run(cli: Cli, provider: SharedPathProvider) -> anyhow::Result<()> {
    tracing::info!("Sushi starting, data directory {}", provider.app_data_dir().display());

    let event_sink: SharedEventSink = Arc::new(LoggingEventSink);
    let core = SushiCore::new(provider, event_sink).context("failed to open the metadata store")?;
    let state = Arc::new(AppState::new(core));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state),
        Commands::AddFolder { path } => print_json(&commands::add_watch_folder(
            &state,
            path.to_string_lossy().into_owned(),
        )?),
        Commands::RemoveFolder { folder_id } => {
            commands::remove_watch_folder(&state, folder_id)?;
            print_json(&serde_json::json!({ "removed": folder_id }))
        }
        Commands::Folders => print_json(&commands::get_watch_folders(&state)?),
        Commands::Rescan {
            folder_id: Some(folder_id),
        } => print_json(&commands::rescan_folder(&state, folder_id)?),
        Commands::Rescan { folder_id: None } => {
            print_json(&commands::rescan_all_folders(&state)?)
        }
        Commands::Assets {
            tags,
            any,
            favorites,
            untagged,
        } => {
            let assets = if favorites {
                commands::get_favorited_assets(&state)?
            } else if untagged {
                commands::get_untagged_assets(&state)?
            } else if tags.is_empty() {
                commands::get_assets(&state)?
            } else if any {
                let ids: HashSet<i64> = commands::get_asset_ids_by_tags(&state, tags)?
                    .into_iter()
                    .collect();
                commands::get_assets(&state)?
                    .into_iter()
                    .filter(|asset| ids.contains(&asset.asset_id))
                    .collect()
            } else {
                commands::get_assets_by_tags(&state, tags)?
            };
            print_json(&assets)
        }
        Commands::Tags => print_json(&commands::get_tags_with_counts(&state)?),
        Commands::Stats => print_json(&commands::get_database_stats(&state)?),
    }
}

/// Start the file server, kick off the startup scan and block until Ctrl-C
fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start the tokio runtime")?;

    runtime.block_on(async move {
        let server = state
            .core
            .start_file_server()
            .await
            .context("failed to start the file server")?;
        state.set_file_server_url(Some(server.base_url()));

        if state.core.settings.scan.scan_on_startup {
            let scan_state = state.clone();
            tokio::task::spawn_blocking(move || match scan_state.core.scanner.scan_all() {
                Ok(report) => tracing::info!(
                    "startup scan done: {} files, {} pruned, {} folders failed",
                    report.total_found(),
                    report.total_pruned(),
                    report.failures.len()
                ),
                Err(e) => tracing::error!("startup scan failed: {}", e),
            });
        }

        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;

        tracing::info!("shutting down");
        state.core.shutdown();
        state.set_file_server_url(None);
        server.shutdown().await?;
        Ok::<(), anyhow::Error>(())
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use sushi_core::DataHomePathProvider;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("sushi").chain(args.iter().copied()))
    }

    #[test]
    fn test_run_persists_across_invocations() {
        let tmp = TempDir::new().unwrap();
        let models = tmp.path().join("models");
        fs::create_dir_all(&models).unwrap();
        fs::write(models.join("crate.glb"), b"glTF").unwrap();
        let provider: SharedPathProvider =
            Arc::new(DataHomePathProvider::with_base_dir(tmp.path().join("data")));

        run(cli(&["add-folder", models.to_str().unwrap()]), provider.clone()).unwrap();
        run(cli(&["assets", "--untagged"]), provider.clone()).unwrap();
        run(cli(&["rescan"]), provider.clone()).unwrap();

        let core = SushiCore::new(provider.clone(), Arc::new(sushi_core::NoOpEventSink)).unwrap();
        let stats = core.db.stats().unwrap();
        assert_eq!(stats.folder_count, 1);
        assert_eq!(stats.asset_count, 1);
        let folder_id = core.registry.list().unwrap()[0].folder_id;
        drop(core);

        let folder_arg = folder_id.to_string();
        run(cli(&["remove-folder", folder_arg.as_str()]), provider.clone()).unwrap();
        assert!(run(cli(&["rescan", folder_arg.as_str()]), provider).is_err());
    }

    #[test]
    fn test_recent_limit_follows_settings() {
        let tmp = TempDir::new().unwrap();
        let provider: SharedPathProvider =
            Arc::new(DataHomePathProvider::with_base_dir(tmp.path().join("data")));
        fs::create_dir_all(provider.app_data_dir()).unwrap();
        fs::write(provider.settings_path(), r#"{"library":{"recentLimit":5}}"#).unwrap();

        let core = SushiCore::new(provider, Arc::new(sushi_core::NoOpEventSink)).unwrap();
        let state = AppState::new(core);
        assert_eq!(state.recent_limit(), 5);
        assert!(state.file_server_url().is_none());
    }
}
