use std::path::Path;

use anyhow::Result;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rutt_core::SettingsHandle;
use rutt_core::settings::load_settings;

/// Recharge le TOML dans `handle`. En cas d'erreur, l'ancien état reste publié.
///
/// Retourne `true` si un nouvel état a été publié.
pub fn reload_into(path: &Path, handle: &SettingsHandle) -> bool {
    match load_settings(path) {
        Ok(settings) => {
            handle.store(settings);
            log::info!("Settings rechargés depuis {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("Erreur de rechargement settings : {e:#}");
            false
        }
    }
}

/// Surveille le fichier settings et publie chaque version valide.
///
/// Retourne le Watcher (doit rester vivant tant que l'hôte tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
///
/// # Example
/// ```no_run
/// use rutt_core::SettingsHandle;
/// use rutt_control::hotreload::spawn_settings_watcher;
/// use std::path::Path;
///
/// let settings = SettingsHandle::default();
/// let _watcher = spawn_settings_watcher(Path::new("config/default.toml"), &settings);
/// ```
pub fn spawn_settings_watcher(
    settings_path: &Path,
    handle: &SettingsHandle,
) -> Result<impl Watcher + use<>> {
    let handle = handle.clone();
    let path = settings_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_))
        {
            reload_into(&path, &handle);
        }
    })?;

    watcher.watch(settings_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
