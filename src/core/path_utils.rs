/*
 * Locates the per-user directories the tool keeps its settings in.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/*
 * The local (non-roaming) configuration directory for `app_name`, created if
 * it does not exist yet. No organization qualifier is used, so on Linux this
 * is `~/.config/<app_name>`. Returns `None` when the platform offers no home
 * directory or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!("PathUtils: Failed to create config directory {config_path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_path:?}");
    }
    Some(config_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remove_app_dir(app_name: &str) {
        if let Some(proj_dirs) = ProjectDirs::from("", "", app_name) {
            let dir = proj_dirs.config_local_dir();
            if dir.exists() {
                if let Err(e) = fs::remove_dir_all(dir) {
                    eprintln!("Test cleanup failed for {dir:?}: {e}");
                }
            }
        }
    }

    #[test]
    fn test_config_dir_is_created_and_then_reused() {
        // Arrange
        let unique_app_name = format!("TestApp_PathUtils_{}", rand::random::<u128>());

        // Act
        let first = get_base_app_config_local_dir(&unique_app_name);
        let second = get_base_app_config_local_dir(&unique_app_name);

        // Assert
        let first = first.expect("a config directory for a fresh app name");
        assert!(first.is_dir(), "{first:?} should have been created");
        assert!(
            first
                .to_string_lossy()
                .to_lowercase()
                .contains(&unique_app_name.to_lowercase())
        );
        assert_eq!(second, Some(first));

        remove_app_dir(&unique_app_name);
    }
}
