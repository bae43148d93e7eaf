//! User-directory resolution.
//!
//! When `USACLOUD_UPDATE_HOME` is set and non-empty it replaces the
//! platform-native config directory. The project-local
//! `.usacloud-update.toml` lookup is unaffected.

use std::path::PathBuf;

/// User-level base directory for configuration.
///
/// `USACLOUD_UPDATE_HOME` wins when set and non-empty, otherwise
/// `dirs::config_dir()/usacloud-update`.
pub fn user_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("USACLOUD_UPDATE_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs::config_dir().map(|d| d.join("usacloud-update"))
}
