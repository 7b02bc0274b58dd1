//! # Preferences
//!
//! The color theme, stored as a bare string under `app_theme`.

use tracing::{debug, warn};

use storefront_core::Theme;

use crate::error::SyncResult;
use crate::persistence::{keys, read_or_absent, KeyValueStore};

/// Loads the saved theme. Missing, unreadable or unknown values give
/// [`Theme::Light`].
pub async fn load_theme(store: &dyn KeyValueStore) -> Theme {
    let Some(raw) = read_or_absent(store, keys::APP_THEME).await else {
        return Theme::default();
    };

    match raw.parse::<Theme>() {
        Ok(theme) => theme,
        Err(e) => {
            warn!(value = %raw, error = %e, "Unknown stored theme, using light");
            Theme::default()
        }
    }
}

pub async fn save_theme(store: &dyn KeyValueStore, theme: Theme) -> SyncResult<()> {
    store.set(keys::APP_THEME, theme.to_string()).await?;
    debug!(%theme, "Theme saved");
    Ok(())
}

/// Switches light/dark, persists the result and returns it.
pub async fn toggle_theme(store: &dyn KeyValueStore) -> SyncResult<Theme> {
    let next = load_theme(store).await.toggled();
    save_theme(store, next).await?;
    Ok(next)
}
