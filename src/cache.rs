// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence of the discovered application list.

use {
    crate::error::AdhocSignError,
    std::path::{Path, PathBuf},
};

/// File name of the cached application list under the home directory.
const CACHE_FILE_NAME: &str = ".adhocsign-apps";

/// A persisted candidate set: one absolute bundle path per line, UTF-8,
/// no header, replaced wholesale on refresh.
///
/// The cache never expires on its own. Staleness is purely a function of an
/// explicit refresh request or the record not existing yet, so the list can
/// drift from the filesystem until the operator forces a rebuild.
pub struct AppListCache {
    path: PathBuf,
}

impl AppListCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Construct an instance at the well-known home directory location.
    pub fn default_location() -> Result<Self, AdhocSignError> {
        let home = dirs::home_dir().ok_or(AdhocSignError::NoHomeDirectory)?;

        Ok(Self::new(home.join(CACHE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cache needs rebuilding.
    pub fn is_stale(&self, force: bool) -> bool {
        force || !self.path.exists()
    }

    /// Read the persisted candidate set, or `None` when no record exists.
    pub fn load(&self) -> Result<Option<Vec<PathBuf>>, AdhocSignError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = std::fs::read_to_string(&self.path)?;

        Ok(Some(
            data.lines()
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect(),
        ))
    }

    /// Replace the persisted candidate set with `apps`.
    pub fn store(&self, apps: &[PathBuf]) -> Result<(), AdhocSignError> {
        let mut data = String::new();

        for app in apps {
            data.push_str(&app.to_string_lossy());
            data.push('\n');
        }

        std::fs::write(&self.path, data)?;

        Ok(())
    }
}
