// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Choosing one application from a candidate set.

use {
    crate::error::AdhocSignError,
    std::path::{Path, PathBuf},
};

/// Chooses one entry from a candidate list.
///
/// Separated from discovery so non-interactive callers (tests, scripts
/// embedding the library) can supply their own selection policy.
pub trait AppChooser {
    /// Choose one entry from a non-empty candidate list, returning its index.
    fn choose(&self, apps: &[PathBuf]) -> Result<usize, AdhocSignError>;
}

/// Interactive chooser presenting a numbered terminal menu.
///
/// Re-prompts until a valid entry is selected. There is deliberately no
/// non-interactive fallback here; batch callers resolve by name instead.
pub struct TerminalChooser;

impl AppChooser for TerminalChooser {
    fn choose(&self, apps: &[PathBuf]) -> Result<usize, AdhocSignError> {
        let items = apps.iter().map(|app| menu_label(app)).collect::<Vec<_>>();

        let index = dialoguer::Select::new()
            .with_prompt("Select an application")
            .items(&items)
            .default(0)
            .interact()?;

        Ok(index)
    }
}

/// Menu label for a bundle path: the bundle name, full path on failure.
fn menu_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
