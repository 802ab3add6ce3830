// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification of applications as system-provided or user-installed.

use {
    crate::{
        bundle::APPLE_AUTHORITY,
        tools::{BundleIdentifierSource, SigningTool},
    },
    log::debug,
    once_cell::sync::Lazy,
    std::path::{Path, PathBuf},
};

/// Root directory holding OS-provided applications.
pub static SYSTEM_APPLICATIONS_ROOT: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from("/System/Applications"));

/// Reverse-DNS prefix reserved for the OS vendor's bundle identifiers.
const APPLE_BUNDLE_ID_PREFIX: &str = "com.apple.";

/// Decides whether a path denotes a protected system application.
pub struct SystemAppClassifier<'a> {
    signing_tool: &'a dyn SigningTool,
    bundle_ids: &'a dyn BundleIdentifierSource,
    system_root: PathBuf,
}

impl<'a> SystemAppClassifier<'a> {
    pub fn new(
        signing_tool: &'a dyn SigningTool,
        bundle_ids: &'a dyn BundleIdentifierSource,
    ) -> Self {
        Self::with_system_root(signing_tool, bundle_ids, SYSTEM_APPLICATIONS_ROOT.clone())
    }

    /// Construct an instance with a non-default system applications root.
    pub fn with_system_root(
        signing_tool: &'a dyn SigningTool,
        bundle_ids: &'a dyn BundleIdentifierSource,
        system_root: PathBuf,
    ) -> Self {
        Self {
            signing_tool,
            bundle_ids,
            system_root,
        }
    }

    /// Whether `path` denotes a system application.
    ///
    /// First matching rule wins: location under the system applications
    /// root, an Apple signing authority, or a `com.apple.` bundle
    /// identifier. Evidence queries that fail are treated as non-matches,
    /// so this never errors; absent evidence defaults to "not a system
    /// application".
    pub fn is_system_application(&self, path: &Path) -> bool {
        if path.starts_with(&self.system_root) {
            return true;
        }

        if let Ok(info) = self.signing_tool.signature_info(path) {
            if info.contains(APPLE_AUTHORITY) {
                debug!("{} has an Apple signing authority", path.display());
                return true;
            }
        }

        if let Ok(identifier) = self.bundle_ids.bundle_identifier(path) {
            if identifier.starts_with(APPLE_BUNDLE_ID_PREFIX) {
                debug!("{} has bundle identifier {}", path.display(), identifier);
                return true;
            }
        }

        false
    }
}
