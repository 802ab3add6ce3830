// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Application bundles and their signature state.

use {
    crate::tools::{BundleIdentifierSource, SigningTool},
    std::{
        fmt,
        path::{Path, PathBuf},
    },
};

/// Substring of a signing authority identifying the OS vendor.
pub const APPLE_AUTHORITY: &str = "Apple";

/// Signature state of an application bundle, derived on demand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureState {
    /// No signature present (or the bundle could not be read).
    Unsigned,

    /// Signed, but not by an Apple authority.
    SignedUnknown,

    /// Signed by an Apple authority.
    SignedApple,
}

impl SignatureState {
    /// Whether any signature is present.
    pub fn is_signed(&self) -> bool {
        !matches!(self, Self::Unsigned)
    }
}

impl fmt::Display for SignatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned => f.write_str("unsigned"),
            Self::SignedUnknown => f.write_str("signed (non-Apple authority)"),
            Self::SignedApple => f.write_str("signed (Apple)"),
        }
    }
}

/// An installed application, identified by its bundle directory path.
#[derive(Clone, Debug)]
pub struct ApplicationBundle {
    path: PathBuf,
}

impl ApplicationBundle {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The bundle's root directory. This is its identity.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The on-disk bundle name, including the `.app` suffix.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Resolve the bundle identifier via the scripting bridge.
    ///
    /// Returns `None` when the identifier cannot be determined.
    pub fn bundle_identifier(&self, source: &dyn BundleIdentifierSource) -> Option<String> {
        source.bundle_identifier(&self.path).ok()
    }

    /// Derive the current signature state by probing the signing tool.
    ///
    /// A failed probe is indistinguishable from an absent signature and is
    /// reported as unsigned.
    pub fn signature_state(&self, tool: &dyn SigningTool) -> SignatureState {
        match tool.signature_info(&self.path) {
            Ok(info) if info.contains(APPLE_AUTHORITY) => SignatureState::SignedApple,
            Ok(_) => SignatureState::SignedUnknown,
            Err(_) => SignatureState::Unsigned,
        }
    }
}
