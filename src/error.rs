// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Unified error type for ad-hoc application signing.
#[derive(Debug, Error)]
pub enum AdhocSignError {
    #[error("no action specified; pass --name or --list")]
    CliNoAction,

    #[error("{0}")]
    CliGeneralError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to locate the codesign executable: {0}")]
    MissingDependency(#[from] which::Error),

    #[error("application not found: {0}")]
    NotFound(PathBuf),

    #[error("refusing to operate on system application: {0}")]
    Forbidden(PathBuf),

    #[error("error walking directory: {0}")]
    DirectoryWalk(#[from] walkdir::Error),

    #[error("{0} invocation failed: {1}")]
    ToolFailure(&'static str, String),

    #[error("unable to resolve the current user's home directory")]
    NoHomeDirectory,
}
