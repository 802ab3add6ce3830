// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation, backup, and dispatch of signing invocations.

use {
    crate::{
        bundle::{ApplicationBundle, SignatureState},
        classifier::SystemAppClassifier,
        error::AdhocSignError,
        tools::SigningTool,
    },
    log::warn,
    std::path::{Path, PathBuf},
};

/// Format of the timestamp appended to backup directory names.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parameters for one signing invocation. Never persisted.
#[derive(Clone, Debug)]
pub struct SignRequest {
    path: PathBuf,
    entitlements: Option<PathBuf>,
    force: bool,
    backup: bool,
}

impl SignRequest {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entitlements: None,
            force: false,
            backup: false,
        }
    }

    /// Entitlements file to pass through to the signing tool.
    pub fn entitlements(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.entitlements = Some(path.as_ref().to_path_buf());
        self
    }

    /// Re-sign even when a signature is already present.
    pub fn force(&mut self, force: bool) -> &mut Self {
        self.force = force;
        self
    }

    /// Copy the bundle aside before any mutation.
    pub fn backup(&mut self, backup: bool) -> &mut Self {
        self.backup = backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of a signing invocation that did not error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignOutcome {
    /// A fresh ad-hoc signature was applied.
    Signed,

    /// A signature was already present and `force` was not requested.
    AlreadySigned,
}

/// Signs application bundles after validating them.
pub struct BundleSigner<'a> {
    signing_tool: &'a dyn SigningTool,
    classifier: &'a SystemAppClassifier<'a>,
}

impl<'a> BundleSigner<'a> {
    pub fn new(signing_tool: &'a dyn SigningTool, classifier: &'a SystemAppClassifier<'a>) -> Self {
        Self {
            signing_tool,
            classifier,
        }
    }

    /// Shared precondition for signing and check-only flows.
    ///
    /// The target must exist as a directory and must not be a system
    /// application.
    fn validate(&self, path: &Path) -> Result<(), AdhocSignError> {
        if !path.is_dir() {
            return Err(AdhocSignError::NotFound(path.to_path_buf()));
        }

        if self.classifier.is_system_application(path) {
            return Err(AdhocSignError::Forbidden(path.to_path_buf()));
        }

        Ok(())
    }

    /// Report the signature state of a bundle without mutating anything.
    pub fn check(&self, path: &Path) -> Result<SignatureState, AdhocSignError> {
        self.validate(path)?;

        Ok(ApplicationBundle::new(path).signature_state(self.signing_tool))
    }

    /// Sign a bundle per the request.
    ///
    /// The backup, when requested, is taken before any signature mutation.
    /// Without `force`, an existing signature short-circuits to
    /// [SignOutcome::AlreadySigned] with no signing performed. A failing
    /// signing invocation propagates as-is; a partially applied deep
    /// signature is left in place.
    pub fn sign(&self, request: &SignRequest) -> Result<SignOutcome, AdhocSignError> {
        self.validate(request.path())?;

        if request.backup {
            let destination = backup_bundle(request.path())?;
            warn!(
                "backed up {} to {}",
                request.path().display(),
                destination.display()
            );
        }

        if !request.force
            && ApplicationBundle::new(request.path())
                .signature_state(self.signing_tool)
                .is_signed()
        {
            return Ok(SignOutcome::AlreadySigned);
        }

        self.signing_tool
            .sign_bundle(request.path(), request.entitlements.as_deref())?;

        Ok(SignOutcome::Signed)
    }
}

/// Copy a bundle to a sibling directory carrying a second-granularity
/// timestamp suffix.
///
/// Two backups of the same bundle within one second collide; this is a
/// known limitation.
pub fn backup_bundle(path: &Path) -> Result<PathBuf, AdhocSignError> {
    let name = path
        .file_name()
        .ok_or_else(|| AdhocSignError::NotFound(path.to_path_buf()))?
        .to_string_lossy();

    let timestamp = chrono::Local::now().format(BACKUP_TIMESTAMP_FORMAT);
    let destination = path.with_file_name(format!("{}_backup_{}", name, timestamp));

    copy_directory(path, &destination)?;

    Ok(destination)
}

/// Recursively copy a directory, preserving symlinks as symlinks.
fn copy_directory(source: &Path, destination: &Path) -> Result<(), AdhocSignError> {
    for entry in walkdir::WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("path prefix strip should have worked");
        let target = destination.join(relative);

        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())?;

            #[cfg(unix)]
            std::os::unix::fs::symlink(link, &target)?;
            #[cfg(not(unix))]
            let _ = link;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}
