// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deterministic fakes for the external tool interfaces.

use {
    crate::{
        error::AdhocSignError,
        selector::AppChooser,
        tools::{BundleIdentifierSource, MetadataSearch, SigningTool},
    },
    std::{
        cell::RefCell,
        collections::HashMap,
        path::{Path, PathBuf},
    },
};

pub fn temp_dir() -> Result<(tempfile::TempDir, PathBuf), AdhocSignError> {
    let td = tempfile::Builder::new().prefix("adhoc-sign-").tempdir()?;
    let path = td.path().to_path_buf();

    Ok((td, path))
}

/// Fake signing tool with canned signature descriptions.
///
/// Paths without a canned description behave as unsigned: the info query
/// errors, the way `codesign -dvv` does.
#[derive(Default)]
pub struct FakeSigningTool {
    pub authorities: HashMap<PathBuf, String>,
    pub signed: RefCell<Vec<PathBuf>>,
    pub entitlements: RefCell<Vec<Option<PathBuf>>>,
    pub fail_signing: bool,
}

impl FakeSigningTool {
    pub fn with_authority(mut self, path: impl AsRef<Path>, info: &str) -> Self {
        self.authorities
            .insert(path.as_ref().to_path_buf(), info.to_string());
        self
    }
}

impl SigningTool for FakeSigningTool {
    fn signature_info(&self, path: &Path) -> Result<String, AdhocSignError> {
        self.authorities.get(path).cloned().ok_or_else(|| {
            AdhocSignError::ToolFailure("codesign", "code object is not signed at all".to_string())
        })
    }

    fn sign_bundle(
        &self,
        path: &Path,
        entitlements: Option<&Path>,
    ) -> Result<(), AdhocSignError> {
        if self.fail_signing {
            return Err(AdhocSignError::ToolFailure(
                "codesign",
                "the codesign_allocate helper tool cannot be found".to_string(),
            ));
        }

        self.signed.borrow_mut().push(path.to_path_buf());
        self.entitlements
            .borrow_mut()
            .push(entitlements.map(|path| path.to_path_buf()));

        Ok(())
    }
}

/// Fake scripting bridge with canned bundle identifiers.
#[derive(Default)]
pub struct FakeBundleIds {
    pub identifiers: HashMap<PathBuf, String>,
}

impl FakeBundleIds {
    pub fn with_identifier(mut self, path: impl AsRef<Path>, identifier: &str) -> Self {
        self.identifiers
            .insert(path.as_ref().to_path_buf(), identifier.to_string());
        self
    }
}

impl BundleIdentifierSource for FakeBundleIds {
    fn bundle_identifier(&self, path: &Path) -> Result<String, AdhocSignError> {
        self.identifiers.get(path).cloned().ok_or_else(|| {
            AdhocSignError::ToolFailure("osascript", "Unable to find application".to_string())
        })
    }
}

/// Fake metadata index with a canned result set.
#[derive(Default)]
pub struct FakeMetadataSearch {
    bundles: Vec<PathBuf>,
    fail: bool,
}

impl FakeMetadataSearch {
    pub fn with_bundles(bundles: Vec<PathBuf>) -> Self {
        Self {
            bundles,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            bundles: vec![],
            fail: true,
        }
    }
}

impl MetadataSearch for FakeMetadataSearch {
    fn application_bundles(&self) -> Result<Vec<PathBuf>, AdhocSignError> {
        if self.fail {
            return Err(AdhocSignError::ToolFailure(
                "mdfind",
                "indexing disabled".to_string(),
            ));
        }

        Ok(self.bundles.clone())
    }
}

/// Chooser always returning a fixed index.
pub struct FixedChooser(pub usize);

impl AppChooser for FixedChooser {
    fn choose(&self, _apps: &[PathBuf]) -> Result<usize, AdhocSignError> {
        Ok(self.0)
    }
}
