// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ad-hoc code signing of user-installed macOS applications.
//!
//! This crate discovers applications a user installed themselves,
//! distinguishes them from Apple/system applications, and drives the OS
//! `codesign` tool to apply deep ad-hoc signatures over whole bundles,
//! optionally copying the bundle aside first.
//!
//! Signing itself is delegated entirely to `codesign`: this crate does not
//! produce signatures, verify signature validity beyond presence, or manage
//! certificates and entitlement semantics. The interesting logic lives in
//! the classification and discovery pipeline:
//!
//! * [SystemAppClassifier] decides whether a path denotes a protected
//!   system application (location under the system applications root, an
//!   Apple signing authority, or a `com.apple.` bundle identifier).
//! * [AppDiscovery] builds a deterministic, deduplicated candidate set from
//!   the applications directories and the filesystem metadata index.
//! * [AppListCache] persists that set so repeated invocations skip the
//!   scan until the operator forces a refresh.
//!
//! External OS tools (`codesign`, `mdfind`, `osascript`) are modeled as
//! narrow traits in [tools] with a shell-out production implementation,
//! [OsTools], so all decision logic is unit testable against fakes.

pub mod bundle;
pub mod cache;
pub mod classifier;
pub mod discovery;
pub mod error;
pub mod selector;
pub mod signing;
#[cfg(test)]
pub(crate) mod testutil;
pub mod tools;

pub use crate::{
    bundle::{ApplicationBundle, SignatureState},
    cache::AppListCache,
    classifier::SystemAppClassifier,
    discovery::AppDiscovery,
    error::AdhocSignError,
    selector::{AppChooser, TerminalChooser},
    signing::{BundleSigner, SignOutcome, SignRequest},
    tools::{find_codesign, BundleIdentifierSource, MetadataSearch, OsTools, SigningTool},
};
