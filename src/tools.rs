// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces to the external OS tools this crate drives.
//!
//! Each tool is modeled as a narrow trait so that the decision logic built
//! on top of it can be exercised against deterministic fakes. The production
//! implementations shell out to `codesign`, `mdfind`, and `osascript`.

use {
    crate::error::AdhocSignError,
    log::{debug, warn},
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
    },
};

/// Metadata index query matching macOS application bundles.
const APPLICATION_BUNDLE_QUERY: &str =
    "kMDItemContentType == \"com.apple.application-bundle\"";

/// Interface to the OS code signing tool.
pub trait SigningTool {
    /// Obtain the human readable signature description for a bundle.
    ///
    /// Errors when the bundle carries no signature or cannot be read.
    fn signature_info(&self, path: &Path) -> Result<String, AdhocSignError>;

    /// Apply a deep ad-hoc signature over an entire bundle.
    fn sign_bundle(
        &self,
        path: &Path,
        entitlements: Option<&Path>,
    ) -> Result<(), AdhocSignError>;
}

/// Interface to the filesystem metadata index.
pub trait MetadataSearch {
    /// Enumerate application bundle paths known to the metadata index.
    fn application_bundles(&self) -> Result<Vec<PathBuf>, AdhocSignError>;
}

/// Interface to the scripting bridge used to resolve bundle identifiers.
pub trait BundleIdentifierSource {
    /// Resolve the reverse-DNS bundle identifier for an application.
    fn bundle_identifier(&self, path: &Path) -> Result<String, AdhocSignError>;
}

/// Locate the `codesign` executable on `PATH`.
///
/// Its absence is a startup-fatal precondition for the whole tool.
pub fn find_codesign() -> Result<PathBuf, AdhocSignError> {
    Ok(which::which("codesign")?)
}

/// Production tool access backed by shelling out to the OS binaries.
pub struct OsTools {
    codesign: PathBuf,
    verbose: bool,
}

impl OsTools {
    /// Construct an instance, verifying the signing tool exists.
    pub fn new(verbose: bool) -> Result<Self, AdhocSignError> {
        Ok(Self {
            codesign: find_codesign()?,
            verbose,
        })
    }
}

impl SigningTool for OsTools {
    fn signature_info(&self, path: &Path) -> Result<String, AdhocSignError> {
        // codesign emits the signature description on stderr.
        run_tool(
            "codesign",
            duct::cmd(
                &self.codesign,
                [OsString::from("-dvv"), path.as_os_str().to_os_string()],
            ),
            false,
        )
    }

    fn sign_bundle(
        &self,
        path: &Path,
        entitlements: Option<&Path>,
    ) -> Result<(), AdhocSignError> {
        let args = sign_arguments(path, entitlements);
        warn!("signing {}", path.display());
        run_tool("codesign", duct::cmd(&self.codesign, args), self.verbose)?;
        Ok(())
    }
}

impl MetadataSearch for OsTools {
    fn application_bundles(&self) -> Result<Vec<PathBuf>, AdhocSignError> {
        let output = run_tool(
            "mdfind",
            duct::cmd("mdfind", [APPLICATION_BUNDLE_QUERY]),
            false,
        )?;

        Ok(parse_index_output(&output))
    }
}

impl BundleIdentifierSource for OsTools {
    fn bundle_identifier(&self, path: &Path) -> Result<String, AdhocSignError> {
        let script = format!("id of app \"{}\"", path.display());
        let output = run_tool(
            "osascript",
            duct::cmd("osascript", ["-e", script.as_str()]),
            false,
        )?;

        Ok(output.trim().to_string())
    }
}

/// Assemble the argument list for a deep ad-hoc signing invocation.
///
/// `--force` is always passed: callers that care about preserving an
/// existing signature short-circuit before dispatching.
fn sign_arguments(path: &Path, entitlements: Option<&Path>) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("--force"),
        OsString::from("--deep"),
        OsString::from("--sign"),
        OsString::from("-"),
    ];

    if let Some(entitlements) = entitlements {
        args.push(OsString::from("--entitlements"));
        args.push(entitlements.as_os_str().to_os_string());
    }

    args.push(path.as_os_str().to_os_string());

    args
}

/// Parse metadata index output into paths, one per non-empty line.
fn parse_index_output(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Run an external tool to completion, capturing its combined output.
///
/// When `echo` is set, captured output is surfaced line by line through the
/// logger. Non-zero exit maps to a tool failure carrying the last output
/// line, which is where these tools put their diagnostic.
fn run_tool(
    tool: &'static str,
    expression: duct::Expression,
    echo: bool,
) -> Result<String, AdhocSignError> {
    debug!("invoking {}", tool);

    let output = expression
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .run()?;

    let text = String::from_utf8_lossy(&output.stdout).to_string();

    if echo {
        for line in text.lines() {
            warn!("{}> {}", tool, line);
        }
    }

    if output.status.success() {
        Ok(text)
    } else {
        let detail = text
            .lines()
            .last()
            .unwrap_or("no output")
            .trim()
            .to_string();

        Err(AdhocSignError::ToolFailure(tool, detail))
    }
}
