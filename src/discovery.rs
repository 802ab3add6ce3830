// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery of user-installed application bundles.

use {
    crate::{classifier::SystemAppClassifier, tools::MetadataSearch},
    log::debug,
    once_cell::sync::Lazy,
    std::path::{Path, PathBuf},
};

/// The system-wide applications directory.
pub static GLOBAL_APPLICATIONS_DIR: Lazy<PathBuf> = Lazy::new(|| PathBuf::from("/Applications"));

/// Path prefixes whose metadata index results are never candidates.
const EXCLUDED_INDEX_ROOTS: &[&str] = &["/System", "/Library"];

/// The current user's personal applications directory, if resolvable.
pub fn user_applications_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Applications"))
}

/// Builds the candidate set of user-installed applications.
pub struct AppDiscovery<'a> {
    classifier: &'a SystemAppClassifier<'a>,
    metadata: &'a dyn MetadataSearch,
    global_dir: PathBuf,
    user_dir: Option<PathBuf>,
}

impl<'a> AppDiscovery<'a> {
    pub fn new(classifier: &'a SystemAppClassifier<'a>, metadata: &'a dyn MetadataSearch) -> Self {
        Self::with_directories(
            classifier,
            metadata,
            GLOBAL_APPLICATIONS_DIR.clone(),
            user_applications_dir(),
        )
    }

    /// Construct an instance scanning non-default directories.
    pub fn with_directories(
        classifier: &'a SystemAppClassifier<'a>,
        metadata: &'a dyn MetadataSearch,
        global_dir: PathBuf,
        user_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            classifier,
            metadata,
            global_dir,
            user_dir,
        }
    }

    /// Enumerate user-installed application bundles.
    ///
    /// Candidates come from three sources: the top level of the system-wide
    /// applications directory (classifier-filtered), the top level of the
    /// user's personal applications directory (unfiltered; anything placed
    /// there is user-installed by construction), and the metadata index
    /// (classifier-filtered, with the OS system tree and the shared library
    /// tree excluded outright).
    ///
    /// The result is deduplicated by exact path equality and sorted
    /// lexicographically. Paths differing only in spelling (trailing
    /// slashes, case, symlinks) are not merged. A source that yields
    /// nothing contributes zero entries; this never fails.
    pub fn find_user_installed_applications(&self) -> Vec<PathBuf> {
        let mut apps = vec![];

        for path in top_level_app_bundles(&self.global_dir) {
            if !self.classifier.is_system_application(&path) {
                apps.push(path);
            }
        }

        if let Some(user_dir) = &self.user_dir {
            apps.extend(top_level_app_bundles(user_dir));
        }

        match self.metadata.application_bundles() {
            Ok(paths) => {
                for path in paths {
                    if EXCLUDED_INDEX_ROOTS
                        .iter()
                        .any(|root| path.starts_with(Path::new(root)))
                    {
                        continue;
                    }

                    if !self.classifier.is_system_application(&path) {
                        apps.push(path);
                    }
                }
            }
            Err(err) => {
                debug!("metadata index query failed: {}", err);
            }
        }

        apps.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        apps.dedup();

        apps
    }

    /// Resolve an application by exact bundle name.
    ///
    /// Checks the system-wide then the personal applications directory. The
    /// `.app` suffix is appended when the caller omits it.
    pub fn resolve_named_application(&self, name: &str) -> Option<PathBuf> {
        let file_name = if name.ends_with(".app") {
            name.to_string()
        } else {
            format!("{}.app", name)
        };

        let mut candidates = vec![self.global_dir.join(&file_name)];
        if let Some(user_dir) = &self.user_dir {
            candidates.push(user_dir.join(&file_name));
        }

        candidates.into_iter().find(|path| path.is_dir())
    }
}

/// Top-level application bundles in a directory, non-recursive.
///
/// A missing or unreadable directory contributes nothing.
fn top_level_app_bundles(dir: &Path) -> Vec<PathBuf> {
    let mut bundles = vec![];

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "app") && path.is_dir() {
                bundles.push(path);
            }
        }
    }

    bundles
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::testutil::{temp_dir, FakeBundleIds, FakeMetadataSearch, FakeSigningTool},
        std::fs::create_dir_all,
    };

    #[test]
    fn missing_directories_yield_empty_set() {
        let tool = FakeSigningTool::default();
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::default();

        let discovery = AppDiscovery::with_directories(
            &classifier,
            &metadata,
            PathBuf::from("/nonexistent/Applications"),
            Some(PathBuf::from("/nonexistent/home/Applications")),
        );

        assert!(discovery.find_user_installed_applications().is_empty());
    }

    #[test]
    fn global_directory_is_classifier_filtered() {
        let (_temp, td) = temp_dir().unwrap();
        let global = td.join("Applications");
        create_dir_all(global.join("Foo.app")).unwrap();
        create_dir_all(global.join("Numbers.app")).unwrap();

        let tool = FakeSigningTool::default().with_authority(
            global.join("Numbers.app"),
            "Authority=Apple Mac OS Application Signing",
        );
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::default();

        let discovery =
            AppDiscovery::with_directories(&classifier, &metadata, global.clone(), None);

        assert_eq!(
            discovery.find_user_installed_applications(),
            vec![global.join("Foo.app")]
        );
    }

    #[test]
    fn user_directory_is_unfiltered() {
        let (_temp, td) = temp_dir().unwrap();
        let global = td.join("Applications");
        let user = td.join("home").join("Applications");
        create_dir_all(&global).unwrap();
        create_dir_all(user.join("Numbers.app")).unwrap();

        // Apple evidence exists, but the personal directory bypasses the
        // classifier.
        let tool = FakeSigningTool::default().with_authority(
            user.join("Numbers.app"),
            "Authority=Apple Mac OS Application Signing",
        );
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::default();

        let discovery = AppDiscovery::with_directories(&classifier, &metadata, global, Some(user.clone()));

        assert_eq!(
            discovery.find_user_installed_applications(),
            vec![user.join("Numbers.app")]
        );
    }

    #[test]
    fn metadata_results_exclude_system_and_library_trees() {
        let tool = FakeSigningTool::default();
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::with_bundles(vec![
            PathBuf::from("/System/Applications/Bar.app"),
            PathBuf::from("/Library/CoreServices/Thing.app"),
            PathBuf::from("/opt/Tools/Baz.app"),
        ]);

        let discovery = AppDiscovery::with_directories(
            &classifier,
            &metadata,
            PathBuf::from("/nonexistent/Applications"),
            None,
        );

        assert_eq!(
            discovery.find_user_installed_applications(),
            vec![PathBuf::from("/opt/Tools/Baz.app")]
        );
    }

    #[test]
    fn metadata_failure_contributes_nothing() {
        let (_temp, td) = temp_dir().unwrap();
        let global = td.join("Applications");
        create_dir_all(global.join("Foo.app")).unwrap();

        let tool = FakeSigningTool::default();
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::failing();

        let discovery = AppDiscovery::with_directories(&classifier, &metadata, global.clone(), None);

        assert_eq!(
            discovery.find_user_installed_applications(),
            vec![global.join("Foo.app")]
        );
    }

    #[test]
    fn result_is_deduplicated_and_sorted() {
        let (_temp, td) = temp_dir().unwrap();
        let global = td.join("Applications");
        create_dir_all(global.join("Zed.app")).unwrap();
        create_dir_all(global.join("Alpha.app")).unwrap();

        let tool = FakeSigningTool::default();
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        // The index reports one of the same bundles a second time.
        let metadata = FakeMetadataSearch::with_bundles(vec![global.join("Zed.app")]);

        let discovery = AppDiscovery::with_directories(&classifier, &metadata, global.clone(), None);

        assert_eq!(
            discovery.find_user_installed_applications(),
            vec![global.join("Alpha.app"), global.join("Zed.app")]
        );
    }

    #[test]
    fn discovery_is_deterministic() {
        let (_temp, td) = temp_dir().unwrap();
        let global = td.join("Applications");
        create_dir_all(global.join("Foo.app")).unwrap();
        create_dir_all(global.join("Bar.app")).unwrap();

        let tool = FakeSigningTool::default();
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::default();

        let discovery = AppDiscovery::with_directories(&classifier, &metadata, global, None);

        assert_eq!(
            discovery.find_user_installed_applications(),
            discovery.find_user_installed_applications()
        );
    }

    #[test]
    fn named_resolution() {
        let (_temp, td) = temp_dir().unwrap();
        let global = td.join("Applications");
        let user = td.join("home").join("Applications");
        create_dir_all(global.join("Foo.app")).unwrap();
        create_dir_all(user.join("Bar.app")).unwrap();

        let tool = FakeSigningTool::default();
        let ids = FakeBundleIds::default();
        let classifier = SystemAppClassifier::new(&tool, &ids);
        let metadata = FakeMetadataSearch::default();

        let discovery =
            AppDiscovery::with_directories(&classifier, &metadata, global.clone(), Some(user.clone()));

        assert_eq!(
            discovery.resolve_named_application("Foo"),
            Some(global.join("Foo.app"))
        );
        assert_eq!(
            discovery.resolve_named_application("Foo.app"),
            Some(global.join("Foo.app"))
        );
        assert_eq!(
            discovery.resolve_named_application("Bar"),
            Some(user.join("Bar.app"))
        );
        assert_eq!(discovery.resolve_named_application("Missing"), None);
    }
}
