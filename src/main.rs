// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    adhoc_sign::{
        AdhocSignError, AppChooser, AppDiscovery, AppListCache, BundleSigner, OsTools,
        SignOutcome, SignRequest, SystemAppClassifier, TerminalChooser,
    },
    clap::{Arg, ArgMatches, Command},
    log::{warn, LevelFilter},
    std::path::PathBuf,
};

const ABOUT: &str = "\
Apply ad-hoc code signatures to user-installed macOS applications.

Applications are resolved either by exact bundle name (--name) or by
interactive selection from a discovered list (--list). The discovered list
is cached in the home directory and only rebuilt on first use or when
--update-list is passed.

System applications are never touched: anything under the system
applications root, signed by an Apple authority, or carrying a com.apple.
bundle identifier is refused.

Signing requests a deep ad-hoc signature over the whole bundle via the OS
codesign tool. Pass --check to report the current signature state instead
of signing, and --backup to copy the bundle aside first.
";

fn cli() -> Command<'static> {
    Command::new("adhocsign")
        .version(env!("CARGO_PKG_VERSION"))
        .about(ABOUT)
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .takes_value(true)
                .value_name("APP")
                .help("Resolve an application by exact bundle name"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("Select an application from the discovered list"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show signing tool output"),
        )
        .arg(
            Arg::new("update-list")
                .long("update-list")
                .help("Rebuild the cached application list before listing"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Report signature state instead of signing"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .help("Re-sign even if a signature is already present"),
        )
        .arg(
            Arg::new("entitlements")
                .long("entitlements")
                .takes_value(true)
                .value_name("FILE")
                .help("Entitlements file to pass through to the signing tool"),
        )
        .arg(
            Arg::new("backup")
                .long("backup")
                .help("Copy the bundle aside before signing"),
        )
}

/// Resolve the target bundle path from the CLI arguments.
///
/// `Ok(None)` means there is legitimately nothing to do (empty discovery
/// result), which is informational rather than an error.
fn resolve_target(
    matches: &ArgMatches,
    discovery: &AppDiscovery,
) -> Result<Option<PathBuf>, AdhocSignError> {
    if let Some(name) = matches.value_of("name") {
        return match discovery.resolve_named_application(name) {
            Some(path) => Ok(Some(path)),
            None => Err(AdhocSignError::NotFound(PathBuf::from(name))),
        };
    }

    if matches.is_present("list") {
        let cache = AppListCache::default_location()?;

        let apps = if cache.is_stale(matches.is_present("update-list")) {
            warn!("discovering user-installed applications");
            let apps = discovery.find_user_installed_applications();
            cache.store(&apps)?;
            apps
        } else {
            cache.load()?.unwrap_or_default()
        };

        if apps.is_empty() {
            println!("no user-installed applications found");
            return Ok(None);
        }

        let index = TerminalChooser.choose(&apps)?;

        return Ok(Some(apps[index].clone()));
    }

    Err(AdhocSignError::CliNoAction)
}

fn main_impl() -> Result<(), AdhocSignError> {
    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err)
            if matches!(
                err.kind(),
                clap::ErrorKind::DisplayHelp | clap::ErrorKind::DisplayVersion
            ) =>
        {
            err.print()?;
            return Ok(());
        }
        Err(err) => {
            return Err(AdhocSignError::CliGeneralError(err.to_string()));
        }
    };

    let verbose = matches.is_present("verbose");

    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();

    // codesign must exist before anything is attempted.
    let tools = OsTools::new(verbose)?;

    let classifier = SystemAppClassifier::new(&tools, &tools);
    let discovery = AppDiscovery::new(&classifier, &tools);

    let path = match resolve_target(&matches, &discovery)? {
        Some(path) => path,
        None => return Ok(()),
    };

    let signer = BundleSigner::new(&tools, &classifier);

    if matches.is_present("check") {
        let state = signer.check(&path)?;
        println!("{}: {}", path.display(), state);

        return Ok(());
    }

    let mut request = SignRequest::new(&path);
    request
        .force(matches.is_present("force"))
        .backup(matches.is_present("backup"));

    if let Some(entitlements) = matches.value_of("entitlements") {
        request.entitlements(entitlements);
    }

    match signer.sign(&request)? {
        SignOutcome::Signed => {
            println!("{}: signed", path.display());
        }
        SignOutcome::AlreadySigned => {
            println!(
                "{}: already signed; pass --force to re-sign",
                path.display()
            );
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match main_impl() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {}", err);
            1
        }
    };

    std::process::exit(exit_code)
}
