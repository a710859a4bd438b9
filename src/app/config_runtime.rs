//! Command line parsing with value sources, and merging of file config.

use anyhow::Result;
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use tnm_core::CatalogSettings;
use tnm_core::catalog::{
    DEFAULT_API_CONNECT_TIMEOUT_SECS, DEFAULT_API_READ_TIMEOUT_SECS, DEFAULT_API_URL,
    DEFAULT_PAGE_SIZE,
};
use tnm_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which options were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) threads: bool,
    pub(crate) retries: bool,
    pub(crate) timeout: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HttpTimeoutSettings {
    pub(crate) download_connect_secs: u64,
    pub(crate) download_read_secs: u64,
}

impl Default for HttpTimeoutSettings {
    fn default() -> Self {
        Self {
            download_connect_secs: CONNECT_TIMEOUT_SECS,
            download_read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Parses the process arguments.
///
/// Unlike `Args::parse`, errors (including `--help`) are returned so the
/// caller decides the exit code.
pub(crate) fn parse_cli_with_sources() -> Result<(Args, CliValueSources), clap::Error> {
    parse_cli_from(std::env::args_os())
}

pub(crate) fn parse_cli_from<I, T>(itr: I) -> Result<(Args, CliValueSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(itr)?;
    let args = Args::from_arg_matches(&matches)?;

    let sources = CliValueSources {
        threads: is_commandline_value(&matches, "threads"),
        retries: is_commandline_value(&matches, "retries"),
        timeout: is_commandline_value(&matches, "timeout"),
        verbose: is_commandline_value(&matches, "verbose"),
        quiet: is_commandline_value(&matches, "quiet"),
    };
    Ok((args, sources))
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills options not given on the command line from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.threads
        && let Some(threads) = file_config.threads
    {
        args.threads = threads;
    }

    if !cli_sources.retries
        && let Some(retries) = file_config.retries
    {
        args.retries = retries;
    }

    if !cli_sources.timeout
        && let Some(read_secs) = file_config.download_read_timeout_secs
    {
        args.timeout = read_secs;
    }

    // --api-url and TNM_API_URL both beat the file.
    if args.api_url.is_none() {
        args.api_url.clone_from(&file_config.api_url);
    }

    if !cli_sources.verbose
        && !cli_sources.quiet
        && let Some(verbosity) = file_config.verbosity
    {
        apply_config_verbosity(&mut args, verbosity);
    }

    args
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    let (quiet, verbose) = match verbosity {
        VerbositySetting::Default => (false, 0),
        VerbositySetting::Verbose => (false, 1),
        VerbositySetting::Quiet => (true, 0),
        VerbositySetting::Debug => (false, 2),
    };
    args.quiet = quiet;
    args.verbose = verbose;
}

pub(crate) fn resolve_http_timeouts(
    args: &Args,
    file_config: Option<&FileConfig>,
) -> HttpTimeoutSettings {
    let mut settings = HttpTimeoutSettings {
        download_read_secs: args.timeout,
        ..HttpTimeoutSettings::default()
    };
    if let Some(value) = file_config.and_then(|c| c.download_connect_timeout_secs) {
        settings.download_connect_secs = value;
    }
    settings
}

pub(crate) fn resolve_catalog_settings(
    args: &Args,
    file_config: Option<&FileConfig>,
) -> CatalogSettings {
    let mut settings = CatalogSettings {
        base_url: args
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        page_size: DEFAULT_PAGE_SIZE,
        connect_timeout_secs: DEFAULT_API_CONNECT_TIMEOUT_SECS,
        read_timeout_secs: DEFAULT_API_READ_TIMEOUT_SECS,
    };
    let Some(file_config) = file_config else {
        return settings;
    };
    if let Some(page_size) = file_config.page_size {
        settings.page_size = page_size;
    }
    if let Some(value) = file_config.api_connect_timeout_secs {
        settings.connect_timeout_secs = value;
    }
    if let Some(value) = file_config.api_read_timeout_secs {
        settings.read_timeout_secs = value;
    }
    settings
}

/// Log level used when `RUST_LOG` is unset.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Explicit `-v`/`-q` override `RUST_LOG`.
pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
