mod locations;
mod render;

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{crate_version, load_yaml, App, ArgMatches};
use env_logger::{self, Env};
use log::error;

use mailview::{HostingEnvironment, RendererOptions};

fn main() {
    init_logger();

    if let Err(err) = run_app() {
        #[cfg(debug)]
        error!("{:?}", err);

        #[cfg(not(debug))]
        error!("{:#}", err);

        std::process::exit(1);
    };
}

const LOG_LEVEL_ENV_VAR: &str = "MAILVIEW_LOG";

/// Initializes the logger. It'll be more verbose by default in dev builds and
/// more "tidy" in releases. It can be customized by setting MAILVIEW_LOG to
/// one of: "OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"
///
/// More fine-grained options can be found here:
/// https://docs.rs/env_logger
fn init_logger() {
    #[cfg(debug)]
    env_logger::from_env(Env::default().filter_or(LOG_LEVEL_ENV_VAR, "debug"))
        .format_timestamp(None)
        .init();

    #[cfg(not(debug))]
    {
        let mut logger_builder =
            env_logger::from_env(Env::default().filter_or(LOG_LEVEL_ENV_VAR, "warn"));

        // Rendered views go to stdout, so keep stderr free of prefixes unless
        // the logging level is explicitly requested.
        if env::var(LOG_LEVEL_ENV_VAR).is_err() {
            logger_builder.format_level(false);
        }

        logger_builder
            .format_timestamp(None)
            .format_module_path(false)
            .init();
    }
}

fn run_app() -> Result<()> {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).version(crate_version!()).get_matches();

    match matches.subcommand() {
        ("render", Some(args)) => render::render(args)?,
        ("locations", Some(args)) => locations::locations(args)?,
        _ => unreachable!("clap requires a subcommand"),
    }

    Ok(())
}

/// Builds the hosting environment and renderer options from the config file
/// and the command line. Flags win over the config file. Global flags are
/// propagated to the subcommand, so `args` are the subcommand's matches.
fn environment(args: &ArgMatches) -> Result<(HostingEnvironment, RendererOptions)> {
    let hosting = match args.value_of("content-root") {
        Some(dir) => {
            let content_root = Path::new(dir)
                .canonicalize()
                .with_context(|| format!("content root {} doesn't exist", dir))?;

            HostingEnvironment::new(content_root)
        },
        None => HostingEnvironment::from_current_dir()?,
    };

    let mut options = match args.value_of("config") {
        Some(path) => RendererOptions::load(path)?,
        None => RendererOptions::default(),
    };

    if args.is_present("content-root") || options.content_root.is_empty() {
        options.content_root = hosting.content_root_path().to_string_lossy().into_owned();
    }

    if let Some(folder) = args.value_of("emails-folder") {
        options.emails_folder = folder.to_string();
    }

    Ok((hosting, options))
}
