//! Application definition.

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Error, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use netexp::{Experiment, ExperimentConfig, TrialErrorPolicy};

use crate::init;
use crate::progress::ProgressObserver;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("netexp-cli")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .author(AUTHORS)
        .about("Run batched network bridge experiments from the command line.")
        .arg(
            Arg::with_name("verbosity")
                .long("verbosity")
                .short("v")
                .takes_value(true)
                .default_value("warn")
                .value_name("verb")
                .global(true)
                .help("Set the verbosity of the log output"),
        )
        // new subcommand
        .subcommand(
            SubCommand::with_name("new")
                .display_order(10)
                .about("Create a new experiment directory with a manifest template")
                .arg(Arg::with_name("path").required(true).value_name("path")),
        )
        // run subcommand
        .subcommand(
            SubCommand::with_name("run")
                .display_order(20)
                .about("Run an experiment batch from a manifest")
                .arg(
                    Arg::with_name("path")
                        .value_name("path")
                        .help("Path to the experiment manifest or its directory"),
                )
                .arg(
                    Arg::with_name("trials")
                        .long("trials")
                        .short("t")
                        .takes_value(true)
                        .value_name("count")
                        .help("Number of trials to perform"),
                )
                .arg(
                    Arg::with_name("scratch")
                        .long("scratch")
                        .takes_value(true)
                        .value_name("path")
                        .help("Scratch workspace the stages run against"),
                )
                .arg(
                    Arg::with_name("archive")
                        .long("archive")
                        .takes_value(true)
                        .value_name("path")
                        .help("Archive root for trial output"),
                )
                .arg(
                    Arg::with_name("generate")
                        .long("generate")
                        .takes_value(true)
                        .value_name("path")
                        .help("Generation stage executable"),
                )
                .arg(
                    Arg::with_name("simulate")
                        .long("simulate")
                        .takes_value(true)
                        .value_name("path")
                        .help("Simulation stage executable"),
                )
                .arg(
                    Arg::with_name("on-error")
                        .long("on-error")
                        .takes_value(true)
                        .value_name("policy")
                        .possible_values(&["abort_run", "skip_trial"])
                        .help("What to do with the remaining trials after one fails"),
                )
                .arg(
                    Arg::with_name("no-progress")
                        .long("no-progress")
                        .help("Don't draw the progress bar"),
                ),
        )
}

pub fn init() -> ArgMatches<'static> {
    app().get_matches()
}

/// Runs based on specified subcommand.
pub fn start(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("new", Some(m)) => start_new(m),
        ("run", Some(m)) => start_run(m),
        _ => Ok(()),
    }
}

fn start_new(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .value_of("path")
        .expect("Failed to get experiment path");
    init::init_at_path(path)
}

fn start_run(matches: &ArgMatches) -> Result<()> {
    setup_log_verbosity(matches);

    let mut config = match matches.value_of("path") {
        Some(p_str) => {
            let mut path = PathBuf::from(p_str);
            if path.is_relative() {
                path = env::current_dir()?.join(path);
            }
            ExperimentConfig::from_path(&path)?
        }
        None => {
            // no path means a manifest in the current directory, or
            // plain defaults when there is none
            let manifest = env::current_dir()?.join(netexp::EXPERIMENT_MANIFEST_FILE);
            if manifest.is_file() {
                ExperimentConfig::from_path(&manifest)?
            } else {
                ExperimentConfig::default()
            }
        }
    };

    if let Some(t) = matches.value_of("trials") {
        config.trials = t.parse()?;
    }
    if let Some(p) = matches.value_of("scratch") {
        config.scratch_dir = PathBuf::from(p);
    }
    if let Some(p) = matches.value_of("archive") {
        config.archive_dir = PathBuf::from(p);
    }
    if let Some(p) = matches.value_of("generate") {
        config.generate = PathBuf::from(p);
    }
    if let Some(p) = matches.value_of("simulate") {
        config.simulate = PathBuf::from(p);
    }
    if let Some(p) = matches.value_of("on-error") {
        config.on_trial_error = p.parse::<TrialErrorPolicy>().map_err(Error::msg)?;
    }

    debug!("effective config: {:?}", config);
    let experiment = Experiment::new(config);
    let total = experiment.config().trials;

    // let a Ctrl-C stop the run at the next trial boundary
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let summary = if matches.is_present("no-progress") {
        experiment.run_interruptible(&mut netexp::NullObserver, running)?
    } else {
        let mut observer = ProgressObserver::new(total as u64);
        let summary = experiment.run_interruptible(&mut observer, running)?;
        observer.finish();
        summary
    };

    if summary.interrupted {
        println!(
            "interrupted: {}/{} trials archived",
            summary.completed, total
        );
    } else if !summary.failed.is_empty() {
        println!(
            "done: {}/{} trials archived, {} skipped",
            summary.completed,
            total,
            summary.failed.len()
        );
    } else {
        println!("done: {}/{} trials archived", summary.completed, total);
    }
    Ok(())
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use simplelog::{LevelFilter, TermLogger};
    let level_filter = match matches.value_of("verbosity") {
        Some(s) => match s {
            "0" | "none" => LevelFilter::Off,
            "1" | "err" | "error" | "min" => LevelFilter::Error,
            "2" | "warn" | "warning" | "default" => LevelFilter::Warn,
            "3" | "info" => LevelFilter::Info,
            "4" | "debug" => LevelFilter::Debug,
            "5" | "trace" | "max" | "all" => LevelFilter::Trace,
            _ => LevelFilter::Warn,
        },
        _ => LevelFilter::Warn,
    };
    let mut config_builder = simplelog::ConfigBuilder::new();
    let logger_conf = config_builder
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Error)
        .set_time_format_str("%H:%M:%S%.6f")
        .build();
    let _ = TermLogger::init(level_filter, logger_conf, simplelog::TerminalMode::Mixed);
}
