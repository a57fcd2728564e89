//! `stateup` binary

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use stateup_cli::{init_logging, upgrade_files, write_documents, Settings};
use stateup_engine::resources::action;

fn cli() -> Command {
    Command::new("stateup")
        .version(stateup_engine::VERSION)
        .about("Upgrade stored resource action state to the current schema version")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("upgrade")
                .about("Upgrade state documents")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("State documents to upgrade"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("json-implied")
                        .long("json-implied")
                        .action(ArgAction::SetTrue)
                        .help("Parse legacy strings as JSON instead of wrapping them"),
                )
                .arg(
                    Arg::new("null-maps")
                        .long("null-maps")
                        .action(ArgAction::SetTrue)
                        .help("Write null instead of empty maps for fields with no legacy data"),
                )
                .arg(
                    Arg::new("out-dir")
                        .long("out-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write upgraded documents here instead of stdout"),
                ),
        )
        .subcommand(Command::new("table").about("Print the resource action mapping table"))
}

fn upgrade(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let mut settings = match args.get_one::<PathBuf>("config") {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if args.get_flag("json-implied") {
        settings = settings.with_json_implied();
    }
    if args.get_flag("null-maps") {
        settings = settings.with_null_maps();
    }
    init_logging(&settings.logging);

    let chain = action::upgrade_chain(settings.upgrade).context("invalid upgrade chain")?;
    let files: Vec<PathBuf> = args
        .get_many::<PathBuf>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    let out_dir = args.get_one::<PathBuf>("out-dir");
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create '{}'", dir.display()))?;
    }

    let mut failed = 0usize;
    let mut upgraded = Vec::with_capacity(files.len());
    for (source, result) in upgrade_files(&chain, &files) {
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                eprintln!("{}: error: {err:#}", source.display());
                failed += 1;
                continue;
            }
        };
        for diagnostic in report.diagnostics.iter() {
            eprintln!("{}: {diagnostic}", source.display());
        }
        if report.is_success() {
            upgraded.push(report);
        } else {
            failed += 1;
        }
    }

    match out_dir {
        Some(dir) => {
            for (report, (source, result)) in upgraded.iter().zip(write_documents(dir, &upgraded)) {
                match result {
                    Ok(Some(target)) => {
                        tracing::info!(from = %source.display(), to = %target.display(), path = %report.path, "wrote upgraded state");
                    }
                    Ok(None) => {}
                    Err(err) => {
                        eprintln!("{}: error: {err:#}", source.display());
                        failed += 1;
                    }
                }
            }
        }
        None => {
            for report in &upgraded {
                let Some(document) = &report.document else {
                    continue;
                };
                match document.to_pretty_string() {
                    Ok(text) => println!("{text}"),
                    Err(err) => {
                        eprintln!("{}: error: {err:#}", report.source.display());
                        failed += 1;
                    }
                }
            }
        }
    }

    tracing::info!(files = files.len(), failed, "batch finished");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn table() -> ExitCode {
    println!(
        "{} (version {} -> {})",
        action::STEP_NAME,
        action::PRIOR_VERSION,
        action::CURRENT_VERSION
    );
    print!("{}", action::mapping_table());
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("upgrade", args)) => upgrade(args),
        Some(("table", _)) => Ok(table()),
        _ => Ok(ExitCode::FAILURE),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
