use anyhow::Result;
use clap::{value_t_or_exit, values_t_or_exit, ArgMatches};
use htpa::{
    arg, args_parser,
    cli::{AppSettings, SubCommand},
    log::DEFAULT_LOG_FILE,
    opt,
};
use std::path::PathBuf;

pub enum Stage {
    Prepare,
    Make,
}

pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub crop_height: Option<usize>,
    pub crop_width: Option<usize>,
    pub step: usize,
}

pub enum Command {
    Convert(ConvertArgs),
    Template { stage: Stage, path: PathBuf },
    Prepare { config: PathBuf },
    Make { config: PathBuf },
    Inspect { paths: Vec<PathBuf>, tolerance: f64 },
    Check { paths: Vec<PathBuf> },
}

pub struct Args {
    pub verbose: bool,
    pub log_file: PathBuf,
    pub command: Command,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("htpa")
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .about("Convert HTPA recordings and build multi-view datasets.")
            .arg(
                opt!("verbose")
                    .short("v")
                    .takes_value(false)
                    .global(true)
                    .help("Print diagnostics and append them to the log file"),
            )
            .arg(
                opt!("log file")
                    .global(true)
                    .default_value(DEFAULT_LOG_FILE)
                    .help("Run log written in verbose mode"),
            )
            .subcommand(
                SubCommand::with_name("convert")
                    .about("Convert a recording to another encoding (by extension)")
                    .arg(arg!("input").required(true).help("Input recording"))
                    .arg(arg!("output").required(true).help("Output recording"))
                    .arg(opt!("crop height").help("Keep the central rows only"))
                    .arg(opt!("crop width").help("Keep the central columns only"))
                    .arg(
                        opt!("step")
                            .short("s")
                            .help("Keep every n-th frame.  Default is 1"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("template")
                    .about("Write a config template for a stage")
                    .arg(
                        arg!("stage")
                            .required(true)
                            .possible_values(&["prepare", "make"])
                            .help("Pipeline stage"),
                    )
                    .arg(arg!("path").required(true).help("Config path")),
            )
            .subcommand(
                SubCommand::with_name("prepare")
                    .about("Align raw recordings into the processed directory")
                    .arg(arg!("config").required(true).help("Preparer config")),
            )
            .subcommand(
                SubCommand::with_name("make")
                    .about("Copy labelled, aligned samples into a dataset")
                    .arg(arg!("config").required(true).help("Dataset maker config")),
            )
            .subcommand(
                SubCommand::with_name("inspect")
                    .about("Report frame counts, alignment and synchronization of one sample")
                    .arg(
                        opt!("tolerance")
                            .short("t")
                            .help("Max timestamp difference in seconds.  Default is 0.05"),
                    )
                    .arg(
                        arg!("paths")
                            .required(true)
                            .multiple(true)
                            .help("One recording per view"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("check")
                    .about("Report the first malformed line of text recordings")
                    .arg(
                        arg!("paths")
                            .required(true)
                            .multiple(true)
                            .help("Text recordings"),
                    ),
            )
            .get_matches();

        let verbose = matches.is_present("verbose");
        let log_file = value_t_or_exit!(matches, "log file", PathBuf);
        let command = match matches.subcommand() {
            ("convert", Some(sub)) => Command::Convert(convert_args(sub)),
            ("template", Some(sub)) => Command::Template {
                stage: match sub.value_of("stage") {
                    Some("make") => Stage::Make,
                    _ => Stage::Prepare,
                },
                path: value_t_or_exit!(sub, "path", PathBuf),
            },
            ("prepare", Some(sub)) => Command::Prepare {
                config: value_t_or_exit!(sub, "config", PathBuf),
            },
            ("make", Some(sub)) => Command::Make {
                config: value_t_or_exit!(sub, "config", PathBuf),
            },
            ("inspect", Some(sub)) => Command::Inspect {
                paths: values_t_or_exit!(sub, "paths", PathBuf),
                tolerance: sub
                    .is_present("tolerance")
                    .then(|| value_t_or_exit!(sub.value_of("tolerance"), f64))
                    .unwrap_or(0.05),
            },
            ("check", Some(sub)) => Command::Check {
                paths: values_t_or_exit!(sub, "paths", PathBuf),
            },
            (name, _) => anyhow::bail!("unknown subcommand `{}`", name),
        };

        Ok(Args {
            verbose,
            log_file,
            command,
        })
    }
}

fn convert_args(sub: &ArgMatches) -> ConvertArgs {
    let optional = |name: &str| {
        sub.is_present(name)
            .then(|| value_t_or_exit!(sub.value_of(name), usize))
    };
    ConvertArgs {
        input: value_t_or_exit!(sub, "input", PathBuf),
        output: value_t_or_exit!(sub, "output", PathBuf),
        crop_height: optional("crop height"),
        crop_width: optional("crop width"),
        step: optional("step").unwrap_or(1),
    }
}
