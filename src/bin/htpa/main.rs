mod args;
mod proc;

use anyhow::{bail, Context, Result};
use htpa::{cli::init_tracing, DatasetMaker, Preparer, RunLog};

use crate::args::{Args, Command, Stage};

fn main() -> Result<()> {
    let args = Args::from_cmd_line()?;
    init_tracing(args.verbose);
    let log = if args.verbose {
        RunLog::verbose(&args.log_file)
    } else {
        RunLog::default()
    };

    match args.command {
        Command::Convert(convert) => proc::convert(&convert)?,
        Command::Template { stage, path } => {
            let written = match stage {
                Stage::Prepare => Preparer::default().generate_config_template(&path),
                Stage::Make => DatasetMaker::default().generate_config_template(&path, None),
            };
            written.with_context(|| format!("could not write {}", path.display()))?;
            eprintln!("Wrote config template to {}", path.display());
        }
        Command::Prepare { config } => {
            let mut preparer = Preparer::new(log)?;
            preparer
                .config(&config)
                .with_context(|| format!("invalid config {}", config.display()))?;
            let prefixes = preparer.prepare()?;
            eprintln!("Prepared {} samples", prefixes.len());
        }
        Command::Make { config } => {
            let mut maker = DatasetMaker::new(log)?;
            maker
                .config(&config)
                .with_context(|| format!("invalid config {}", config.display()))?;
            if !maker.make()? {
                bail!("no sample is both complete and labelled");
            }
        }
        Command::Inspect { paths, tolerance } => proc::inspect(&paths, tolerance)?,
        Command::Check { paths } => {
            let malformed = proc::check(&paths)?;
            if malformed > 0 {
                bail!("{} of {} recordings are malformed", malformed, paths.len());
            }
        }
    }
    Ok(())
}
