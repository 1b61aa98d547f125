use anyhow::{Context, Result};
use htpa::{
    codec::{txt, DEFAULT_ARRAY_SIZE},
    frames::{crop_recording, resample_step},
    read_tpa_file, write_tpa_file, Format, Sample,
};
use std::path::{Path, PathBuf};

use crate::args::ConvertArgs;

pub fn convert(args: &ConvertArgs) -> Result<()> {
    Format::from_path(&args.output)?;
    let recording = read_tpa_file(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;
    let (height, width) = recording.frame_shape();

    let recording = crop_recording(&recording, args.crop_height, args.crop_width)?;
    let recording = resample_step(&recording, args.step)?;
    write_tpa_file(&args.output, &recording)
        .with_context(|| format!("could not write {}", args.output.display()))?;

    let (crop_height, crop_width) = recording.frame_shape();
    eprintln!(
        "Wrote {} frames of {}x{} (from {}x{}) to {}",
        recording.len(),
        crop_height,
        crop_width,
        height,
        width,
        args.output.display()
    );
    Ok(())
}

pub fn inspect(paths: &[PathBuf], tolerance: f64) -> Result<()> {
    let sample = Sample::from_filepaths(paths).context("could not load sample")?;
    for ((id, rec), path) in sample.ids().iter().zip(sample.recordings()).zip(paths) {
        let (height, width) = rec.frame_shape();
        let span = match (rec.timestamps().first(), rec.timestamps().last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.,
        };
        println!(
            "view {:>6}: {:>6} frames of {}x{}, {:.3} s  ({})",
            id,
            rec.len(),
            height,
            width,
            span,
            path.display()
        );
    }
    println!("aligned: {}", sample.test_alignment());
    println!(
        "synchronized within {} s: {}",
        tolerance,
        sample.test_synchronization(tolerance)
    );
    Ok(())
}

pub fn check(paths: &[PathBuf]) -> Result<usize> {
    let mut malformed = 0;
    for path in paths {
        match first_malformed(path)? {
            Some(line) => {
                malformed += 1;
                println!("{}: line {} is malformed", path.display(), line);
            }
            None => println!("{}: ok", path.display()),
        }
    }
    Ok(malformed)
}

fn first_malformed(path: &Path) -> Result<Option<usize>> {
    txt::first_malformed_line(path, DEFAULT_ARRAY_SIZE)
        .with_context(|| format!("could not scan {}", path.display()))
}
