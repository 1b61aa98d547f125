//! Array helpers for frame sequences shaped `[frames,
//! height, width]`.
use ndarray::{s, Array2, Array3};

use crate::{
    codec::Recording,
    error::{Error, Result},
};

/// Flattens every frame into one row of `height * width`
/// pixels, row-major.
pub fn flatten_frames(frames: &Array3<f32>) -> Array2<f32> {
    let (n, height, width) = frames.dim();
    Array2::from_shape_fn((n, height * width), |(f, k)| frames[[f, k / width, k % width]])
}

/// Inverse of [`flatten_frames`] for square frames.
pub fn reshape_flattened_frames(flat: Array2<f32>) -> Result<Array3<f32>> {
    let (n, elements) = flat.dim();
    let side = (elements as f64).sqrt().round() as usize;
    if side * side != elements {
        return Err(Error::shape(format!(
            "{} pixels per frame do not form a square frame",
            elements
        )));
    }
    let values = flat.iter().cloned().collect();
    Array3::from_shape_vec((n, side, side), values).map_err(|e| Error::shape(e.to_string()))
}

/// Crops the centre of every frame. `None` keeps the full
/// extent along that axis.
pub fn crop_center(
    frames: &Array3<f32>,
    crop_height: Option<usize>,
    crop_width: Option<usize>,
) -> Result<Array3<f32>> {
    let (_, height, width) = frames.dim();
    let crop_height = crop_height.unwrap_or(height);
    let crop_width = crop_width.unwrap_or(width);
    if crop_height > height || crop_width > width {
        return Err(Error::shape(format!(
            "cannot crop {}x{} out of {}x{} frames",
            crop_height, crop_width, height, width
        )));
    }
    let start_y = height / 2 - crop_height / 2;
    let start_x = width / 2 - crop_width / 2;
    Ok(frames
        .slice(s![
            ..,
            start_y..start_y + crop_height,
            start_x..start_x + crop_width
        ])
        .to_owned())
}

/// Keeps every `step`-th frame, starting with the first.
pub fn resample_step(recording: &Recording, step: usize) -> Result<Recording> {
    if step == 0 {
        return Err(Error::shape("resampling step must be positive"));
    }
    let indices: Vec<usize> = (0..recording.len()).step_by(step).collect();
    Ok(recording.select(&indices))
}

/// Applies [`crop_center`] to a recording.
pub fn crop_recording(
    recording: &Recording,
    crop_height: Option<usize>,
    crop_width: Option<usize>,
) -> Result<Recording> {
    let frames = crop_center(recording.frames(), crop_height, crop_width)?;
    Recording::new(frames, recording.timestamps().to_vec())
}
