//! Nearest-neighbour matching of asynchronous timestamp
//! streams.
use itertools::Itertools;

use crate::error::{Error, Result};

/// Maps every stream onto the timeline of the shortest one.
///
/// The shortest stream (the first one, if several tie) is the
/// reference and keeps the identity indices `0..len`. For
/// every other stream and every reference timestamp, the
/// index of the closest timestamp in that stream is picked;
/// ties go to the earliest index. All returned index lists
/// have the reference length, and indexing stream `i` by
/// list `i` yields aligned streams.
///
/// The matching is lossy: each reference point is matched
/// independently, so a target index may be picked twice and
/// others skipped. Results are not deduplicated and need not
/// be monotonic.
///
/// ```rust
/// # fn main() -> htpa::Result<()> {
/// let ts1 = [1., 2., 3., 4., 5.];
/// let ts2 = [1.1, 2.1, 2.9, 3.6, 5.1, 6., 6.1];
/// let idx = htpa::match_timesteps(&[&ts1[..], &ts2[..]])?;
/// assert_eq!(idx[0], vec![0, 1, 2, 3, 4]);
/// assert_eq!(idx[1], vec![0, 1, 2, 3, 4]);
/// # Ok(())
/// # }
/// ```
///
/// Fails if no stream is given.
pub fn match_timesteps<T: AsRef<[f64]>>(streams: &[T]) -> Result<Vec<Vec<usize>>> {
    let reference_idx = streams
        .iter()
        .position_min_by_key(|s| s.as_ref().len())
        .ok_or_else(|| Error::shape("at least one timestamp stream is required"))?;
    let reference = streams[reference_idx].as_ref();

    Ok(streams
        .iter()
        .enumerate()
        .map(|(idx, stream)| {
            if idx == reference_idx {
                (0..reference.len()).collect()
            } else {
                let stream = stream.as_ref();
                reference.iter().map(|&t| nearest(stream, t)).collect()
            }
        })
        .collect())
}

fn nearest(stream: &[f64], t: f64) -> usize {
    stream
        .iter()
        .map(|v| (v - t).abs())
        .position_min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0)
}
