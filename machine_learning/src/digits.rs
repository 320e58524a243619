//! The 8x8 handwritten digits dataset.
//!
//! Samples are 64 pixel intensities in `0..=16` followed by a class label in `0..=9`, the
//! layout of the UCI "optdigits" files. A synthetic generator renders noisy glyphs in the
//! same layout for runs without a data file.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{Dataset, MlErr, Result};

/// Pixels per image.
pub const N_FEATURES: usize = 64;

/// Digit classes.
pub const N_CLASSES: usize = 10;

/// The largest pixel intensity.
pub const MAX_PIXEL: f32 = 16.;

const SIDE: usize = 8;

#[rustfmt::skip]
const GLYPHS: [[&str; SIDE]; N_CLASSES] = [
    ["..####..", ".##..##.", ".##..##.", ".##..##.", ".##..##.", ".##..##.", ".##..##.", "..####.."],
    ["...##...", "..###...", "...##...", "...##...", "...##...", "...##...", "...##...", "..####.."],
    ["..####..", ".##..##.", ".....##.", "....##..", "...##...", "..##....", ".##.....", ".######."],
    ["..####..", ".##..##.", ".....##.", "...###..", ".....##.", ".....##.", ".##..##.", "..####.."],
    ["....##..", "...###..", "..####..", ".##.##..", ".######.", "....##..", "....##..", "....##.."],
    [".######.", ".##.....", ".#####..", ".....##.", ".....##.", ".....##.", ".##..##.", "..####.."],
    ["..####..", ".##.....", ".##.....", ".#####..", ".##..##.", ".##..##.", ".##..##.", "..####.."],
    [".######.", ".....##.", "....##..", "....##..", "...##...", "...##...", "..##....", "..##...."],
    ["..####..", ".##..##.", ".##..##.", "..####..", ".##..##.", ".##..##.", ".##..##.", "..####.."],
    ["..####..", ".##..##.", ".##..##.", "..#####.", ".....##.", ".....##.", "....##..", "..###..."],
];

/// Loads a digits file from disk.
///
/// # Arguments
/// * `path` - The path to an optdigits formatted CSV file.
///
/// # Returns
/// The dataset with raw (unscaled) pixel intensities.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let file = File::open(path)?;
    parse(BufReader::new(file))
}

/// Parses optdigits formatted rows, blank lines are skipped.
///
/// # Arguments
/// * `reader` - The source of the rows.
///
/// # Returns
/// The dataset or an error pointing at the first malformed line.
pub fn parse<R: BufRead>(reader: R) -> Result<Dataset> {
    let mut features = Vec::new();
    let mut labels = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        if values.len() != N_FEATURES + 1 {
            return Err(MlErr::Parse {
                line: line_no,
                msg: format!("expected {} values, got {}", N_FEATURES + 1, values.len()),
            });
        }

        for value in &values[..N_FEATURES] {
            let pixel: u8 = value.parse().map_err(|e| MlErr::Parse {
                line: line_no,
                msg: format!("invalid pixel '{value}': {e}"),
            })?;

            let pixel = f32::from(pixel);
            if pixel > MAX_PIXEL {
                return Err(MlErr::Parse {
                    line: line_no,
                    msg: format!("pixel {pixel} is greater than {MAX_PIXEL}"),
                });
            }

            features.push(pixel);
        }

        let raw_label = values[N_FEATURES];
        let label: usize = raw_label.parse().map_err(|e| MlErr::Parse {
            line: line_no,
            msg: format!("invalid label '{raw_label}': {e}"),
        })?;

        if label >= N_CLASSES {
            return Err(MlErr::Parse {
                line: line_no,
                msg: format!("label {label} is not a digit"),
            });
        }

        labels.push(label);
    }

    if labels.is_empty() {
        return Err(MlErr::InvalidDataset("no samples found".into()));
    }

    Dataset::from_labels(features, &labels, N_FEATURES, N_CLASSES)
}

/// Renders noisy 8x8 digits.
///
/// Every sample is a fixed glyph shifted by at most one pixel in each direction, with
/// gaussian noise added to every pixel and the result clamped to `0..=MAX_PIXEL`. Classes
/// are interleaved: sample `i` is digit `i % 10`.
///
/// # Arguments
/// * `samples_per_class` - How many images to render of each digit.
/// * `noise` - The noise's standard deviation as a fraction of `MAX_PIXEL`.
/// * `rng` - A random number generator.
///
/// # Returns
/// The dataset with raw (unscaled) pixel intensities.
pub fn synthetic<R: Rng + ?Sized>(
    samples_per_class: usize,
    noise: f32,
    rng: &mut R,
) -> Result<Dataset> {
    if samples_per_class == 0 {
        return Err(MlErr::InvalidDataset(
            "samples_per_class must be greater than 0".into(),
        ));
    }
    if !(noise.is_finite() && noise >= 0.) {
        return Err(MlErr::InvalidDataset(format!(
            "noise must be finite and >= 0, got {noise}"
        )));
    }

    let normal = Normal::new(0., noise * MAX_PIXEL)?;
    let n = samples_per_class * N_CLASSES;
    let mut features = Vec::with_capacity(n * N_FEATURES);
    let mut labels = Vec::with_capacity(n);

    for _ in 0..samples_per_class {
        for (digit, glyph) in GLYPHS.iter().enumerate() {
            let dy = rng.random_range(-1..=1);
            let dx = rng.random_range(-1..=1);

            for row in 0..SIDE as i32 {
                for col in 0..SIDE as i32 {
                    let clean = glyph_pixel(glyph, row - dy, col - dx);
                    let noisy = clean + normal.sample(rng);
                    features.push(noisy.clamp(0., MAX_PIXEL));
                }
            }

            labels.push(digit);
        }
    }

    Dataset::from_labels(features, &labels, N_FEATURES, N_CLASSES)
}

fn glyph_pixel(glyph: &[&str; SIDE], row: i32, col: i32) -> f32 {
    let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
        return 0.;
    };

    match glyph.get(row).and_then(|line| line.as_bytes().get(col)) {
        Some(b'#') => MAX_PIXEL,
        _ => 0.,
    }
}
