// THEORY:
// The `channel` module bridges packed pixel data and the numeric layer. An
// image arrives as an interleaved RGBA byte buffer; PCA operates on one color
// plane at a time, treated as a `height x width` real matrix whose columns
// are pixel columns. This module owns that transformation: de-interleaving a
// plane out of the packed buffer, computing per-column means, centering, and
// building the sample covariance matrix that the eigensolver consumes.
//
// Key architectural principles:
// 1.  **Immutable extraction**: a `ChannelPlane` is extracted once from the
//     packed buffer and never written back; reconstruction produces a new
//     plane. The packed buffer is only touched again during recombination.
// 2.  **Columns as variables**: covariance is taken across pixel columns
//     (mean down the rows), matching the statistical view of each column as
//     one variable sampled once per row.
// 3.  **Symmetry by construction**: only the upper triangle of the
//     covariance matrix is computed; the lower triangle is mirrored. This
//     halves the arithmetic and makes `cov[i][j] == cov[j][i]` exact, not
//     approximate.

use crate::core_modules::matrix::Matrix;
use crate::error::{PcaError, Result};

/// One of the three color planes of an RGBA image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Byte offset of this channel inside a packed RGBA pixel.
    #[inline]
    pub fn offset(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// A single color plane as a dense `height x width` matrix of real samples.
#[derive(Debug, Clone)]
pub struct ChannelPlane {
    /// Plane width in pixel columns.
    pub width: usize,
    /// Plane height in pixel rows.
    pub height: usize,
    /// Row-major samples, `height * width` long.
    pub samples: Vec<f64>,
}

impl ChannelPlane {
    /// De-interleaves one channel out of a packed RGBA buffer.
    ///
    /// Fails with `EmptyImage` for zero dimensions and `BufferSizeMismatch`
    /// when the buffer does not hold `width * height * 4` bytes.
    pub fn from_rgba(buffer: &[u8], width: u32, height: u32, channel: Channel) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PcaError::EmptyImage { width, height });
        }
        let pixel_count = width as usize * height as usize;
        let expected = pixel_count * 4;
        if buffer.len() != expected {
            return Err(PcaError::BufferSizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }

        let offset = channel.offset();
        let mut samples = Vec::with_capacity(pixel_count);
        for i in 0..pixel_count {
            samples.push(buffer[i * 4 + offset] as f64);
        }

        Ok(Self {
            width: width as usize,
            height: height as usize,
            samples,
        })
    }

    /// Wraps an existing row-major sample buffer as a plane.
    pub fn from_samples(width: usize, height: usize, samples: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PcaError::EmptyImage {
                width: width as u32,
                height: height as u32,
            });
        }
        let expected = width * height;
        if samples.len() != expected {
            return Err(PcaError::BufferSizeMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Sample at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.samples[row * self.width + col]
    }

    /// Arithmetic mean of each pixel column, taken down the rows.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.width];
        for row in 0..self.height {
            let row_slice = &self.samples[row * self.width..(row + 1) * self.width];
            for (mean, sample) in means.iter_mut().zip(row_slice.iter()) {
                *mean += sample;
            }
        }
        let inv = 1.0 / self.height as f64;
        for mean in &mut means {
            *mean *= inv;
        }
        means
    }

    /// Subtracts the column means from every row, producing the centered
    /// matrix the covariance computation operates on.
    pub fn centered(&self, means: &[f64]) -> Matrix {
        let mut data = Vec::with_capacity(self.samples.len());
        for row in 0..self.height {
            let row_slice = &self.samples[row * self.width..(row + 1) * self.width];
            for (sample, mean) in row_slice.iter().zip(means.iter()) {
                data.push(sample - mean);
            }
        }
        // Length is height * width by construction.
        Matrix::from_vec(self.height, self.width, data)
            .unwrap_or_else(|_| Matrix::zeros(self.height, self.width))
    }
}

/// Sample covariance of a centered `height x width` matrix:
/// `cov[i][j] = sum_r(centered[r][i] * centered[r][j]) / (height - 1)`.
///
/// Fails with `InsufficientSamples` for a single row, where Bessel's
/// correction would divide by zero.
pub fn covariance(centered: &Matrix) -> Result<Matrix> {
    let h = centered.rows();
    let w = centered.cols();
    if h < 2 {
        return Err(PcaError::InsufficientSamples { rows: h });
    }

    let denom = (h - 1) as f64;
    let mut cov = Matrix::zeros(w, w);

    // Upper triangle only; mirror into the lower triangle.
    for i in 0..w {
        for j in i..w {
            let mut sum = 0.0;
            for r in 0..h {
                sum += centered.get(r, i) * centered.get(r, j);
            }
            let value = sum / denom;
            cov.set(i, j, value);
            cov.set(j, i, value);
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn extracts_channels_from_packed_rgba() {
        // Two pixels: (10, 20, 30, 255) and (40, 50, 60, 255).
        let buffer = vec![10, 20, 30, 255, 40, 50, 60, 255];
        let red = ChannelPlane::from_rgba(&buffer, 2, 1, Channel::Red).unwrap();
        let green = ChannelPlane::from_rgba(&buffer, 2, 1, Channel::Green).unwrap();
        let blue = ChannelPlane::from_rgba(&buffer, 2, 1, Channel::Blue).unwrap();
        assert_eq!(red.samples, vec![10.0, 40.0]);
        assert_eq!(green.samples, vec![20.0, 50.0]);
        assert_eq!(blue.samples, vec![30.0, 60.0]);
    }

    #[test]
    fn rejects_zero_dimensions() {
        let result = ChannelPlane::from_rgba(&[], 0, 4, Channel::Red);
        assert_eq!(
            result.err(),
            Some(PcaError::EmptyImage {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn rejects_short_buffer() {
        let buffer = vec![0u8; 7];
        let result = ChannelPlane::from_rgba(&buffer, 2, 1, Channel::Red);
        assert_eq!(
            result.err(),
            Some(PcaError::BufferSizeMismatch {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn column_means_average_down_rows() {
        // 2x3 plane: rows [1 2 3] and [3 6 9] -> means [2 4 6].
        let plane =
            ChannelPlane::from_samples(3, 2, vec![1.0, 2.0, 3.0, 3.0, 6.0, 9.0]).unwrap();
        assert_eq!(plane.column_means(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn centering_zeroes_column_sums() {
        let plane =
            ChannelPlane::from_samples(3, 2, vec![1.0, 2.0, 3.0, 3.0, 6.0, 9.0]).unwrap();
        let centered = plane.centered(&plane.column_means());
        for col in 0..3 {
            let sum: f64 = (0..2).map(|row| centered.get(row, col)).sum();
            assert!(sum.abs() < EPS);
        }
    }

    #[test]
    fn covariance_is_exactly_symmetric() {
        let plane = ChannelPlane::from_samples(
            3,
            4,
            vec![
                1.0, 7.0, 2.0, 4.0, 3.0, 8.0, 9.0, 1.0, 5.0, 2.0, 6.0, 0.0,
            ],
        )
        .unwrap();
        let cov = covariance(&plane.centered(&plane.column_means())).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(cov.get(i, j), cov.get(j, i));
            }
            assert!(cov.get(i, i) >= 0.0);
        }
    }

    #[test]
    fn covariance_hand_computed() {
        // Columns x = [1, 3], y = [2, 6]. Means 2 and 4; centered
        // x = [-1, 1], y = [-2, 2]. With n-1 = 1:
        // var(x) = 2, var(y) = 8, cov(x, y) = 4.
        let plane = ChannelPlane::from_samples(2, 2, vec![1.0, 2.0, 3.0, 6.0]).unwrap();
        let cov = covariance(&plane.centered(&plane.column_means())).unwrap();
        assert!((cov.get(0, 0) - 2.0).abs() < EPS);
        assert!((cov.get(1, 1) - 8.0).abs() < EPS);
        assert!((cov.get(0, 1) - 4.0).abs() < EPS);
    }

    #[test]
    fn covariance_rejects_single_row() {
        let plane = ChannelPlane::from_samples(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let result = covariance(&plane.centered(&plane.column_means()));
        assert_eq!(result.err(), Some(PcaError::InsufficientSamples { rows: 1 }));
    }
}
