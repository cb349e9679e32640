// THEORY:
// The `channel_pca` module is the heart of the compression engine. For one
// color plane it runs the full PCA cycle: center, build the covariance
// matrix, eigendecompose, keep the top-k principal components, and map the
// centered data back through the reduced subspace.
//
// Key architectural principles:
// 1.  **One multiply, not two**: reconstruction folds projection and
//     back-projection into a single precomputed operator `M = P * P^T`.
//     Per channel that is one O(n*w^2) multiply plus a one-time O(w^2*k)
//     product, instead of two O(n*w*k) multiplies — a net win when k is far
//     below the width, which is the entire point of compression. This is a
//     deliberate design decision, not an accident of the math.
// 2.  **Display sampling is not computation**: the diagnostics carry only a
//     small corner of the covariance and eigenvector matrices and the top
//     eigenvalues. Full matrices at image resolution are far too large to
//     ship across a message boundary or render, but the reconstruction
//     itself always uses the full-precision matrices. Sampling happens in a
//     separate step after the math is done.
// 3.  **Reject, never clamp**: an out-of-range component count is a caller
//     bug and comes back as an error, so a silently degraded reconstruction
//     can never masquerade as the requested one.

use serde::{Deserialize, Serialize};

use crate::core_modules::channel::{ChannelPlane, covariance};
use crate::core_modules::eigen::{SymmetricEigen, decompose_symmetric};
use crate::core_modules::matrix::Matrix;
use crate::error::{PcaError, Result};

/// Side length of the covariance / eigenvector corner sample kept for
/// display.
const DIAGNOSTIC_SAMPLE: usize = 5;

/// Number of leading eigenvalues kept for display.
const DIAGNOSTIC_EIGENVALUES: usize = 10;

/// Small display-sized excerpt of one channel's PCA internals.
///
/// Field names follow the worker protocol (`cov`, `eigVals`, `eigVecs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDiagnostics {
    /// Top-left corner of the covariance matrix, at most 5x5.
    pub cov: Vec<Vec<f64>>,
    /// Leading eigenvalues, descending, at most 10.
    #[serde(rename = "eigVals")]
    pub eig_vals: Vec<f64>,
    /// Top-left corner of the eigenvector matrix, at most 5x5.
    #[serde(rename = "eigVecs")]
    pub eig_vecs: Vec<Vec<f64>>,
    /// Share of total variance retained by the kept components, in [0, 1].
    #[serde(rename = "explainedVariance")]
    pub explained_variance: f64,
}

impl ChannelDiagnostics {
    /// Samples the display excerpt out of the full-precision matrices.
    fn sample(cov: &Matrix, eigen: &SymmetricEigen, num_components: usize) -> Self {
        let corner = |m: &Matrix| -> Vec<Vec<f64>> {
            let rows = m.rows().min(DIAGNOSTIC_SAMPLE);
            let cols = m.cols().min(DIAGNOSTIC_SAMPLE);
            (0..rows)
                .map(|i| (0..cols).map(|j| m.get(i, j)).collect())
                .collect()
        };

        let eig_vals: Vec<f64> = eigen
            .eigenvalues
            .iter()
            .take(DIAGNOSTIC_EIGENVALUES)
            .copied()
            .collect();

        // Eigenvalues of a PSD matrix are non-negative up to rounding noise;
        // clamp before forming the ratio so it stays inside [0, 1].
        let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        let retained: f64 = eigen
            .eigenvalues
            .iter()
            .take(num_components)
            .map(|v| v.max(0.0))
            .sum();
        let explained_variance = if total > 0.0 {
            (retained / total).min(1.0)
        } else {
            // A constant plane has zero variance; any k retains all of it.
            1.0
        };

        Self {
            cov: corner(cov),
            eig_vals,
            eig_vecs: corner(&eigen.eigenvectors),
            explained_variance,
        }
    }
}

/// Result of PCA-reconstructing one channel.
#[derive(Debug, Clone)]
pub struct ChannelReconstruction {
    /// The reconstructed plane, real-valued, not yet clamped to pixel range.
    pub plane: ChannelPlane,
    /// Display excerpt of the matrices behind the reconstruction.
    pub diagnostics: ChannelDiagnostics,
}

/// Runs the full PCA cycle on one channel plane, keeping `num_components`
/// principal components.
///
/// Fails with `InvalidComponentCount` when `num_components` lies outside
/// `[1, width]`, `InsufficientSamples` for single-row planes, and
/// `Decomposition` if the eigensolver does not converge.
pub fn reconstruct_channel(
    plane: &ChannelPlane,
    num_components: usize,
) -> Result<ChannelReconstruction> {
    if num_components < 1 || num_components > plane.width {
        return Err(PcaError::InvalidComponentCount {
            requested: num_components,
            max: plane.width,
        });
    }

    let means = plane.column_means();
    let centered = plane.centered(&means);
    let cov = covariance(&centered)?;
    let eigen = decompose_symmetric(&cov)?;

    // M = P * P^T: projection and back-projection folded into one operator.
    let projection = eigen.eigenvectors.left_columns(num_components);
    let reconstruction_operator = projection.matmul(&projection.transpose())?;
    let reconstructed = centered.matmul(&reconstruction_operator)?;

    // Re-add the column means the centering removed.
    let mut samples = Vec::with_capacity(plane.samples.len());
    for row in 0..plane.height {
        for col in 0..plane.width {
            samples.push(reconstructed.get(row, col) + means[col]);
        }
    }

    let diagnostics = ChannelDiagnostics::sample(&cov, &eigen, num_components);
    Ok(ChannelReconstruction {
        plane: ChannelPlane::from_samples(plane.width, plane.height, samples)?,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn plane_4x4() -> ChannelPlane {
        ChannelPlane::from_samples(
            4,
            4,
            vec![
                10.0, 10.0, 10.0, 10.0, //
                20.0, 20.0, 20.0, 20.0, //
                30.0, 30.0, 30.0, 30.0, //
                40.0, 40.0, 40.0, 40.0, //
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_components() {
        let result = reconstruct_channel(&plane_4x4(), 0);
        assert_eq!(
            result.err(),
            Some(PcaError::InvalidComponentCount {
                requested: 0,
                max: 4
            })
        );
    }

    #[test]
    fn rejects_components_beyond_width() {
        let result = reconstruct_channel(&plane_4x4(), 5);
        assert_eq!(
            result.err(),
            Some(PcaError::InvalidComponentCount {
                requested: 5,
                max: 4
            })
        );
    }

    #[test]
    fn full_rank_reconstruction_is_lossless() {
        let plane = ChannelPlane::from_samples(
            3,
            4,
            vec![
                12.0, 47.0, 8.0, //
                99.0, 3.0, 61.0, //
                27.0, 88.0, 14.0, //
                5.0, 73.0, 42.0, //
            ],
        )
        .unwrap();
        let rec = reconstruct_channel(&plane, 3).unwrap();
        for (a, b) in plane.samples.iter().zip(rec.plane.samples.iter()) {
            assert!((a - b).abs() < EPS, "{a} vs {b}");
        }
    }

    #[test]
    fn known_4x4_rank_one_case() {
        // Every row is a constant multiple of [1, 1, 1, 1]:
        //   rows = 10, 20, 30, 40. Column means are all 25.
        //   Centered columns are each [-15, -5, 5, 15], so every covariance
        //   entry is (225 + 25 + 25 + 225) / 3 = 500/3.
        //   The lone nonzero eigenvalue is 4 * 500/3 = 2000/3 with
        //   eigenvector [1/2, 1/2, 1/2, 1/2]; rank one, so k = 1
        //   reconstructs the plane exactly.
        let plane = plane_4x4();
        assert_eq!(plane.column_means(), vec![25.0, 25.0, 25.0, 25.0]);

        let cov = covariance(&plane.centered(&plane.column_means())).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert!((cov.get(i, j) - 500.0 / 3.0).abs() < EPS);
            }
        }

        let rec = reconstruct_channel(&plane, 1).unwrap();
        assert!((rec.diagnostics.eig_vals[0] - 2000.0 / 3.0).abs() < 1e-4);
        for (a, b) in plane.samples.iter().zip(rec.plane.samples.iter()) {
            assert!((a - b).abs() < EPS);
        }
        assert!((rec.diagnostics.explained_variance - 1.0).abs() < EPS);
    }

    #[test]
    fn full_rank_pipeline_is_idempotent() {
        let plane = ChannelPlane::from_samples(
            3,
            3,
            vec![1.0, 50.0, 200.0, 30.0, 90.0, 10.0, 77.0, 5.0, 120.0],
        )
        .unwrap();
        let first = reconstruct_channel(&plane, 3).unwrap();
        let second = reconstruct_channel(&first.plane, 3).unwrap();
        for (a, b) in first.plane.samples.iter().zip(second.plane.samples.iter()) {
            assert!((a - b).abs() < EPS);
        }
    }

    #[test]
    fn diagnostics_are_capped_for_display() {
        let width = 8;
        let height = 8;
        let samples: Vec<f64> = (0..width * height).map(|i| (i * 7 % 251) as f64).collect();
        let plane = ChannelPlane::from_samples(width, height, samples).unwrap();
        let rec = reconstruct_channel(&plane, 2).unwrap();

        assert_eq!(rec.diagnostics.cov.len(), 5);
        assert_eq!(rec.diagnostics.cov[0].len(), 5);
        assert_eq!(rec.diagnostics.eig_vecs.len(), 5);
        assert!(rec.diagnostics.eig_vals.len() <= 10);
        assert!(rec.diagnostics.explained_variance >= 0.0);
        assert!(rec.diagnostics.explained_variance <= 1.0);
    }

    #[test]
    fn single_row_plane_fails_insufficient_samples() {
        let plane = ChannelPlane::from_samples(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let result = reconstruct_channel(&plane, 1);
        assert_eq!(result.err(), Some(PcaError::InsufficientSamples { rows: 1 }));
    }
}
