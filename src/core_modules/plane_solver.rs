// THEORY:
// The `plane_solver` module powers the interactive 2D PCA playground: the
// user clicks points onto a plane and the principal axes of the growing
// cloud update live. At dimensionality two the eigenproblem has a closed
// form — the characteristic polynomial is a quadratic — so this module
// deliberately does NOT reach for the general Jacobi solver in `eigen`. The
// closed form is less code, exact, and runs comfortably on every mutation of
// the point set, which is bounded by a human clicking.
//
// Key architectural principles:
// 1.  **Stateful owner**: `PointCloud` owns the session's points and its own
//     recompute; callers push points and read the latest analysis, the way a
//     stateful analyzer owns its history and publishes learned state.
// 2.  **Synchronous by contract**: recomputation is O(n) and happens inline
//     on every mutation. No background execution, no suspension points.
// 3.  **Recoverable failure**: a negative discriminant beyond floating-point
//     tolerance is reported as an error, but the cloud keeps accepting
//     points; a reset clears everything. Errors are never fatal.

use crate::error::{PcaError, Result};

/// Cosmetic stretch factor applied to displayed axes.
const DISPLAY_SCALE: f64 = 2.5;

/// Below this magnitude the off-diagonal covariance is treated as zero and
/// the matrix as diagonal.
const COVARIANCE_EPSILON: f64 = 1e-10;

/// Negative discriminants within this relative tolerance are clamped to
/// zero; anything larger is a genuine numeric failure.
const DISCRIMINANT_TOLERANCE: f64 = 1e-9;

/// A point on the interaction plane, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The three scalars that fully describe a 2x2 covariance matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovarianceScalars {
    pub var_x: f64,
    pub var_y: f64,
    pub cov_xy: f64,
}

/// One principal axis of the point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalAxis {
    /// Unit-length direction of the axis.
    pub direction: Point2,
    /// Variance explained along this axis.
    pub eigenvalue: f64,
    /// Direction scaled by `sqrt(eigenvalue) * DISPLAY_SCALE` for drawing.
    pub display: Point2,
}

/// The full analysis of the current point set: mean, covariance scalars, and
/// both principal axes sorted descending by eigenvalue.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneAnalysis {
    pub mean: Point2,
    pub scalars: CovarianceScalars,
    pub axes: [PrincipalAxis; 2],
}

/// An ordered, growable set of user-entered points with live PCA.
///
/// Analysis is recomputed on every mutation once at least two points exist;
/// below that the analysis is absent. Nothing here is ever persisted.
#[derive(Debug, Default)]
pub struct PointCloud {
    points: Vec<Point2>,
    analysis: Option<PlaneAnalysis>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point and synchronously recomputes the analysis.
    ///
    /// Returns the fresh analysis, or `None` while fewer than two points
    /// exist. A `NumericInstability` error leaves the point set intact.
    pub fn add_point(&mut self, point: Point2) -> Result<Option<&PlaneAnalysis>> {
        self.points.push(point);
        self.recompute()?;
        Ok(self.analysis.as_ref())
    }

    /// Clears all points and the derived analysis.
    pub fn clear(&mut self) {
        self.points.clear();
        self.analysis = None;
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// The analysis for the current point set, if it has one.
    pub fn analysis(&self) -> Option<&PlaneAnalysis> {
        self.analysis.as_ref()
    }

    fn recompute(&mut self) -> Result<()> {
        if self.points.len() < 2 {
            self.analysis = None;
            return Ok(());
        }
        self.analysis = Some(solve(&self.points)?);
        Ok(())
    }
}

/// Closed-form PCA of a set of at least two 2D points.
pub fn solve(points: &[Point2]) -> Result<PlaneAnalysis> {
    let n = points.len();
    if n < 2 {
        return Err(PcaError::InsufficientSamples { rows: n });
    }

    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n as f64;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n as f64;

    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    let mut sum_xy = 0.0;
    for p in points {
        let dx = p.x - mean_x;
        let dy = p.y - mean_y;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
        sum_xy += dx * dy;
    }

    let denom = (n - 1) as f64;
    let scalars = CovarianceScalars {
        var_x: sum_xx / denom,
        var_y: sum_yy / denom,
        cov_xy: sum_xy / denom,
    };

    // Characteristic equation of [[varX, covXY], [covXY, varY]]:
    // lambda^2 - trace * lambda + det = 0.
    let trace = scalars.var_x + scalars.var_y;
    let det = scalars.var_x * scalars.var_y - scalars.cov_xy * scalars.cov_xy;
    let mut discriminant = trace * trace - 4.0 * det;

    // A real symmetric matrix has real eigenvalues, so the discriminant is
    // mathematically non-negative; only rounding can push it below zero.
    if discriminant < 0.0 {
        if discriminant >= -DISCRIMINANT_TOLERANCE * (trace * trace).max(1.0) {
            discriminant = 0.0;
        } else {
            return Err(PcaError::NumericInstability { discriminant });
        }
    }

    let sqrt_disc = discriminant.sqrt();
    let lambda1 = (trace + sqrt_disc) / 2.0;
    let lambda2 = (trace - sqrt_disc) / 2.0;

    let axis = |lambda: f64| -> PrincipalAxis {
        let direction = eigenvector_for(lambda, &scalars);
        // Variance can round slightly negative at machine precision.
        let magnitude = lambda.max(0.0).sqrt() * DISPLAY_SCALE;
        PrincipalAxis {
            direction,
            eigenvalue: lambda,
            display: Point2::new(direction.x * magnitude, direction.y * magnitude),
        }
    };

    // lambda1 >= lambda2 by construction of the quadratic roots.
    Ok(PlaneAnalysis {
        mean: Point2::new(mean_x, mean_y),
        scalars,
        axes: [axis(lambda1), axis(lambda2)],
    })
}

/// Unit eigenvector of the covariance matrix for eigenvalue `lambda`.
fn eigenvector_for(lambda: f64, s: &CovarianceScalars) -> Point2 {
    if s.cov_xy.abs() > COVARIANCE_EPSILON {
        let vx = lambda - s.var_y;
        let vy = s.cov_xy;
        let mag = (vx * vx + vy * vy).sqrt();
        Point2::new(vx / mag, vy / mag)
    } else if (lambda - s.var_x).abs() < (lambda - s.var_y).abs() {
        // Diagonal matrix; lambda belongs to the x variance.
        Point2::new(1.0, 0.0)
    } else {
        Point2::new(0.0, 1.0)
    }
}
