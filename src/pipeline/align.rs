use crate::error::{Result, SpliceError};
use imageproc::geometric_transformations::Projection;
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use ndarray::{Array2, Axis};
use tracing::{Level, span, trace};

/// `[s·R | t]` in homogeneous form, mapping column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    matrix: Matrix3<f64>,
}

impl SimilarityTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn new(scale: f64, theta: f64, tx: f64, ty: f64) -> Self {
        let (s, c) = theta.sin_cos();
        #[rustfmt::skip]
        let matrix = Matrix3::new(
            scale * c, -scale * s, tx,
            scale * s,  scale * c, ty,
            0.,         0.,        1.,
        );
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn scale(&self) -> f64 {
        let m = &self.matrix;
        (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]).abs().sqrt()
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.matrix[(1, 0)].atan2(self.matrix[(0, 0)])
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.matrix[(0, 2)], self.matrix[(1, 2)])
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.matrix * Vector3::new(x, y, 1.);
        (p.x, p.y)
    }

    /// Applies the transform to every `(x, y)` row.
    pub fn apply_all(&self, points: &Array2<f64>) -> Array2<f64> {
        let mut out = points.clone();
        for mut row in out.rows_mut() {
            let (x, y) = self.apply(row[0], row[1]);
            row[0] = x;
            row[1] = y;
        }
        out
    }

    pub fn inverse(&self) -> Result<Self> {
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or_else(|| SpliceError::DegenerateGeometry("transform is not invertible".into()))
    }

    /// The transform as an imageproc projection mapping source pixels to output pixels.
    pub fn projection(&self) -> Result<Projection> {
        let m = self.matrix.map(|v| v as f32);
        #[rustfmt::skip]
        let rows = [
            m[(0, 0)], m[(0, 1)], m[(0, 2)],
            m[(1, 0)], m[(1, 1)], m[(1, 2)],
            m[(2, 0)], m[(2, 1)], m[(2, 2)],
        ];
        Projection::from_matrix(rows)
            .ok_or_else(|| SpliceError::DegenerateGeometry("transform is not invertible".into()))
    }
}

/// Procrustes analysis: the similarity transform that carries `points2` onto
/// `points1` with the least summed squared distance. Rows correspond.
pub fn solve(points1: &Array2<f64>, points2: &Array2<f64>) -> Result<SimilarityTransform> {
    let span = span!(Level::DEBUG, "align");
    let _guard = span.enter();

    if points1.dim() != points2.dim() || points1.ncols() != 2 {
        return Err(SpliceError::ShapeMismatch(format!(
            "cannot align {:?} points with {:?} points",
            points1.dim(),
            points2.dim()
        )));
    }
    if points1.nrows() < 2 {
        return Err(SpliceError::DegenerateGeometry(format!(
            "need at least 2 points to align, got {}",
            points1.nrows()
        )));
    }
    if points1.iter().chain(points2.iter()).any(|v| !v.is_finite()) {
        return Err(SpliceError::DegenerateGeometry("non-finite landmark".into()));
    }

    let (c1, p1) = center(points1)?;
    let (c2, p2) = center(points2)?;

    let s1 = p1.std(0.);
    let s2 = p2.std(0.);
    if s1 <= f64::EPSILON || s2 <= f64::EPSILON {
        return Err(SpliceError::DegenerateGeometry(format!(
            "point set has no spread ({s1}, {s2})"
        )));
    }
    let p1 = p1 / s1;
    let p2 = p2 / s2;

    let h = p2.t().dot(&p1);
    let h = Matrix2::new(h[[0, 0]], h[[0, 1]], h[[1, 0]], h[[1, 1]]);
    let svd = h.try_svd(true, true, f64::EPSILON, 0).ok_or_else(|| {
        SpliceError::DegenerateGeometry("SVD of the covariance did not converge".into())
    })?;
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(SpliceError::DegenerateGeometry(
                "SVD of the covariance is incomplete".into(),
            ));
        }
    };

    // Rows are points, so U·Vᵗ acts from the right; transpose for column vectors.
    let r = (u * v_t).transpose();
    let sr = r * (s1 / s2);
    let t = c1 - sr * c2;

    trace!("scale {} translation {:?}", s1 / s2, t);

    #[rustfmt::skip]
    let matrix = Matrix3::new(
        sr[(0, 0)], sr[(0, 1)], t.x,
        sr[(1, 0)], sr[(1, 1)], t.y,
        0.,         0.,         1.,
    );

    Ok(SimilarityTransform { matrix })
}

fn center(points: &Array2<f64>) -> Result<(Vector2<f64>, Array2<f64>)> {
    let c = points
        .mean_axis(Axis(0))
        .ok_or_else(|| SpliceError::DegenerateGeometry("empty point set".into()))?;
    Ok((Vector2::new(c[0], c[1]), points - &c))
}
