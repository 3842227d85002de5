//! Overlap volume between two density fields.
//!
//! The overlap of two fields `f` and `g` is the integral of `min(f, g)` over
//! the whole plane. It is evaluated as an iterated integral: an outer
//! integral over `x` whose integrand is itself an integral over `y`.
//!
//! # Quadrature
//!
//! Each one-dimensional integral runs over the entire real line. The line is
//! cut at the breakpoints both fields report for that axis (blob centres and
//! their flanks, wall lines) into finite pieces plus two semi-infinite tails.
//! Finite pieces are integrated as they are; a tail starting at `b` is mapped
//! onto `[0, 1)` with
//!
//! `x = b ± t / (1 - t)`, `dx = dt / (1 - t)²`
//!
//! All pieces share one globally adaptive Gauss-Kronrod (7/15) rule: the
//! segment with the largest error estimate is bisected until the summed error
//! drops below the tolerance or the subdivision limit is reached. Since every
//! feature of a field sits on a piece boundary, no feature can fall between
//! the sample points wherever it lies on the plane.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Coordinate axis of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn of(self, point: DVec2) -> f64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }
}

/// Scalar occupancy field over the plane with values in [0, 1].
pub trait DensityField {
    /// Occupancy at `point`.
    fn density(&self, point: DVec2) -> f64;

    /// Coordinates along `axis` where the field has its features: peaks,
    /// flanks and discontinuities. Integration splits the line there.
    fn breakpoints(&self, _axis: Axis, _out: &mut Vec<f64>) {}
}

impl<F: DensityField + ?Sized> DensityField for &F {
    fn density(&self, point: DVec2) -> f64 {
        (**self).density(point)
    }

    fn breakpoints(&self, axis: Axis, out: &mut Vec<f64>) {
        (**self).breakpoints(axis, out)
    }
}

/// Number of equal segments each piece of the line starts with.
pub const SEGMENTS_PER_PIECE: usize = 2;

/// Kronrod abscissae on [-1, 1]; odd indices are shared with the Gauss rule.
const KRONROD_NODES: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

const KRONROD_WEIGHTS: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_2,
    0.140_653_259_715_525_9,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_8,
];

const GAUSS_WEIGHTS: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Tolerances and evaluation budget for one-dimensional integrals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadratureSettings {
    /// Absolute error target
    pub absolute_tolerance: f64,
    /// Error target relative to the magnitude of the estimate
    pub relative_tolerance: f64,
    /// Maximum number of segments per one-dimensional integral
    pub subdivision_limit: usize,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1.49e-8,
            relative_tolerance: 1.49e-8,
            subdivision_limit: 256,
        }
    }
}

/// Failure of an adaptive integral to converge.
#[derive(Debug, Clone, PartialEq)]
pub enum QuadratureError {
    /// The segment budget ran out before the error estimate met the tolerance
    SubdivisionLimit { limit: usize, error_estimate: f64 },
    /// A segment became too narrow to bisect in floating point
    Roundoff { lower: f64, upper: f64 },
    /// The integrand produced a NaN or infinite contribution
    NonFinite,
}

impl std::fmt::Display for QuadratureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuadratureError::SubdivisionLimit {
                limit,
                error_estimate,
            } => write!(
                f,
                "Integral did not converge within {} subdivisions (error estimate {:e})",
                limit, error_estimate
            ),
            QuadratureError::Roundoff { lower, upper } => write!(
                f,
                "Integration segment [{}, {}] cannot be subdivided further",
                lower, upper
            ),
            QuadratureError::NonFinite => write!(f, "Integrand produced a non-finite value"),
        }
    }
}

impl std::error::Error for QuadratureError {}

/// Integral of `min(first, second)` over the whole plane.
///
/// The result is symmetric in its arguments: both orders evaluate the same
/// points and `min` commutes. Rounding noise below zero is clamped away.
pub fn overlap<A, B>(first: &A, second: &B, settings: &QuadratureSettings) -> Result<f64, QuadratureError>
where
    A: DensityField + ?Sized,
    B: DensityField + ?Sized,
{
    let columns = joint_breakpoints(first, second, Axis::X);
    let rows = joint_breakpoints(first, second, Axis::Y);
    integrate_real_line(
        |x| {
            integrate_real_line(
                |y| {
                    let point = DVec2::new(x, y);
                    Ok(first.density(point).min(second.density(point)))
                },
                &rows,
                settings,
            )
        },
        &columns,
        settings,
    )
    .map(|volume| volume.max(0.0))
}

fn joint_breakpoints<A, B>(first: &A, second: &B, axis: Axis) -> Vec<f64>
where
    A: DensityField + ?Sized,
    B: DensityField + ?Sized,
{
    let mut points = Vec::new();
    first.breakpoints(axis, &mut points);
    second.breakpoints(axis, &mut points);
    points
}

/// Integrate `integrand` over `(-∞, ∞)`, split at `breakpoints`.
///
/// Breakpoints may come in any order and may repeat; non-finite ones are
/// ignored, and with none left the line is split at the origin. The
/// integrand is fallible so that nested integrals can propagate their own
/// convergence failures.
pub fn integrate_real_line<F>(
    mut integrand: F,
    breakpoints: &[f64],
    settings: &QuadratureSettings,
) -> Result<f64, QuadratureError>
where
    F: FnMut(f64) -> Result<f64, QuadratureError>,
{
    let pieces = Piece::split(breakpoints);
    let limit = settings
        .subdivision_limit
        .max(pieces.len() * SEGMENTS_PER_PIECE);
    let mut segments = Vec::with_capacity(limit);
    for piece in &pieces {
        let (start, end) = piece.parameter_range();
        let width = (end - start) / SEGMENTS_PER_PIECE as f64;
        for index in 0..SEGMENTS_PER_PIECE {
            let lower = start + width * index as f64;
            let upper = if index + 1 == SEGMENTS_PER_PIECE {
                end
            } else {
                lower + width
            };
            segments.push(Segment::evaluate(&mut integrand, *piece, lower, upper)?);
        }
    }

    loop {
        let (estimate, error) = segments
            .iter()
            .fold((0.0, 0.0), |(sum, err), segment| {
                (sum + segment.estimate, err + segment.error)
            });
        if !estimate.is_finite() || !error.is_finite() {
            return Err(QuadratureError::NonFinite);
        }
        let tolerance = settings
            .absolute_tolerance
            .max(settings.relative_tolerance * estimate.abs());
        if error <= tolerance {
            return Ok(estimate);
        }
        if segments.len() >= limit {
            return Err(QuadratureError::SubdivisionLimit {
                limit,
                error_estimate: error,
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.error.total_cmp(&b.error))
            .map(|(index, _)| index)
            .unwrap_or(0);
        let segment = segments.swap_remove(worst);
        let middle = 0.5 * (segment.lower + segment.upper);
        if middle <= segment.lower || middle >= segment.upper {
            return Err(QuadratureError::Roundoff {
                lower: segment.lower,
                upper: segment.upper,
            });
        }
        segments.push(Segment::evaluate(&mut integrand, segment.piece, segment.lower, middle)?);
        segments.push(Segment::evaluate(&mut integrand, segment.piece, middle, segment.upper)?);
    }
}

/// Part of the real line between neighbouring breakpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Piece {
    /// `(-∞, end]`
    Below { end: f64 },
    /// `[lower, upper]`
    Between { lower: f64, upper: f64 },
    /// `[start, ∞)`
    Above { start: f64 },
}

impl Piece {
    fn split(breakpoints: &[f64]) -> Vec<Piece> {
        let mut points: Vec<f64> = breakpoints.iter().copied().filter(|p| p.is_finite()).collect();
        points.sort_by(f64::total_cmp);
        points.dedup();
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return vec![Piece::Below { end: 0.0 }, Piece::Above { start: 0.0 }];
        };

        let mut pieces = Vec::with_capacity(points.len() + 1);
        pieces.push(Piece::Below { end: first });
        pieces.extend(
            points
                .windows(2)
                .map(|pair| Piece::Between {
                    lower: pair[0],
                    upper: pair[1],
                }),
        );
        pieces.push(Piece::Above { start: last });
        pieces
    }

    /// Interval of the integration parameter covering this piece.
    fn parameter_range(&self) -> (f64, f64) {
        match *self {
            Piece::Between { lower, upper } => (lower, upper),
            Piece::Below { .. } | Piece::Above { .. } => (0.0, 1.0),
        }
    }

    /// Point on the line and Jacobian for parameter `t`; `None` at infinity.
    fn map(&self, t: f64) -> Option<(f64, f64)> {
        match *self {
            Piece::Between { .. } => Some((t, 1.0)),
            Piece::Below { end } => tail(t).map(|(offset, jacobian)| (end - offset, jacobian)),
            Piece::Above { start } => tail(t).map(|(offset, jacobian)| (start + offset, jacobian)),
        }
    }
}

fn tail(t: f64) -> Option<(f64, f64)> {
    let rest = 1.0 - t;
    (rest > 0.0).then(|| (t / rest, 1.0 / (rest * rest)))
}

/// One subinterval with its Kronrod estimate and error bound.
#[derive(Debug, Clone, Copy)]
struct Segment {
    piece: Piece,
    lower: f64,
    upper: f64,
    estimate: f64,
    error: f64,
}

impl Segment {
    fn evaluate<F>(integrand: &mut F, piece: Piece, lower: f64, upper: f64) -> Result<Self, QuadratureError>
    where
        F: FnMut(f64) -> Result<f64, QuadratureError>,
    {
        let mut sample = |t: f64| -> Result<f64, QuadratureError> {
            let Some((x, jacobian)) = piece.map(t) else {
                return Ok(0.0);
            };
            let value = integrand(x)?;
            if value == 0.0 {
                // keeps 0 * huge jacobian from turning into NaN near infinity
                return Ok(0.0);
            }
            Ok(value * jacobian)
        };

        let center = 0.5 * (lower + upper);
        let half = 0.5 * (upper - lower);

        let center_value = sample(center)?;
        let mut kronrod = center_value * KRONROD_WEIGHTS[7];
        let mut gauss = center_value * GAUSS_WEIGHTS[3];

        for (node, (&abscissa, &weight)) in KRONROD_NODES[..7]
            .iter()
            .zip(KRONROD_WEIGHTS[..7].iter())
            .enumerate()
        {
            let offset = half * abscissa;
            let pair = sample(center - offset)? + sample(center + offset)?;
            kronrod += weight * pair;
            if node % 2 == 1 {
                gauss += GAUSS_WEIGHTS[node / 2] * pair;
            }
        }

        Ok(Self {
            piece,
            lower,
            upper,
            estimate: kronrod * half,
            error: ((kronrod - gauss) * half).abs(),
        })
    }
}
