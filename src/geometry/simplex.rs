//! Geometry kernel for triangles (D = 2) and tetrahedra (D = 3).
//!
//! Simplices are passed as vertex slices of length `D + 1`. Small dense
//! systems are solved with Gaussian elimination and partial pivoting.

use crate::strata_error::StrataError;

/// Default tolerance for point-in-element acceptance.
pub const GLOBAL_EPSILON: f64 = 1e-6;

const EPS: f64 = 1e-12;

pub fn sub<const D: usize>(a: &[f64; D], b: &[f64; D]) -> [f64; D] {
    std::array::from_fn(|d| a[d] - b[d])
}

pub fn dot<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    let d = sub(a, b);
    dot(&d, &d).sqrt()
}

fn check_simplex<const D: usize>(vertices: &[[f64; D]]) -> Result<(), StrataError> {
    if vertices.len() != D + 1 {
        return Err(StrataError::DimensionMismatch {
            expected: D + 1,
            found: vertices.len(),
        });
    }
    Ok(())
}

/// Signed area (D = 2) or volume (D = 3); positive for counter-clockwise
/// triangles and right-handed tetrahedra.
pub fn signed_measure<const D: usize>(vertices: &[[f64; D]]) -> Result<f64, StrataError> {
    check_simplex(vertices)?;
    let mut rows = Vec::with_capacity(D * D);
    for v in &vertices[1..] {
        rows.extend_from_slice(&sub(v, &vertices[0]));
    }
    let factorial: f64 = (1..=D).map(|k| k as f64).product();
    Ok(determinant(rows, D) / factorial)
}

/// Barycentric weights of `point` with respect to `vertices`.
///
/// Fails with [`StrataError::InvalidGeometry`] on a degenerate simplex.
pub fn barycentric_coordinates<const D: usize>(
    point: &[f64; D],
    vertices: &[[f64; D]],
) -> Result<Vec<f64>, StrataError> {
    check_simplex(vertices)?;
    let origin = &vertices[0];
    // Column c holds edge c: a[r * D + c] = (v_{c+1} - v_0)[r].
    let mut a = vec![0.0; D * D];
    for (c, v) in vertices[1..].iter().enumerate() {
        let edge = sub(v, origin);
        for r in 0..D {
            a[r * D + c] = edge[r];
        }
    }
    let rhs = sub(point, origin).to_vec();
    let tail = solve_dense(a, rhs, D)
        .ok_or_else(|| StrataError::InvalidGeometry("degenerate simplex".into()))?;
    let mut weights = Vec::with_capacity(D + 1);
    weights.push(1.0 - tail.iter().sum::<f64>());
    weights.extend(tail);
    Ok(weights)
}

/// Distance from `point` to the simplex, and the closest point on it.
///
/// Accepts any number of vertices (vertex, segment, triangle, tetrahedron).
pub fn point_simplex_distance<const D: usize>(
    point: &[f64; D],
    vertices: &[[f64; D]],
) -> (f64, [f64; D]) {
    let closest = closest_point_on_simplex(point, vertices);
    (distance(point, &closest), closest)
}

fn closest_point_on_simplex<const D: usize>(point: &[f64; D], vertices: &[[f64; D]]) -> [f64; D] {
    let Some((origin, rest)) = vertices.split_first() else {
        return *point;
    };
    let k = rest.len();
    if k == 0 {
        return *origin;
    }
    let edges: Vec<[f64; D]> = rest.iter().map(|v| sub(v, origin)).collect();
    let offset = sub(point, origin);
    let mut gram = vec![0.0; k * k];
    for i in 0..k {
        for j in 0..k {
            gram[i * k + j] = dot(&edges[i], &edges[j]);
        }
    }
    let rhs: Vec<f64> = edges.iter().map(|e| dot(e, &offset)).collect();
    if let Some(t) = solve_dense(gram, rhs, k) {
        if t.iter().all(|&x| x >= 0.0) && t.iter().sum::<f64>() <= 1.0 {
            let mut projected = *origin;
            for (ti, e) in t.iter().zip(&edges) {
                for d in 0..D {
                    projected[d] += ti * e[d];
                }
            }
            return projected;
        }
    }
    // Projection falls outside: the closest point lies on a facet.
    (0..vertices.len())
        .map(|skip| {
            let facet: Vec<[f64; D]> = vertices
                .iter()
                .enumerate()
                .filter_map(|(i, v)| (i != skip).then_some(*v))
                .collect();
            closest_point_on_simplex(point, &facet)
        })
        .min_by(|a, b| distance(point, a).total_cmp(&distance(point, b)))
        .unwrap_or(*origin)
}

/// Solves the row-major `n x n` system `a x = b`; `None` when singular.
fn solve_dense(mut a: Vec<f64>, mut b: Vec<f64>, n: usize) -> Option<Vec<f64>> {
    let scale = a.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    if scale == 0.0 {
        return None;
    }
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))?;
        if a[pivot * n + col].abs() <= EPS * scale {
            return None;
        }
        if pivot != col {
            for c in 0..n {
                a.swap(pivot * n + c, col * n + c);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let factor = a[row * n + col] / a[col * n + col];
            for c in col..n {
                a[row * n + c] -= factor * a[col * n + c];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| a[row * n + c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row * n + row];
    }
    Some(x)
}

fn determinant(mut a: Vec<f64>, n: usize) -> f64 {
    let mut det = 1.0;
    for col in 0..n {
        let Some(pivot) =
            (col..n).max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))
        else {
            return 0.0;
        };
        if a[pivot * n + col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            for c in 0..n {
                a.swap(pivot * n + c, col * n + c);
            }
            det = -det;
        }
        det *= a[col * n + col];
        for row in col + 1..n {
            let factor = a[row * n + col] / a[col * n + col];
            for c in col..n {
                a[row * n + c] -= factor * a[col * n + c];
            }
        }
    }
    det
}
