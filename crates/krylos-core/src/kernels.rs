//! Slice-based BLAS-1 kernels.
//!
//! These are the only primitives the iterative solvers use to touch vectors.
//! Long vectors fan out across cores with rayon; short ones stay serial so
//! small systems do not pay thread-pool overhead. Parallel reductions may
//! reassociate the sum, so results can differ from the serial path in the
//! last few bits.

use rayon::prelude::*;

/// Vectors at or above this length use the rayon-parallel kernel paths.
pub const PAR_THRESHOLD: usize = 16_384;

/// Dot product `<x, y>`.
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    if x.len() >= PAR_THRESHOLD {
        x.par_iter().zip(y.par_iter()).map(|(&a, &b)| a * b).sum()
    } else {
        x.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum()
    }
}

/// Euclidean norm `||x||_2`.
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// Scaled add: `y += alpha * x`.
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    if x.len() >= PAR_THRESHOLD {
        y.par_iter_mut()
            .zip(x.par_iter())
            .for_each(|(yi, &xi)| *yi += alpha * xi);
    } else {
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            *yi += alpha * xi;
        }
    }
}

/// General scaled combination: `y = alpha * x + beta * y`.
pub fn axpby(alpha: f64, x: &[f64], beta: f64, y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    if x.len() >= PAR_THRESHOLD {
        y.par_iter_mut()
            .zip(x.par_iter())
            .for_each(|(yi, &xi)| *yi = alpha * xi + beta * *yi);
    } else {
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            *yi = alpha * xi + beta * *yi;
        }
    }
}

/// In-place scale: `x *= alpha`.
pub fn scale(alpha: f64, x: &mut [f64]) {
    if x.len() >= PAR_THRESHOLD {
        x.par_iter_mut().for_each(|xi| *xi *= alpha);
    } else {
        for xi in x.iter_mut() {
            *xi *= alpha;
        }
    }
}

/// Copy `src` into `dst`.
pub fn copy(src: &[f64], dst: &mut [f64]) {
    dst.copy_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_basic() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, 5.0, 6.0];
        assert!((dot(&x, &y) - 32.0).abs() < 1e-15);
    }

    #[test]
    fn norm2_pythagorean() {
        let v = vec![3.0, 4.0];
        assert!((norm2(&v) - 5.0).abs() < 1e-15);
    }

    #[test]
    fn axpy_accumulates() {
        let x = vec![1.0, 1.0, 1.0];
        let mut y = vec![1.0, 2.0, 3.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn axpby_combination() {
        let x = vec![1.0, 2.0];
        let mut y = vec![10.0, 20.0];
        // y = 1*x + (-1)*y
        axpby(1.0, &x, -1.0, &mut y);
        assert_eq!(y, vec![-9.0, -18.0]);
    }

    #[test]
    fn scale_in_place() {
        let mut x = vec![2.0, -4.0];
        scale(0.5, &mut x);
        assert_eq!(x, vec![1.0, -2.0]);
    }

    #[test]
    fn parallel_path_agrees_with_serial() {
        let n = PAR_THRESHOLD + 17;
        let x: Vec<f64> = (0..n).map(|i| (i % 7) as f64 - 3.0).collect();
        let y: Vec<f64> = (0..n).map(|i| (i % 5) as f64 - 2.0).collect();

        let serial: f64 = x.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum();
        let parallel = dot(&x, &y);
        assert!((serial - parallel).abs() < 1e-9 * serial.abs().max(1.0));
    }
}
