//! Derivative-free gradient estimates on a central simplex stencil.
//!
//! The stencil at `x` with scale `h` consists of the `2n` points `x ± h·eᵢ`.
//! Only objective values are used, so these helpers work for noisy
//! objectives whose gradient is unavailable or meaningless.

use crate::core::{
    error::{OptimizerError, Result},
    objective::Objective,
    types::{DVector, Scalar},
};

fn check_scale<T: Scalar>(h: T) -> Result<()> {
    if h > T::zero() {
        Ok(())
    } else {
        Err(OptimizerError::invalid_configuration(
            "stencil scale must be positive",
            "h",
            h.to_string(),
        ))
    }
}

fn stencil_pair<T, F>(f: &F, x: &DVector<T>, h: T, i: usize) -> Result<(T, T)>
where
    T: Scalar,
    F: Objective<T> + ?Sized,
{
    let mut forward = x.clone();
    let mut backward = x.clone();
    forward[i] = forward[i] + h;
    backward[i] = backward[i] - h;
    Ok((f.objective(&forward)?, f.objective(&backward)?))
}

/// Central simplex gradient `(f(x + h·eᵢ) − f(x − h·eᵢ)) / 2h`.
///
/// Uses `2n` objective evaluations.
pub fn simplex_gradient<T, F>(f: &F, x: &DVector<T>, h: T) -> Result<DVector<T>>
where
    T: Scalar,
    F: Objective<T> + ?Sized,
{
    check_scale(h)?;
    let mut gradient = DVector::zeros(x.len());
    for i in 0..x.len() {
        let (forward, backward) = stencil_pair(f, x, h, i)?;
        gradient[i] = (forward - backward) / (h + h);
    }
    Ok(gradient)
}

/// Returns true iff `x` is a minimum on its stencil, i.e.
/// `f(x) ≤ min(f(x + h·eᵢ), f(x − h·eᵢ))` for every direction `i`.
///
/// `f(x)` is evaluated once, and the answer does not depend on the order
/// in which directions are visited.
pub fn stencil_failure<T, F>(f: &F, x: &DVector<T>, h: T) -> Result<bool>
where
    T: Scalar,
    F: Objective<T> + ?Sized,
{
    check_scale(h)?;
    let center = f.objective(x)?;
    for i in 0..x.len() {
        let (forward, backward) = stencil_pair(f, x, h, i)?;
        if center > forward || center > backward {
            return Ok(false);
        }
    }
    Ok(true)
}
