//! Chebyshev polynomial functionality for ephemeris interpolation
//!
//! This module provides the implementation of Chebyshev polynomials used for
//! interpolating positions of celestial bodies from ephemeris data.
//!
//! Chebyshev polynomials are used in JPL ephemerides as they offer excellent
//! approximation properties for smooth trajectories with minimal error.

/// Chebyshev polynomial representation and evaluation
///
/// Borrows its coefficients straight out of a segment record, so building
/// one per evaluation costs nothing.
#[derive(Debug, Clone, Copy)]
pub struct ChebyshevPolynomial<'a> {
    /// Coefficients of the Chebyshev polynomial
    coefficients: &'a [f64],
}

impl<'a> ChebyshevPolynomial<'a> {
    /// Create a new Chebyshev polynomial with the given coefficients
    ///
    /// The coefficients are ordered from lowest to highest degree:
    /// [c₀, c₁, c₂, ..., cₙ] where the polynomial is:
    /// f(x) = c₀·T₀(x) + c₁·T₁(x) + c₂·T₂(x) + ... + cₙ·Tₙ(x)
    pub fn new(coefficients: &'a [f64]) -> Self {
        Self { coefficients }
    }

    /// Evaluate the Chebyshev polynomial at the given point x in [-1, 1]
    ///
    /// Uses the Clenshaw recurrence. Returns NaN if x is outside [-1, 1].
    pub fn evaluate(&self, x: f64) -> f64 {
        let Some((&c0, rest)) = self.coefficients.split_first() else {
            return 0.0;
        };

        if !(-1.0..=1.0).contains(&x) {
            return f64::NAN;
        }

        let mut b1 = 0.0;
        let mut b2 = 0.0;
        for &c in rest.iter().rev() {
            let b0 = c + 2.0 * x * b1 - b2;
            b2 = b1;
            b1 = b0;
        }

        c0 + x * b1 - b2
    }

    /// Get the degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }
}
