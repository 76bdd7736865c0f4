//! First-order specialization: a value with `N` first partial derivatives.
//!
//! [`Gradient<F, N>`] hard-codes the order-1 product, quotient and chain
//! rules instead of going through a compiler, avoiding table lookups when
//! only first derivatives are needed. It is an alternate implementation of
//! the same mathematical contract as an order-1 [`DerivativeStructure`];
//! conversions in both directions are provided. `Gradient<F, 1>` covers
//! the univariate first-derivative case.

use std::fmt::{self, Display};

use crate::error::DsError;
use crate::factory::DsFactory;
use crate::float::Float;
use crate::structure::DerivativeStructure;

/// A value with its gradient with respect to `N` free parameters.
#[derive(Clone, Copy, Debug)]
pub struct Gradient<F: Float, const N: usize> {
    /// Function value.
    pub value: F,
    /// First partial derivatives, one per free parameter.
    pub gradient: [F; N],
}

impl<F: Float, const N: usize> Default for Gradient<F, N> {
    fn default() -> Self {
        Gradient {
            value: F::zero(),
            gradient: [F::zero(); N],
        }
    }
}

impl<F: Float, const N: usize> Display for Gradient<F, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        for (i, g) in self.gradient.iter().enumerate() {
            write!(f, " + {}·dx{}", g, i)?;
        }
        Ok(())
    }
}

impl<F: Float, const N: usize> From<F> for Gradient<F, N> {
    #[inline]
    fn from(value: F) -> Self {
        Gradient::constant(value)
    }
}

impl<F: Float, const N: usize> Gradient<F, N> {
    /// Create a gradient from raw parts.
    #[inline]
    pub fn new(value: F, gradient: [F; N]) -> Self {
        Gradient { value, gradient }
    }

    /// Create a constant (zero gradient).
    #[inline]
    pub fn constant(value: F) -> Self {
        Gradient {
            value,
            gradient: [F::zero(); N],
        }
    }

    /// Create a free variable: unit derivative with respect to parameter
    /// `index`, zero elsewhere.
    #[inline]
    pub fn variable(index: usize, value: F) -> Self {
        Gradient {
            value,
            gradient: std::array::from_fn(|k| if k == index { F::one() } else { F::zero() }),
        }
    }

    /// Function value.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    /// First partial derivative with respect to parameter `k`.
    #[inline]
    pub fn partial(&self, k: usize) -> F {
        self.gradient[k]
    }

    /// A partial derivative selected by per-parameter derivation orders,
    /// in the same format an order-1 [`DerivativeStructure`] accepts.
    ///
    /// Fails with `IndexOutOfRange` when a total derivation order above
    /// one is requested, which this first-order-only type cannot
    /// represent.
    pub fn partial_derivative(&self, orders: &[usize]) -> Result<F, DsError> {
        if orders.len() != N {
            return Err(DsError::DimensionMismatch {
                expected: N,
                actual: orders.len(),
            });
        }
        let sum: usize = orders.iter().sum();
        match sum {
            0 => Ok(self.value),
            1 => {
                let k = orders
                    .iter()
                    .position(|&o| o == 1)
                    .expect("an order vector summing to one has a unit entry");
                Ok(self.gradient[k])
            }
            _ => Err(DsError::IndexOutOfRange { index: sum, limit: 2 }),
        }
    }

    /// Evaluate the first-order Taylor expansion at some offset.
    pub fn taylor(&self, delta: &[F]) -> Result<F, DsError> {
        if delta.len() != N {
            return Err(DsError::DimensionMismatch {
                expected: N,
                actual: delta.len(),
            });
        }
        let mut value = self.value;
        for (g, d) in self.gradient.iter().zip(delta) {
            value = value + *g * *d;
        }
        Ok(value)
    }

    /// Widen to an order-1 [`DerivativeStructure`] over the same
    /// parameters.
    pub fn to_derivative_structure(&self) -> Result<DerivativeStructure<F>, DsError> {
        let factory = DsFactory::new(N, 1);
        let mut data = vec![F::zero(); factory.size()];
        data[0] = self.value;
        data[1..].copy_from_slice(&self.gradient);
        factory.build(&data)
    }

    /// Narrow an order-1 [`DerivativeStructure`] to a gradient.
    ///
    /// Fails with `DimensionMismatch` unless the structure has exactly
    /// `N` parameters and order 1.
    pub fn from_derivative_structure(ds: &DerivativeStructure<F>) -> Result<Self, DsError> {
        if ds.free_parameters() != N {
            return Err(DsError::DimensionMismatch {
                expected: N,
                actual: ds.free_parameters(),
            });
        }
        if ds.order() != 1 {
            return Err(DsError::DimensionMismatch {
                expected: 1,
                actual: ds.order(),
            });
        }
        let data = ds.all_derivatives();
        Ok(Gradient {
            value: data[0],
            gradient: std::array::from_fn(|k| data[1 + k]),
        })
    }

    /// Apply the chain rule: given `f(self.value)` and `f'(self.value)`,
    /// produce the gradient result.
    #[inline]
    fn chain(self, f_value: F, f_derivative: F) -> Self {
        Gradient {
            value: f_value,
            gradient: std::array::from_fn(|k| self.gradient[k] * f_derivative),
        }
    }

    // ── Powers ──

    #[inline]
    pub fn recip(self) -> Self {
        let inv = F::one() / self.value;
        self.chain(inv, -inv * inv)
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        let s = self.value.sqrt();
        let two = F::one() + F::one();
        self.chain(s, F::one() / (two * s))
    }

    #[inline]
    pub fn cbrt(self) -> Self {
        let c = self.value.cbrt();
        let three = F::from(3).unwrap();
        self.chain(c, F::one() / (three * c * c))
    }

    #[inline]
    pub fn powi(self, n: i32) -> Self {
        let value = self.value.powi(n);
        let derivative = F::from(n).unwrap() * self.value.powi(n - 1);
        self.chain(value, derivative)
    }

    #[inline]
    pub fn pow(self, p: F) -> Self {
        let value = self.value.powf(p);
        let derivative = p * self.value.powf(p - F::one());
        self.chain(value, derivative)
    }

    #[inline]
    pub fn powf(self, e: Self) -> Self {
        // d(x^y) = x^y * (y·dx/x + ln(x)·dy)
        let value = self.value.powf(e.value);
        Gradient {
            value,
            gradient: std::array::from_fn(|k| {
                value * (e.value * self.gradient[k] / self.value + e.gradient[k] * self.value.ln())
            }),
        }
    }

    #[inline]
    pub fn hypot(self, other: Self) -> Self {
        let h = self.value.hypot(other.value);
        Gradient {
            value: h,
            gradient: std::array::from_fn(|k| {
                (self.value * self.gradient[k] + other.value * other.gradient[k]) / h
            }),
        }
    }

    // ── Exp / Log ──

    #[inline]
    pub fn exp(self) -> Self {
        let e = self.value.exp();
        self.chain(e, e)
    }

    #[inline]
    pub fn exp_m1(self) -> Self {
        self.chain(self.value.exp_m1(), self.value.exp())
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.chain(self.value.ln(), F::one() / self.value)
    }

    #[inline]
    pub fn ln_1p(self) -> Self {
        self.chain(self.value.ln_1p(), F::one() / (F::one() + self.value))
    }

    #[inline]
    pub fn log10(self) -> Self {
        let ln10 = F::from(10).unwrap().ln();
        self.chain(self.value.log10(), F::one() / (self.value * ln10))
    }

    // ── Trigonometric ──

    #[inline]
    pub fn sin(self) -> Self {
        let (s, c) = self.value.sin_cos();
        self.chain(s, c)
    }

    #[inline]
    pub fn cos(self) -> Self {
        let (s, c) = self.value.sin_cos();
        self.chain(c, -s)
    }

    #[inline]
    pub fn sin_cos(self) -> (Self, Self) {
        let (s, c) = self.value.sin_cos();
        (self.chain(s, c), self.chain(c, -s))
    }

    #[inline]
    pub fn tan(self) -> Self {
        let t = self.value.tan();
        self.chain(t, F::one() + t * t)
    }

    #[inline]
    pub fn asin(self) -> Self {
        let d = (F::one() - self.value * self.value).sqrt();
        self.chain(self.value.asin(), F::one() / d)
    }

    #[inline]
    pub fn acos(self) -> Self {
        let d = (F::one() - self.value * self.value).sqrt();
        self.chain(self.value.acos(), -F::one() / d)
    }

    #[inline]
    pub fn atan(self) -> Self {
        self.chain(self.value.atan(), F::one() / (F::one() + self.value * self.value))
    }

    #[inline]
    pub fn atan2(self, x: Self) -> Self {
        // d(atan2(y, x)) = (x·dy - y·dx) / (x² + y²)
        let r2 = self.value * self.value + x.value * x.value;
        Gradient {
            value: self.value.atan2(x.value),
            gradient: std::array::from_fn(|k| {
                (x.value * self.gradient[k] - self.value * x.gradient[k]) / r2
            }),
        }
    }

    // ── Hyperbolic ──

    #[inline]
    pub fn sinh(self) -> Self {
        self.chain(self.value.sinh(), self.value.cosh())
    }

    #[inline]
    pub fn cosh(self) -> Self {
        self.chain(self.value.cosh(), self.value.sinh())
    }

    #[inline]
    pub fn sinh_cosh(self) -> (Self, Self) {
        let sh = self.value.sinh();
        let ch = self.value.cosh();
        (self.chain(sh, ch), self.chain(ch, sh))
    }

    #[inline]
    pub fn tanh(self) -> Self {
        let t = self.value.tanh();
        self.chain(t, F::one() - t * t)
    }

    #[inline]
    pub fn asinh(self) -> Self {
        let d = (self.value * self.value + F::one()).sqrt();
        self.chain(self.value.asinh(), F::one() / d)
    }

    #[inline]
    pub fn acosh(self) -> Self {
        let d = (self.value * self.value - F::one()).sqrt();
        self.chain(self.value.acosh(), F::one() / d)
    }

    #[inline]
    pub fn atanh(self) -> Self {
        self.chain(
            self.value.atanh(),
            F::one() / (F::one() - self.value * self.value),
        )
    }

    // ── Value-only operations ──

    #[inline]
    pub fn abs(self) -> Self {
        let sign = self.value.signum();
        Gradient {
            value: self.value * sign,
            gradient: std::array::from_fn(|k| self.gradient[k] * sign),
        }
    }

    #[inline]
    pub fn signum(self) -> Self {
        Gradient::constant(self.value.signum())
    }

    #[inline]
    pub fn floor(self) -> Self {
        Gradient::constant(self.value.floor())
    }

    #[inline]
    pub fn ceil(self) -> Self {
        Gradient::constant(self.value.ceil())
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        if self.value >= other.value {
            self
        } else {
            other
        }
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        if self.value <= other.value {
            self
        } else {
            other
        }
    }
}
