//! The public derivative-structure value type.
//!
//! A [`DerivativeStructure`] pairs a shared compiler with an exclusively
//! owned flat coefficient array: index 0 holds the function value, the
//! remaining entries hold all partial derivatives up to the compiler's
//! order, in compiler-defined order. Every operation allocates a fresh
//! result array and delegates to the compiler runtime; instances never
//! mutate after construction, so they can be shared freely across threads.

use crate::error::DsError;
use crate::factory::DsFactory;
use crate::float::Float;

/// A value together with all its partial derivatives up to a fixed order,
/// with respect to a fixed number of free parameters.
#[derive(Clone, Debug)]
pub struct DerivativeStructure<F: Float> {
    factory: DsFactory<F>,
    data: Box<[F]>,
}

impl<F: Float> DerivativeStructure<F> {
    pub(crate) fn from_parts(factory: DsFactory<F>, data: Vec<F>) -> Self {
        DerivativeStructure {
            factory,
            data: data.into_boxed_slice(),
        }
    }

    fn alloc(&self) -> Vec<F> {
        vec![F::zero(); self.factory.size()]
    }

    fn same_shape(&self, rhs: &Self) -> Result<(), DsError> {
        self.factory.check_compatibility(&rhs.factory)
    }

    /// The factory this structure was built by.
    pub fn factory(&self) -> &DsFactory<F> {
        &self.factory
    }

    /// Number of free parameters.
    pub fn free_parameters(&self) -> usize {
        self.factory.free_parameters()
    }

    /// Derivation order.
    pub fn order(&self) -> usize {
        self.factory.order()
    }

    /// The function value (coefficient 0).
    pub fn value(&self) -> F {
        self.data[0]
    }

    /// All coefficients: value first, partial derivatives in compiler
    /// order.
    pub fn all_derivatives(&self) -> &[F] {
        &self.data
    }

    /// A specific partial derivative, selected by per-parameter derivation
    /// orders.
    pub fn partial_derivative(&self, orders: &[usize]) -> Result<F, DsError> {
        Ok(self.data[self.factory.compiler().partial_derivative_index(orders)?])
    }

    pub(crate) fn data_mut(&mut self) -> &mut [F] {
        &mut self.data
    }

    // ── Arithmetic ──

    /// `self + rhs`.
    pub fn add(&self, rhs: &Self) -> Result<Self, DsError> {
        self.same_shape(rhs)?;
        let mut result = self.alloc();
        self.factory.compiler().add(&self.data, &rhs.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// `self - rhs`.
    pub fn subtract(&self, rhs: &Self) -> Result<Self, DsError> {
        self.same_shape(rhs)?;
        let mut result = self.alloc();
        self.factory
            .compiler()
            .subtract(&self.data, &rhs.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// `self * rhs`.
    pub fn multiply(&self, rhs: &Self) -> Result<Self, DsError> {
        self.same_shape(rhs)?;
        let mut result = self.alloc();
        self.factory
            .compiler()
            .multiply(&self.data, &rhs.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// `self / rhs`.
    pub fn divide(&self, rhs: &Self) -> Result<Self, DsError> {
        self.same_shape(rhs)?;
        let mut result = self.alloc();
        self.factory
            .compiler()
            .divide(&self.data, &rhs.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// IEEE-style remainder: `self - k·rhs` with `k` the rounded quotient
    /// of the values.
    pub fn remainder(&self, rhs: &Self) -> Result<Self, DsError> {
        self.same_shape(rhs)?;
        let mut result = self.alloc();
        self.factory
            .compiler()
            .remainder(&self.data, &rhs.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// `-self`.
    pub fn negate(&self) -> Self {
        let result = self.data.iter().map(|&c| -c).collect();
        Self::from_parts(self.factory.clone(), result)
    }

    /// `self + a` for a plain scalar (value slot only).
    pub fn add_scalar(&self, a: F) -> Self {
        let mut result = self.data.to_vec();
        result[0] = result[0] + a;
        Self::from_parts(self.factory.clone(), result)
    }

    /// `self * a` for a plain scalar (all coefficients).
    pub fn multiply_scalar(&self, a: F) -> Self {
        let result = self.data.iter().map(|&c| c * a).collect();
        Self::from_parts(self.factory.clone(), result)
    }

    /// `1 / self`.
    pub fn reciprocal(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().reciprocal(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    // ── Powers and roots ──

    /// `sqrt(self)`.
    pub fn sqrt(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().sqrt(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `cbrt(self)`.
    pub fn cbrt(&self) -> Self {
        self.root_n(3)
    }

    /// `self^(1/n)`.
    pub fn root_n(&self, n: i32) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().root_n(&self.data, n, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `self^p` for a real exponent.
    pub fn pow(&self, p: F) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().pow(&self.data, p, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `self^n` for an integer exponent.
    pub fn powi(&self, n: i32) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().powi(&self.data, n, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `self^e` for a derivative-structure exponent.
    pub fn pow_ds(&self, e: &Self) -> Result<Self, DsError> {
        self.same_shape(e)?;
        let mut result = self.alloc();
        self.factory
            .compiler()
            .pow_ds(&self.data, &e.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// `a^x` for a plain scalar base and a derivative-structure exponent.
    pub fn scalar_pow(a: F, x: &Self) -> Self {
        let mut result = x.alloc();
        x.factory.compiler().pow_scalar(a, &x.data, &mut result);
        Self::from_parts(x.factory.clone(), result)
    }

    /// `hypot(self, y) = sqrt(self² + y²)`.
    pub fn hypot(&self, y: &Self) -> Result<Self, DsError> {
        self.same_shape(y)?;
        let compiler = self.factory.compiler();
        let mut x2 = self.alloc();
        compiler.multiply(&self.data, &self.data, &mut x2);
        let mut y2 = self.alloc();
        compiler.multiply(&y.data, &y.data, &mut y2);
        for (a, b) in x2.iter_mut().zip(&y2) {
            *a = *a + *b;
        }
        let mut result = self.alloc();
        compiler.sqrt(&x2, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    // ── Exponentials and logarithms ──

    /// `exp(self)`.
    pub fn exp(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().exp(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `exp(self) - 1`.
    pub fn exp_m1(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().exp_m1(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `ln(self)`.
    pub fn ln(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().ln(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `ln(1 + self)`.
    pub fn ln_1p(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().ln_1p(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `log10(self)`.
    pub fn log10(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().log10(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    // ── Trigonometric ──

    /// `sin(self)`.
    pub fn sin(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().sin(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `cos(self)`.
    pub fn cos(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().cos(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// Combined `(sin, cos)`, sharing one scalar evaluation.
    pub fn sin_cos(&self) -> (Self, Self) {
        let mut sin = self.alloc();
        let mut cos = self.alloc();
        self.factory.compiler().sin_cos(&self.data, &mut sin, &mut cos);
        (
            Self::from_parts(self.factory.clone(), sin),
            Self::from_parts(self.factory.clone(), cos),
        )
    }

    /// `tan(self)`.
    pub fn tan(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().tan(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `asin(self)`.
    pub fn asin(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().asin(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `acos(self)`.
    pub fn acos(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().acos(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `atan(self)`.
    pub fn atan(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().atan(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `atan2(self, x)`, treating `self` as the ordinate.
    pub fn atan2(&self, x: &Self) -> Result<Self, DsError> {
        self.same_shape(x)?;
        let mut result = self.alloc();
        self.factory
            .compiler()
            .atan2(&self.data, &x.data, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    // ── Hyperbolic ──

    /// `sinh(self)`.
    pub fn sinh(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().sinh(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `cosh(self)`.
    pub fn cosh(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().cosh(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// Combined `(sinh, cosh)`.
    pub fn sinh_cosh(&self) -> (Self, Self) {
        let mut sinh = self.alloc();
        let mut cosh = self.alloc();
        self.factory
            .compiler()
            .sinh_cosh(&self.data, &mut sinh, &mut cosh);
        (
            Self::from_parts(self.factory.clone(), sinh),
            Self::from_parts(self.factory.clone(), cosh),
        )
    }

    /// `tanh(self)`.
    pub fn tanh(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().tanh(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `asinh(self)`.
    pub fn asinh(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().asinh(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `acosh(self)`.
    pub fn acosh(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().acosh(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    /// `atanh(self)`.
    pub fn atanh(&self) -> Self {
        let mut result = self.alloc();
        self.factory.compiler().atanh(&self.data, &mut result);
        Self::from_parts(self.factory.clone(), result)
    }

    // ── Value-only operations ──
    // Piecewise-constant or sign-dependent functions: the value slot gets
    // the exact scalar result, derivatives follow the active branch.

    /// Absolute value: `self` or `-self` depending on the value's sign.
    pub fn abs(&self) -> Self {
        if self.data[0] < F::zero() {
            self.negate()
        } else {
            self.clone()
        }
    }

    /// Sign of the value, as a constant structure.
    pub fn signum(&self) -> Self {
        self.factory.constant(self.data[0].signum())
    }

    /// Floor of the value, as a constant structure.
    pub fn floor(&self) -> Self {
        self.factory.constant(self.data[0].floor())
    }

    /// Ceiling of the value, as a constant structure.
    pub fn ceil(&self) -> Self {
        self.factory.constant(self.data[0].ceil())
    }

    /// The operand with the smaller value.
    pub fn min(&self, other: &Self) -> Self {
        if self.data[0] <= other.data[0] {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// The operand with the larger value.
    pub fn max(&self, other: &Self) -> Self {
        if self.data[0] >= other.data[0] {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// Convert radians to degrees.
    pub fn to_degrees(&self) -> Self {
        self.multiply_scalar(F::from(180).unwrap() / F::PI())
    }

    /// Convert degrees to radians.
    pub fn to_radians(&self) -> Self {
        self.multiply_scalar(F::PI() / F::from(180).unwrap())
    }

    // ── Composition, Taylor evaluation, rebasing ──

    /// Compose with a univariate function given by its value and
    /// derivatives `f[0..=order]` at this structure's value.
    ///
    /// Fails with `DimensionMismatch` unless `f.len() == order + 1`.
    pub fn compose(&self, f: &[F]) -> Result<Self, DsError> {
        if f.len() != self.order() + 1 {
            return Err(DsError::DimensionMismatch {
                expected: self.order() + 1,
                actual: f.len(),
            });
        }
        let mut result = self.alloc();
        self.factory.compiler().compose(&self.data, f, &mut result);
        Ok(Self::from_parts(self.factory.clone(), result))
    }

    /// Evaluate the Taylor expansion at some parameter offset.
    pub fn taylor(&self, delta: &[F]) -> Result<F, DsError> {
        self.factory.compiler().taylor(&self.data, delta)
    }

    /// Re-express this structure's derivatives with respect to the free
    /// parameters of `base`, where `base[i]` gives the i-th of this
    /// structure's parameters as a function of the new parameters
    /// (multivariate chain rule).
    ///
    /// All base structures must share one compiler of the same order as
    /// this structure, and there must be one base structure per free
    /// parameter of this structure.
    pub fn rebase(&self, base: &[Self]) -> Result<Self, DsError> {
        if base.len() != self.free_parameters() {
            return Err(DsError::DimensionMismatch {
                expected: self.free_parameters(),
                actual: base.len(),
            });
        }
        let base_factory = base[0].factory();
        for b in &base[1..] {
            base_factory.check_compatibility(b.factory())?;
        }
        if base_factory.order() != self.order() {
            return Err(DsError::DimensionMismatch {
                expected: self.order(),
                actual: base_factory.order(),
            });
        }

        let base_size = base_factory.size();
        let mut p = Vec::with_capacity(base.len() * base_size);
        for b in base {
            p.extend_from_slice(&b.data);
        }

        let mut result = vec![F::zero(); base_size];
        self.factory
            .compiler()
            .rebase(&self.data, base_factory.compiler(), &p, &mut result);
        Ok(Self::from_parts(base_factory.clone(), result))
    }
}
