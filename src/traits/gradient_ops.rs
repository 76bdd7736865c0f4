//! `std::ops` implementations for `Gradient<F, N>`.

use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use crate::float::Float;
use crate::gradient::Gradient;

impl<F: Float, const N: usize> Add for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Gradient {
            value: self.value + rhs.value,
            gradient: std::array::from_fn(|k| self.gradient[k] + rhs.gradient[k]),
        }
    }
}

impl<F: Float, const N: usize> Sub for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Gradient {
            value: self.value - rhs.value,
            gradient: std::array::from_fn(|k| self.gradient[k] - rhs.gradient[k]),
        }
    }
}

// product rule: the gradient of a product mixes additions in
#[allow(clippy::suspicious_arithmetic_impl)]
impl<F: Float, const N: usize> Mul for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Gradient {
            value: self.value * rhs.value,
            gradient: std::array::from_fn(|k| {
                self.value * rhs.gradient[k] + self.gradient[k] * rhs.value
            }),
        }
    }
}

// quotient rule
#[allow(clippy::suspicious_arithmetic_impl)]
impl<F: Float, const N: usize> Div for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = F::one() / rhs.value;
        Gradient {
            value: self.value * inv,
            gradient: std::array::from_fn(|k| {
                (self.gradient[k] * rhs.value - self.value * rhs.gradient[k]) * inv * inv
            }),
        }
    }
}

impl<F: Float, const N: usize> Rem for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn rem(self, rhs: Self) -> Self {
        let k = (self.value / rhs.value).round();
        Gradient {
            value: self.value - k * rhs.value,
            gradient: std::array::from_fn(|i| self.gradient[i] - k * rhs.gradient[i]),
        }
    }
}

impl<F: Float, const N: usize> Neg for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Gradient {
            value: -self.value,
            gradient: std::array::from_fn(|k| -self.gradient[k]),
        }
    }
}

impl<F: Float, const N: usize> AddAssign for Gradient<F, N> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: Float, const N: usize> SubAssign for Gradient<F, N> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<F: Float, const N: usize> MulAssign for Gradient<F, N> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<F: Float, const N: usize> DivAssign for Gradient<F, N> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<F: Float, const N: usize> RemAssign for Gradient<F, N> {
    #[inline]
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

// Mixed ops: Gradient<F, N> with plain scalars.

impl<F: Float, const N: usize> Add<F> for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: F) -> Self {
        Gradient {
            value: self.value + rhs,
            gradient: self.gradient,
        }
    }
}

impl<F: Float, const N: usize> Sub<F> for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: F) -> Self {
        Gradient {
            value: self.value - rhs,
            gradient: self.gradient,
        }
    }
}

impl<F: Float, const N: usize> Mul<F> for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: F) -> Self {
        Gradient {
            value: self.value * rhs,
            gradient: std::array::from_fn(|k| self.gradient[k] * rhs),
        }
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl<F: Float, const N: usize> Div<F> for Gradient<F, N> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: F) -> Self {
        let inv = F::one() / rhs;
        Gradient {
            value: self.value * inv,
            gradient: std::array::from_fn(|k| self.gradient[k] * inv),
        }
    }
}

macro_rules! impl_gradient_scalar_lhs_ops {
    ($f:ty) => {
        impl<const N: usize> Add<Gradient<$f, N>> for $f {
            type Output = Gradient<$f, N>;
            #[inline]
            fn add(self, rhs: Gradient<$f, N>) -> Gradient<$f, N> {
                rhs + self
            }
        }

        impl<const N: usize> Sub<Gradient<$f, N>> for $f {
            type Output = Gradient<$f, N>;
            #[inline]
            fn sub(self, rhs: Gradient<$f, N>) -> Gradient<$f, N> {
                -rhs + self
            }
        }

        impl<const N: usize> Mul<Gradient<$f, N>> for $f {
            type Output = Gradient<$f, N>;
            #[inline]
            fn mul(self, rhs: Gradient<$f, N>) -> Gradient<$f, N> {
                rhs * self
            }
        }

        #[allow(clippy::suspicious_arithmetic_impl)]
        impl<const N: usize> Div<Gradient<$f, N>> for $f {
            type Output = Gradient<$f, N>;
            #[inline]
            fn div(self, rhs: Gradient<$f, N>) -> Gradient<$f, N> {
                rhs.recip() * self
            }
        }
    };
}

impl_gradient_scalar_lhs_ops!(f32);
impl_gradient_scalar_lhs_ops!(f64);
