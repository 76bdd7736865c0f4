//! `std::ops` implementations for `DerivativeStructure<F>`.
//!
//! The named methods on [`DerivativeStructure`] return `Result` so shape
//! mismatches surface as errors; the operators below are sugar over them
//! and panic when the operands' parameter count or order differ. Scalar
//! operands never fail.

use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use crate::float::Float;
use crate::structure::DerivativeStructure;

const SHAPE_MISMATCH: &str = "derivative structures must share parameter count and order";

impl<F: Float> Add for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn add(self, rhs: Self) -> DerivativeStructure<F> {
        DerivativeStructure::add(self, rhs).expect(SHAPE_MISMATCH)
    }
}

impl<F: Float> Add for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn add(self, rhs: Self) -> DerivativeStructure<F> {
        &self + &rhs
    }
}

impl<F: Float> Sub for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn sub(self, rhs: Self) -> DerivativeStructure<F> {
        self.subtract(rhs).expect(SHAPE_MISMATCH)
    }
}

impl<F: Float> Sub for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn sub(self, rhs: Self) -> DerivativeStructure<F> {
        &self - &rhs
    }
}

impl<F: Float> Mul for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn mul(self, rhs: Self) -> DerivativeStructure<F> {
        self.multiply(rhs).expect(SHAPE_MISMATCH)
    }
}

impl<F: Float> Mul for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn mul(self, rhs: Self) -> DerivativeStructure<F> {
        &self * &rhs
    }
}

impl<F: Float> Div for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn div(self, rhs: Self) -> DerivativeStructure<F> {
        self.divide(rhs).expect(SHAPE_MISMATCH)
    }
}

impl<F: Float> Div for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn div(self, rhs: Self) -> DerivativeStructure<F> {
        &self / &rhs
    }
}

impl<F: Float> Rem for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn rem(self, rhs: Self) -> DerivativeStructure<F> {
        self.remainder(rhs).expect(SHAPE_MISMATCH)
    }
}

impl<F: Float> Rem for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn rem(self, rhs: Self) -> DerivativeStructure<F> {
        &self % &rhs
    }
}

impl<F: Float> Neg for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn neg(self) -> DerivativeStructure<F> {
        self.negate()
    }
}

impl<F: Float> Neg for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn neg(self) -> DerivativeStructure<F> {
        self.negate()
    }
}

impl<F: Float> AddAssign<&DerivativeStructure<F>> for DerivativeStructure<F> {
    fn add_assign(&mut self, rhs: &DerivativeStructure<F>) {
        *self = &*self + rhs;
    }
}

impl<F: Float> SubAssign<&DerivativeStructure<F>> for DerivativeStructure<F> {
    fn sub_assign(&mut self, rhs: &DerivativeStructure<F>) {
        *self = &*self - rhs;
    }
}

impl<F: Float> MulAssign<&DerivativeStructure<F>> for DerivativeStructure<F> {
    fn mul_assign(&mut self, rhs: &DerivativeStructure<F>) {
        *self = &*self * rhs;
    }
}

impl<F: Float> DivAssign<&DerivativeStructure<F>> for DerivativeStructure<F> {
    fn div_assign(&mut self, rhs: &DerivativeStructure<F>) {
        *self = &*self / rhs;
    }
}

impl<F: Float> RemAssign<&DerivativeStructure<F>> for DerivativeStructure<F> {
    fn rem_assign(&mut self, rhs: &DerivativeStructure<F>) {
        *self = &*self % rhs;
    }
}

// Mixed ops: DerivativeStructure<F> with plain scalars.

impl<F: Float> Add<F> for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn add(self, rhs: F) -> DerivativeStructure<F> {
        self.add_scalar(rhs)
    }
}

impl<F: Float> Add<F> for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn add(self, rhs: F) -> DerivativeStructure<F> {
        self.add_scalar(rhs)
    }
}

impl<F: Float> Sub<F> for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn sub(self, rhs: F) -> DerivativeStructure<F> {
        self.add_scalar(-rhs)
    }
}

impl<F: Float> Sub<F> for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn sub(self, rhs: F) -> DerivativeStructure<F> {
        self.add_scalar(-rhs)
    }
}

impl<F: Float> Mul<F> for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn mul(self, rhs: F) -> DerivativeStructure<F> {
        self.multiply_scalar(rhs)
    }
}

impl<F: Float> Mul<F> for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn mul(self, rhs: F) -> DerivativeStructure<F> {
        self.multiply_scalar(rhs)
    }
}

// Scalar Div multiplies by the reciprocal
#[allow(clippy::suspicious_arithmetic_impl)]
impl<F: Float> Div<F> for &DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn div(self, rhs: F) -> DerivativeStructure<F> {
        self.multiply_scalar(rhs.recip())
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl<F: Float> Div<F> for DerivativeStructure<F> {
    type Output = DerivativeStructure<F>;
    fn div(self, rhs: F) -> DerivativeStructure<F> {
        self.multiply_scalar(rhs.recip())
    }
}

macro_rules! impl_scalar_lhs_ops {
    ($f:ty) => {
        impl Add<DerivativeStructure<$f>> for $f {
            type Output = DerivativeStructure<$f>;
            fn add(self, rhs: DerivativeStructure<$f>) -> DerivativeStructure<$f> {
                rhs.add_scalar(self)
            }
        }

        impl Sub<DerivativeStructure<$f>> for $f {
            type Output = DerivativeStructure<$f>;
            fn sub(self, rhs: DerivativeStructure<$f>) -> DerivativeStructure<$f> {
                rhs.negate().add_scalar(self)
            }
        }

        impl Mul<DerivativeStructure<$f>> for $f {
            type Output = DerivativeStructure<$f>;
            fn mul(self, rhs: DerivativeStructure<$f>) -> DerivativeStructure<$f> {
                rhs.multiply_scalar(self)
            }
        }

        #[allow(clippy::suspicious_arithmetic_impl)]
        impl Div<DerivativeStructure<$f>> for $f {
            type Output = DerivativeStructure<$f>;
            fn div(self, rhs: DerivativeStructure<$f>) -> DerivativeStructure<$f> {
                rhs.reciprocal().multiply_scalar(self)
            }
        }
    };
}

impl_scalar_lhs_ops!(f32);
impl_scalar_lhs_ops!(f64);
