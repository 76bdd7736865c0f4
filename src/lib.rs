//! Multivariate, arbitrary-order forward-mode automatic differentiation.
//!
//! multidiff tracks a function's value together with all of its partial
//! derivatives up to a chosen order, for any number of free parameters,
//! in one flat array of numbers. The combinatorics of multivariate
//! differentiation (Leibniz products, Faà-di-Bruno composition, the
//! multivariate chain rule) are compiled once per (parameters, order)
//! pair into index-mapping tables, so that all runtime arithmetic is
//! plain array loops.
//!
//! ```
//! use multidiff::DsFactory;
//!
//! // f(x, y) = x² y + sin(x), with derivatives up to order 2
//! let factory = DsFactory::<f64>::new(2, 2);
//! let x = factory.variable(0, 0.0).unwrap();
//! let y = factory.variable(1, 1.0).unwrap();
//! let f = &(&x * &x) * &y + x.sin();
//!
//! assert_eq!(f.value(), 0.0);
//! assert_eq!(f.partial_derivative(&[1, 0]).unwrap(), 1.0); // ∂f/∂x
//! assert_eq!(f.partial_derivative(&[2, 0]).unwrap(), 2.0); // ∂²f/∂x²
//! ```
//!
//! [`Gradient`] is a compiler-free shortcut for the common first-order
//! case, and [`TaylorMap`] bundles several structures into a composable,
//! invertible map.

pub mod compiler;
pub mod error;
pub mod factory;
pub mod float;
pub mod gradient;
mod indexing;
pub mod structure;
pub mod taylor_map;
mod traits;

pub use compiler::{compiler_cache, CompilerCache, DsCompiler};
pub use error::DsError;
pub use factory::DsFactory;
pub use float::Float;
pub use gradient::Gradient;
pub use structure::DerivativeStructure;
pub use taylor_map::TaylorMap;

/// Type alias for `f64` derivative structures.
pub type DerivativeStructure64 = DerivativeStructure<f64>;
/// Type alias for `f32` derivative structures.
pub type DerivativeStructure32 = DerivativeStructure<f32>;
/// Type alias for `f64` gradients over `N` parameters.
pub type Gradient64<const N: usize> = Gradient<f64, N>;
/// Type alias for `f32` gradients over `N` parameters.
pub type Gradient32<const N: usize> = Gradient<f32, N>;
