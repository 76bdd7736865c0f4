//! Container for a Taylor map: several derivative structures sharing one
//! compiler, seen as a vector-valued function of the same free parameters.
//!
//! Supports evaluation at an offset, composition of maps through the
//! multivariate chain rule, and (for square maps) inversion by splitting
//! off the linear part, inverting it by matrix decomposition and refining
//! the nonlinear remainder with a fixed-point iteration, following
//! chapter 2 of Berz, *Advances in Imaging and Electron Physics* vol 108.

use nalgebra::{DMatrix, RealField};

use crate::error::DsError;
use crate::factory::DsFactory;
use crate::float::Float;
use crate::structure::DerivativeStructure;

/// A set of n derivative structures \((f_1, \ldots, f_n)\) of m free
/// parameters, together with the point the map is evaluated at.
#[derive(Clone, Debug)]
pub struct TaylorMap<F: Float> {
    /// Evaluation point, one entry per free parameter.
    point: Vec<F>,
    /// Mapping functions, all sharing one compiler.
    functions: Vec<DerivativeStructure<F>>,
}

impl<F: Float> TaylorMap<F> {
    /// Build a map from an evaluation point and its functions.
    ///
    /// The point length must match the functions' free-parameter count,
    /// and every function must share the same parameter count and order.
    pub fn new(point: Vec<F>, functions: Vec<DerivativeStructure<F>>) -> Result<Self, DsError> {
        if functions.is_empty() {
            return Err(DsError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let factory = functions[0].factory();
        if point.len() != factory.free_parameters() {
            return Err(DsError::DimensionMismatch {
                expected: factory.free_parameters(),
                actual: point.len(),
            });
        }
        for function in &functions[1..] {
            factory.check_compatibility(function.factory())?;
        }
        Ok(TaylorMap { point, functions })
    }

    /// The identity map over `parameters` variables at the given order,
    /// evaluated at the origin.
    pub fn identity(parameters: usize, order: usize) -> Result<Self, DsError> {
        Self::identity_with_factory(&DsFactory::new(parameters, order))
    }

    fn identity_with_factory(factory: &DsFactory<F>) -> Result<Self, DsError> {
        let parameters = factory.free_parameters();
        let mut functions = Vec::with_capacity(parameters);
        for i in 0..parameters {
            functions.push(factory.variable(i, F::zero())?);
        }
        Ok(TaylorMap {
            point: vec![F::zero(); parameters],
            functions,
        })
    }

    /// Number of free parameters of the map.
    pub fn n_parameters(&self) -> usize {
        self.point.len()
    }

    /// Number of functions of the map.
    pub fn n_functions(&self) -> usize {
        self.functions.len()
    }

    /// The point at which the map is evaluated.
    pub fn point(&self) -> &[F] {
        &self.point
    }

    /// One of the map's functions.
    pub fn function(&self, i: usize) -> &DerivativeStructure<F> {
        &self.functions[i]
    }

    /// Evaluate the Taylor expansion of every function at an offset from
    /// the evaluation point.
    pub fn value(&self, delta: &[F]) -> Result<Vec<F>, DsError> {
        self.functions.iter().map(|f| f.taylor(delta)).collect()
    }

    /// Compose with another map as `self ∘ other`, rebasing every function
    /// of `self` onto the functions of `other`.
    pub fn compose(&self, other: &TaylorMap<F>) -> Result<TaylorMap<F>, DsError> {
        if self.n_parameters() != other.n_functions() {
            return Err(DsError::DimensionMismatch {
                expected: self.n_parameters(),
                actual: other.n_functions(),
            });
        }
        let composed = self
            .functions
            .iter()
            .map(|f| f.rebase(&other.functions))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TaylorMap {
            point: other.point.clone(),
            functions: composed,
        })
    }

    /// `self - other`, function by function, evaluated at the origin.
    fn subtract(&self, other: &TaylorMap<F>) -> Result<TaylorMap<F>, DsError> {
        let functions = self
            .functions
            .iter()
            .zip(&other.functions)
            .map(|(a, b)| a.subtract(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TaylorMap {
            point: vec![F::zero(); self.point.len()],
            functions,
        })
    }

    /// Invert the map.
    ///
    /// Where the map's Taylor expansion turns parameter offsets
    /// \((\Delta p_1, \ldots, \Delta p_n)\) into evaluation offsets
    /// \((df_1, \ldots, df_n)\), the inverse computes the parameter
    /// offsets back from the evaluation offsets. Only square maps
    /// (function count equal to parameter count) can be inverted.
    ///
    /// The linear part of the Jacobian is inverted by LU decomposition
    /// (failing with `SingularMatrix` if it is not invertible); the
    /// nonlinear remainder is recovered by the fixed-point iteration
    /// `invertₖ = L⁻¹ ∘ (id − NL ∘ invertₖ₋₁)`, gaining one derivation
    /// order of accuracy per step.
    pub fn invert(&self) -> Result<TaylorMap<F>, DsError>
    where
        F: RealField,
    {
        let factory = self.functions[0].factory().clone();
        let compiler = factory.compiler().clone();
        let n = self.functions.len();

        if n != factory.free_parameters() {
            return Err(DsError::DimensionMismatch {
                expected: factory.free_parameters(),
                actual: n,
            });
        }

        // indirection between linear terms and complete derivative arrays
        let mut indirection = vec![0usize; n];
        let mut linear_index = 0;
        let mut k = 1;
        while linear_index < n {
            if compiler.partial_derivative_orders_sum(k) == 1 {
                indirection[linear_index] = k;
                linear_index += 1;
            }
            k += 1;
        }

        // separate the linear part from the nonlinear terms
        let mut linear = DMatrix::<F>::zeros(n, n);
        let mut non_linear_functions = Vec::with_capacity(n);
        for i in 0..n {
            let mut data = self.functions[i].all_derivatives().to_vec();
            data[0] = F::zero();
            for j in 0..n {
                linear[(i, j)] = data[indirection[j]];
                data[indirection[j]] = F::zero();
            }
            non_linear_functions.push(factory.build(&data)?);
        }
        let non_linear = TaylorMap {
            point: vec![F::zero(); n],
            functions: non_linear_functions,
        };

        // invert the linear part
        let linear_inverse = linear.lu().try_inverse().ok_or(DsError::SingularMatrix)?;

        // convert the inverted linear part back to a Taylor map
        let mut linear_inverse_functions = Vec::with_capacity(n);
        for i in 0..n {
            let mut data = vec![F::zero(); compiler.size()];
            for j in 0..n {
                data[indirection[j]] = linear_inverse[(i, j)];
            }
            linear_inverse_functions.push(factory.build(&data)?);
        }
        let linear_inverse_map = TaylorMap {
            point: vec![F::zero(); n],
            functions: linear_inverse_functions,
        };

        // fixed-point evaluation of the inverse, adding one derivation
        // order of accuracy at each iteration
        let identity = Self::identity_with_factory(&factory)?;
        let mut inverse = linear_inverse_map.clone();
        for _ in 1..compiler.order() {
            inverse = linear_inverse_map.compose(&identity.subtract(&non_linear.compose(&inverse)?)?)?;
        }

        // restore the constant terms
        let mut point = Vec::with_capacity(n);
        for i in 0..n {
            point.push(self.functions[i].value());
            inverse.functions[i].data_mut()[0] = self.point[i];
        }
        inverse.point = point;

        Ok(inverse)
    }
}
