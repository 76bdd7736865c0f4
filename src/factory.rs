//! Factory binding derivative structures to one compiler.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::compiler::{compiler_cache, CompilerCache, DsCompiler};
use crate::error::DsError;
use crate::float::Float;
use crate::structure::DerivativeStructure;

/// Factory for [`DerivativeStructure`] instances sharing one compiler.
///
/// All structures built by the same factory (or by compatible factories,
/// i.e. same parameter count and order) can be combined; the factory is
/// cheap to clone, sharing the compiler behind an `Arc`.
pub struct DsFactory<F: Float> {
    compiler: Arc<DsCompiler>,
    _element: PhantomData<fn() -> F>,
}

impl<F: Float> DsFactory<F> {
    /// Create a factory for the given number of free parameters and
    /// derivation order, using the process-wide compiler cache.
    pub fn new(parameters: usize, order: usize) -> Self {
        Self::with_cache(compiler_cache(), parameters, order)
    }

    /// Create a factory resolving its compiler through a caller-owned
    /// cache instead of the shared one.
    pub fn with_cache(cache: &CompilerCache, parameters: usize, order: usize) -> Self {
        DsFactory {
            compiler: cache.get(parameters, order),
            _element: PhantomData,
        }
    }

    /// Build a constant: value set, all derivatives zero.
    pub fn constant(&self, value: F) -> DerivativeStructure<F> {
        let mut data = vec![F::zero(); self.compiler.size()];
        data[0] = value;
        DerivativeStructure::from_parts(self.clone(), data)
    }

    /// Build a free variable: value set, first derivative with respect to
    /// parameter `index` set to one.
    ///
    /// Fails with `IndexOutOfRange` if `index` is not a valid parameter
    /// number.
    pub fn variable(&self, index: usize, value: F) -> Result<DerivativeStructure<F>, DsError> {
        let parameters = self.compiler.free_parameters();
        if index >= parameters {
            return Err(DsError::IndexOutOfRange {
                index,
                limit: parameters,
            });
        }
        let mut data = vec![F::zero(); self.compiler.size()];
        data[0] = value;
        if self.compiler.order() >= 1 {
            let mut orders = vec![0; parameters];
            orders[index] = 1;
            data[self.compiler.partial_derivative_index(&orders)?] = F::one();
        }
        Ok(DerivativeStructure::from_parts(self.clone(), data))
    }

    /// Build a structure from a complete flat derivative array (value
    /// first, derivatives in compiler order).
    ///
    /// Fails with `DimensionMismatch` if the array length is not the
    /// compiler size.
    pub fn build(&self, derivatives: &[F]) -> Result<DerivativeStructure<F>, DsError> {
        if derivatives.len() != self.compiler.size() {
            return Err(DsError::DimensionMismatch {
                expected: self.compiler.size(),
                actual: derivatives.len(),
            });
        }
        Ok(DerivativeStructure::from_parts(
            self.clone(),
            derivatives.to_vec(),
        ))
    }

    /// The compiler backing this factory.
    pub fn compiler(&self) -> &Arc<DsCompiler> {
        &self.compiler
    }

    /// Number of free parameters.
    pub fn free_parameters(&self) -> usize {
        self.compiler.free_parameters()
    }

    /// Derivation order.
    pub fn order(&self) -> usize {
        self.compiler.order()
    }

    /// Flat array size of the structures this factory builds.
    pub fn size(&self) -> usize {
        self.compiler.size()
    }

    /// Check that another factory builds structures of the same shape.
    pub fn check_compatibility(&self, other: &DsFactory<F>) -> Result<(), DsError> {
        self.compiler.check_compatibility(other.compiler())
    }
}

impl<F: Float> Clone for DsFactory<F> {
    fn clone(&self) -> Self {
        DsFactory {
            compiler: self.compiler.clone(),
            _element: PhantomData,
        }
    }
}

impl<F: Float> std::fmt::Debug for DsFactory<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsFactory")
            .field("parameters", &self.compiler.free_parameters())
            .field("order", &self.compiler.order())
            .finish()
    }
}

impl<F: Float> PartialEq for DsFactory<F> {
    fn eq(&self, other: &Self) -> bool {
        self.compiler.free_parameters() == other.compiler.free_parameters()
            && self.compiler.order() == other.compiler.order()
    }
}
