//! "Compiled" computation rules for derivative structures.
//!
//! A [`DsCompiler`] holds, for one (free parameters, derivation order)
//! pair, the precomputed indirection tables that turn multivariate
//! derivative arithmetic into flat array loops: the size table, the
//! order-vector table, the lower-derivative indirection, the Leibniz
//! multiplication table, the Faà-di-Bruno composition table and the
//! (lazily built) multivariate rebase tables. The construction follows
//! Dan Kalman's doubly recursive scheme (*Doubly Recursive Multivariate
//! Automatic Differentiation*, Mathematics Magazine vol. 75 no. 3, 2002),
//! with the recursion unrolled once at build time so runtime operations
//! never recurse.
//!
//! Compilers are immutable once built and shared through `Arc`s handed
//! out by a [`CompilerCache`]. The compiler operates on caller-owned
//! coefficient slices and never holds numeric data itself; one compiler
//! serves every structure with the same shape.

mod build;
mod ops;
mod rebase;
pub(crate) mod terms;

use std::sync::{Arc, OnceLock, RwLock};

use crate::error::DsError;
use crate::indexing;

use terms::{CompositionTerm, MultiplicationTerm, RebaseTerm};

pub(crate) type RebaseTable = Vec<Vec<RebaseTerm>>;

/// Compiled computation rules for one (parameters, order) pair.
///
/// Obtained from [`CompilerCache::get`]; all fields are immutable after
/// construction except the lazily populated rebase-table list, which only
/// grows and shares built entries behind `Arc`s.
pub struct DsCompiler {
    /// Number of free parameters.
    parameters: usize,
    /// Derivation order.
    order: usize,
    /// `sizes[p][o]`: coefficient count for `p` parameters at order `o`.
    sizes: Vec<Vec<usize>>,
    /// Per-index derivation-order vectors; row 0 is all zeros.
    derivative_orders: Vec<Vec<usize>>,
    /// Precomputed sums of `derivative_orders` rows.
    orders_sum: Vec<usize>,
    /// Indices of the (parameters, order - 1) truncation inside this scheme.
    lower_indirection: Vec<usize>,
    /// Leibniz product-rule terms per output index.
    mult_table: Vec<Vec<MultiplicationTerm>>,
    /// Faà-di-Bruno composition terms per output index.
    comp_table: Vec<Vec<CompositionTerm>>,
    /// (parameters, order - 1) sub-compiler, kept for the lazy rebase
    /// recursion; `None` when `order == 0`.
    derivative_compiler: Option<Arc<DsCompiler>>,
    /// Rebase tables, indexed by base-parameter count, built on demand.
    rebase_tables: RwLock<Vec<Option<Arc<RebaseTable>>>>,
}

impl DsCompiler {
    /// Number of free parameters.
    pub fn free_parameters(&self) -> usize {
        self.parameters
    }

    /// Derivation order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Array size required for holding a value and all partial derivatives.
    ///
    /// The value itself is always stored at index 0.
    pub fn size(&self) -> usize {
        self.sizes[self.parameters][self.order]
    }

    /// Get the index of a partial derivative in the flat array.
    ///
    /// Inverse of [`partial_derivative_orders`](Self::partial_derivative_orders).
    /// The all-zero vector maps to index 0 (the value). For a single free
    /// parameter, the index equals the derivation order; at order 1, index
    /// `k` (1 ≤ k ≤ parameters) is the first derivative with respect to
    /// parameter `k - 1`. Other layouts are compiler-specific.
    pub fn partial_derivative_index(&self, orders: &[usize]) -> Result<usize, DsError> {
        if orders.len() != self.parameters {
            return Err(DsError::DimensionMismatch {
                expected: self.parameters,
                actual: orders.len(),
            });
        }
        indexing::orders_to_index(self.parameters, self.order, &self.sizes, orders)
    }

    /// Get the derivation orders for a specific index in the array.
    pub fn partial_derivative_orders(&self, index: usize) -> &[usize] {
        &self.derivative_orders[index]
    }

    /// Get the sum of derivation orders for a specific index (precomputed).
    pub fn partial_derivative_orders_sum(&self, index: usize) -> usize {
        self.orders_sum[index]
    }

    /// Check that another compiler has the same shape.
    ///
    /// Two compilers are compatible iff parameter count and order both
    /// match exactly; this runs before any array access in binary
    /// operations.
    pub fn check_compatibility(&self, other: &DsCompiler) -> Result<(), DsError> {
        if self.parameters != other.parameters {
            return Err(DsError::DimensionMismatch {
                expected: self.parameters,
                actual: other.parameters,
            });
        }
        if self.order != other.order {
            return Err(DsError::DimensionMismatch {
                expected: self.order,
                actual: other.order,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for DsCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsCompiler")
            .field("parameters", &self.parameters)
            .field("order", &self.order)
            .field("size", &self.size())
            .finish()
    }
}

/// Grow-only cache of compilers, keyed by (parameters, order).
///
/// Compilers are immutable and reusable across unrelated computations, so
/// one cache instance can serve an entire process; [`compiler_cache`]
/// exposes a shared one. Reads take a shared lock and see either the
/// previous fully-published table or the new one, never a partially built
/// entry. A miss upgrades to the write lock and builds every missing
/// dependency in increasing diagonal order of `parameters + order`, since
/// each compiler is built from its (p-1, o) and (p, o-1) neighbours.
#[derive(Default)]
pub struct CompilerCache {
    table: RwLock<Vec<Vec<Option<Arc<DsCompiler>>>>>,
}

impl CompilerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        CompilerCache {
            table: RwLock::new(Vec::new()),
        }
    }

    /// Get the compiler for a number of free parameters and an order,
    /// building and caching it (and its dependencies) on first request.
    pub fn get(&self, parameters: usize, order: usize) -> Arc<DsCompiler> {
        {
            let table = self.table.read().expect("compiler cache lock poisoned");
            if let Some(compiler) = table
                .get(parameters)
                .and_then(|row| row.get(order))
                .and_then(Option::as_ref)
            {
                return compiler.clone();
            }
        }

        let mut table = self.table.write().expect("compiler cache lock poisoned");

        // grow the table, preserving already created compilers
        let rows = table.len().max(parameters + 1);
        let cols = table.first().map_or(0, |row| row.len()).max(order + 1);
        for row in table.iter_mut() {
            row.resize(cols, None);
        }
        while table.len() < rows {
            table.push(vec![None; cols]);
        }

        // fill the requested rectangle in increasing diagonal order, so that
        // the (p-1, o) and (p, o-1) dependencies of each entry already exist
        for diag in 0..=(parameters + order) {
            for o in diag.saturating_sub(parameters)..=order.min(diag) {
                let p = diag - o;
                if table[p][o].is_none() {
                    let value_compiler = if p == 0 { None } else { table[p - 1][o].clone() };
                    let derivative_compiler = if o == 0 { None } else { table[p][o - 1].clone() };
                    table[p][o] = Some(Arc::new(DsCompiler::build(
                        p,
                        o,
                        value_compiler,
                        derivative_compiler,
                    )));
                }
            }
        }

        table[parameters][order]
            .clone()
            .expect("requested compiler built by the diagonal pass")
    }
}

/// Process-wide shared compiler cache, created on first use.
///
/// The convenience constructors ([`DsFactory::new`](crate::DsFactory::new))
/// go through this instance; callers wanting full control over cache
/// lifetime can create their own [`CompilerCache`] and use
/// [`DsFactory::with_cache`](crate::DsFactory::with_cache).
pub fn compiler_cache() -> &'static CompilerCache {
    static SHARED: OnceLock<CompilerCache> = OnceLock::new();
    SHARED.get_or_init(CompilerCache::new)
}
