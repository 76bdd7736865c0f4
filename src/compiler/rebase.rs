//! Lazy construction of the multivariate rebase (chain-rule) tables.
//!
//! A rebase table re-expresses this compiler's derivatives, taken with
//! respect to p intermediate variables, in terms of m lower-level base
//! variables whose relation to the intermediates is known as a set of
//! derivative structures. One table per distinct base-parameter count m is
//! built on first request and memoized on the compiler instance.
//!
//! At order n the table is grown from this compiler's own order n-1 table:
//! entries for derivation orders below n are copied with indices
//! converted; each entry at order n, say ∂ⁿf/∂qⱼ⋯∂qₖ∂qₗ, picks a base
//! variable qₗ with nonzero order, looks up the order n-1 entry
//! ∂ⁿ⁻¹f/∂qⱼ⋯∂qₖ, and differentiates its sum of products once more with
//! respect to qₗ: the outer ∂ⁿ⁻¹f/∂pᵤ⋯∂pᵥ part through every intermediate
//! variable's own first partial ∂pᵢ/∂qₗ, and each inner ∂pᵤ/∂q⋯ factor by
//! raising its qₗ order.

use std::sync::Arc;

use crate::indexing::{convert_index, orders_to_index};

use super::terms::{merge_similar, RebaseTerm};
use super::{DsCompiler, RebaseTable};

impl DsCompiler {
    /// Get the rebase table towards `base`'s parameter count, building and
    /// memoizing it if needed.
    ///
    /// First-time builds for the same base count are serialized by the
    /// write lock; already-built tables are returned from the read path.
    pub(crate) fn rebaser(&self, base: &DsCompiler) -> Arc<RebaseTable> {
        let m = base.parameters;
        {
            let tables = self.rebase_tables.read().expect("rebase table lock poisoned");
            if let Some(Some(table)) = tables.get(m) {
                return table.clone();
            }
        }

        let mut tables = self.rebase_tables.write().expect("rebase table lock poisoned");
        if tables.len() <= m {
            tables.resize(m + 1, None);
        }
        if tables[m].is_none() {
            tables[m] = Some(Arc::new(self.build_rebaser(base)));
        }
        tables[m].clone().expect("rebase table just built")
    }

    fn build_rebaser(&self, base: &DsCompiler) -> RebaseTable {
        if self.order == 0 {
            // at order 0 the rebaser just copies the function value
            return vec![vec![RebaseTerm {
                coeff: 1,
                ds_index: 0,
                product_indices: Vec::new(),
            }]];
        }

        let base_size = base.size();
        let mut rebaser = self.initialize_from_lower_rebaser(base);

        // entries of maximum order are the ones the lower rebaser left unset
        for k in 1..base_size {
            if rebaser[k].is_some() {
                continue;
            }

            // pick any base variable with nonzero derivation order and find
            // the entry differentiating one order less with respect to it
            let mut orders = base.derivative_orders[k].clone();
            let q_index = orders
                .iter()
                .position(|&o| o > 0)
                .expect("entries above index 0 carry a nonzero derivation order");
            orders[q_index] -= 1;
            let lower_index = orders_to_index(base.parameters, base.order, &base.sizes, &orders)
                .expect("reduced orders stay within the base order");
            let lower_row = rebaser[lower_index]
                .clone()
                .expect("lower-order entries are filled before maximum-order ones");

            let mut row = Vec::new();
            for lower_term in &lower_row {
                // differentiate the outer ∂f/∂p⋯ part through each
                // intermediate variable
                for i in 0..self.parameters {
                    row.push(self.differentiate_f_part(lower_term, i, q_index, base));
                }
                // differentiate each inner ∂p/∂q⋯ product factor
                for j in 0..lower_term.product_indices.len() {
                    row.push(differentiate_product_part(lower_term, j, q_index, base));
                }
            }

            rebaser[k] = Some(merge_similar(row));
        }

        rebaser
            .into_iter()
            .map(|row| row.expect("every entry filled by the recursion"))
            .collect()
    }

    /// Copy the order n-1 rebase rules into an order n table, adjusting
    /// every index for the larger schemes; maximum-order entries stay
    /// `None` for the caller to fill.
    fn initialize_from_lower_rebaser(&self, base: &DsCompiler) -> Vec<Option<Vec<RebaseTerm>>> {
        let lower = self
            .derivative_compiler
            .as_deref()
            .expect("order > 0 compilers keep their derivative sub-compiler");
        let lower_base = base
            .derivative_compiler
            .as_deref()
            .expect("base compiler shares the derivation order");
        let lower_base_size = lower_base.size();
        let lower_rebaser = lower.rebaser(lower_base);

        let base_size = base.size();
        let mut rebaser: Vec<Option<Vec<RebaseTerm>>> = vec![None; base_size];

        for (i, lower_row) in lower_rebaser.iter().enumerate() {
            let index = convert_index(
                i,
                &lower_base.derivative_orders,
                base.parameters,
                base.order,
                &base.sizes,
            );
            let row = lower_row
                .iter()
                .map(|term| RebaseTerm {
                    coeff: term.coeff,
                    ds_index: convert_index(
                        term.ds_index,
                        &lower.derivative_orders,
                        self.parameters,
                        self.order,
                        &self.sizes,
                    ),
                    product_indices: term
                        .product_indices
                        .iter()
                        .map(|&packed| {
                            let p_index = packed / lower_base_size;
                            let base_index = packed % lower_base_size;
                            p_index * base_size
                                + convert_index(
                                    base_index,
                                    &lower_base.derivative_orders,
                                    base.parameters,
                                    base.order,
                                    &base.sizes,
                                )
                        })
                        .collect(),
                })
                .collect();
            rebaser[index] = Some(row);
        }

        rebaser
    }

    /// Differentiate the ∂ⁿ⁻¹f/∂pᵤ⋯∂pᵥ part of a term with respect to
    /// intermediate variable `i`, multiplying by ∂pᵢ/∂qₗ.
    fn differentiate_f_part(
        &self,
        lower_term: &RebaseTerm,
        i: usize,
        q_index: usize,
        base: &DsCompiler,
    ) -> RebaseTerm {
        let mut term_orders = self.derivative_orders[lower_term.ds_index].clone();
        term_orders[i] += 1;
        let ds_index = orders_to_index(self.parameters, self.order, &self.sizes, &term_orders)
            .expect("raised orders stay within the compiler order");

        let mut q_orders = vec![0; base.parameters];
        q_orders[q_index] = 1;
        let first_partial = orders_to_index(base.parameters, base.order, &base.sizes, &q_orders)
            .expect("first-order derivative exists for order > 0");

        let mut product_indices = lower_term.product_indices.clone();
        product_indices.push(i * base.size() + first_partial);
        product_indices.sort_unstable();

        RebaseTerm {
            coeff: lower_term.coeff,
            ds_index,
            product_indices,
        }
    }
}

/// Differentiate the `j`-th ∂p/∂q⋯ product factor of a term by raising its
/// derivation order with respect to base variable `q_index`.
fn differentiate_product_part(
    lower_term: &RebaseTerm,
    j: usize,
    q_index: usize,
    base: &DsCompiler,
) -> RebaseTerm {
    let base_size = base.size();
    let mut product_indices = lower_term.product_indices.clone();
    let p_index = product_indices[j] / base_size;
    let base_index = product_indices[j] % base_size;

    let mut p_orders = base.derivative_orders[base_index].clone();
    p_orders[q_index] += 1;
    let raised = orders_to_index(base.parameters, base.order, &base.sizes, &p_orders)
        .expect("raised orders stay within the base order");
    product_indices[j] = p_index * base_size + raised;
    product_indices.sort_unstable();

    RebaseTerm {
        coeff: lower_term.coeff,
        ds_index: lower_term.ds_index,
        product_indices,
    }
}
