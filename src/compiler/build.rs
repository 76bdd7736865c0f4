//! Table construction for [`DsCompiler`].
//!
//! Each table for (p, o) is derived from the tables of the (p-1, o)
//! "value" compiler and the (p, o-1) "derivative" compiler, which the
//! cache guarantees to exist beforehand (diagonal build order). Value-part
//! rows embed unchanged because the first `size(p-1, o)` entries of a
//! (p, o) scheme are exactly the (p-1, o) entries; derivative-part rows
//! are obtained by differentiating the (p, o-1) rows once more with
//! respect to the newest parameter, remapping indices between the two
//! linear orderings where they differ.

use std::sync::{Arc, RwLock};

use crate::indexing::{convert_index, orders_to_index};

use super::terms::{merge_similar, CompositionTerm, MultiplicationTerm};
use super::DsCompiler;

impl DsCompiler {
    /// Build the compiler for (parameters, order) from its two
    /// sub-compilers. Reserved for [`CompilerCache`](super::CompilerCache).
    pub(super) fn build(
        parameters: usize,
        order: usize,
        value_compiler: Option<Arc<DsCompiler>>,
        derivative_compiler: Option<Arc<DsCompiler>>,
    ) -> DsCompiler {
        let sizes = compile_sizes(parameters, order, value_compiler.as_deref());
        let derivative_orders = compile_derivative_orders(
            parameters,
            value_compiler.as_deref(),
            derivative_compiler.as_deref(),
        );
        let orders_sum = derivative_orders
            .iter()
            .map(|row| row.iter().sum())
            .collect();
        let lower_indirection = compile_lower_indirection(
            parameters,
            order,
            value_compiler.as_deref(),
            derivative_compiler.as_deref(),
        );
        let mult_table = compile_multiplication_table(
            value_compiler.as_deref(),
            derivative_compiler.as_deref(),
            &lower_indirection,
        );
        let comp_table = compile_composition_table(
            parameters,
            order,
            value_compiler.as_deref(),
            derivative_compiler.as_deref(),
            &sizes,
            &derivative_orders,
        );

        DsCompiler {
            parameters,
            order,
            sizes,
            derivative_orders,
            orders_sum,
            lower_indirection,
            mult_table,
            comp_table,
            derivative_compiler,
            rebase_tables: RwLock::new(Vec::new()),
        }
    }
}

/// Size table: `sizes[p][o] = sizes[p][o-1] + sizes[p-1][o]`, with
/// `sizes[0][*] = 1` and `sizes[p][0] = 1`.
fn compile_sizes(
    parameters: usize,
    order: usize,
    value_compiler: Option<&DsCompiler>,
) -> Vec<Vec<usize>> {
    match value_compiler {
        None => vec![vec![1; order + 1]],
        Some(vc) => {
            let mut sizes: Vec<Vec<usize>> = Vec::with_capacity(parameters + 1);
            sizes.extend(vc.sizes.iter().cloned());
            let mut row = vec![0; order + 1];
            row[0] = 1;
            for o in 0..order {
                row[o + 1] = row[o] + sizes[parameters - 1][o + 1];
            }
            sizes.push(row);
            sizes
        }
    }
}

/// Order-vector table.
///
/// The value-part rows keep the last parameter underived; the
/// derivative-part rows are the (p, o-1) rows with the last parameter's
/// order incremented.
fn compile_derivative_orders(
    parameters: usize,
    value_compiler: Option<&DsCompiler>,
    derivative_compiler: Option<&DsCompiler>,
) -> Vec<Vec<usize>> {
    match (value_compiler, derivative_compiler) {
        (Some(vc), Some(dc)) => {
            let mut orders = Vec::with_capacity(vc.derivative_orders.len() + dc.derivative_orders.len());
            for value_row in &vc.derivative_orders {
                let mut row = vec![0; parameters];
                row[..parameters - 1].copy_from_slice(value_row);
                orders.push(row);
            }
            for derivative_row in &dc.derivative_orders {
                let mut row = derivative_row.clone();
                row[parameters - 1] += 1;
                orders.push(row);
            }
            orders
        }
        // parameters == 0 or order == 0: a single all-zero row
        _ => vec![vec![0; parameters]],
    }
}

/// Indices of the entries whose last-parameter order is below the maximum,
/// i.e. the subset of this scheme corresponding to the (p, o-1) truncation.
fn compile_lower_indirection(
    parameters: usize,
    order: usize,
    value_compiler: Option<&DsCompiler>,
    derivative_compiler: Option<&DsCompiler>,
) -> Vec<usize> {
    if parameters == 0 || order <= 1 {
        return vec![0];
    }
    let (vc, dc) = match (value_compiler, derivative_compiler) {
        (Some(vc), Some(dc)) => (vc, dc),
        _ => unreachable!("sub-compilers exist when parameters > 0 and order > 1"),
    };
    let mut lower = Vec::with_capacity(vc.lower_indirection.len() + dc.lower_indirection.len());
    lower.extend_from_slice(&vc.lower_indirection);
    lower.extend(dc.lower_indirection.iter().map(|&i| vc.size() + i));
    lower
}

/// Multiplication table (Leibniz rule).
///
/// Each derivative-part row differentiates the corresponding (p, o-1) row
/// twice, once with the left factor carrying the new derivative and once
/// the right, then merges similar terms.
fn compile_multiplication_table(
    value_compiler: Option<&DsCompiler>,
    derivative_compiler: Option<&DsCompiler>,
    lower_indirection: &[usize],
) -> Vec<Vec<MultiplicationTerm>> {
    let (vc, dc) = match (value_compiler, derivative_compiler) {
        (Some(vc), Some(dc)) => (vc, dc),
        // parameters == 0 or order == 0: plain value product
        _ => return vec![vec![MultiplicationTerm { coeff: 1, lhs: 0, rhs: 0 }]],
    };

    let v_size = vc.mult_table.len();
    let mut table = Vec::with_capacity(v_size + dc.mult_table.len());
    table.extend(vc.mult_table.iter().cloned());

    for derivative_row in &dc.mult_table {
        let mut row = Vec::with_capacity(derivative_row.len() * 2);
        for term in derivative_row {
            row.push(MultiplicationTerm {
                coeff: term.coeff,
                lhs: lower_indirection[term.lhs],
                rhs: v_size + term.rhs,
            });
            row.push(MultiplicationTerm {
                coeff: term.coeff,
                lhs: v_size + term.lhs,
                rhs: lower_indirection[term.rhs],
            });
        }
        table.push(merge_similar(row));
    }

    table
}

/// Composition table (Faà-di-Bruno).
///
/// Each (p, o-1) term `c · f_k(g) · g_{l1} ⋯ g_{lp}` yields one term
/// deriving the outer function (`f_k → f_{k+1}`, times the new parameter's
/// own first partial) and one term per factor deriving that factor. Copied
/// index references are remapped because the linear ordering differs
/// between the (p, o-1) and (p, o) schemes.
fn compile_composition_table(
    parameters: usize,
    order: usize,
    value_compiler: Option<&DsCompiler>,
    derivative_compiler: Option<&DsCompiler>,
    sizes: &[Vec<usize>],
    derivative_orders: &[Vec<usize>],
) -> Vec<Vec<CompositionTerm>> {
    let (vc, dc) = match (value_compiler, derivative_compiler) {
        (Some(vc), Some(dc)) => (vc, dc),
        _ => {
            return vec![vec![CompositionTerm {
                coeff: 1,
                f_index: 0,
                ds_indices: Vec::new(),
            }]]
        }
    };

    let index_of = |orders: &[usize]| {
        orders_to_index(parameters, order, sizes, orders)
            .expect("differentiated term stays within the compiler order")
    };

    // index of the first partial with respect to the newest parameter
    let mut newest = vec![0; parameters];
    newest[parameters - 1] = 1;
    let newest_partial = index_of(&newest);

    let v_size = vc.comp_table.len();
    let mut table = Vec::with_capacity(v_size + dc.comp_table.len());
    table.extend(vc.comp_table.iter().cloned());

    for derivative_row in &dc.comp_table {
        let mut row = Vec::new();
        for term in derivative_row {
            let converted: Vec<usize> = term
                .ds_indices
                .iter()
                .map(|&i| convert_index(i, &dc.derivative_orders, parameters, order, sizes))
                .collect();

            // derive the outer function: f_k -> f_(k+1), times g_1
            let mut ds_indices = converted.clone();
            ds_indices.push(newest_partial);
            ds_indices.sort_unstable();
            row.push(CompositionTerm {
                coeff: term.coeff,
                f_index: term.f_index + 1,
                ds_indices,
            });

            // derive each inner factor in turn
            for l in 0..converted.len() {
                let mut ds_indices = converted.clone();
                let mut orders = derivative_orders[ds_indices[l]].clone();
                orders[parameters - 1] += 1;
                ds_indices[l] = index_of(&orders);
                ds_indices.sort_unstable();
                row.push(CompositionTerm {
                    coeff: term.coeff,
                    f_index: term.f_index,
                    ds_indices,
                });
            }
        }
        table.push(merge_similar(row));
    }

    table
}
