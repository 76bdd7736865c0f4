//! Term records for the three indirection tables, plus the shared merge.
//!
//! Each table row is a list of terms encoding one combinatorial formula
//! (Leibniz product rule, Faà-di-Bruno composition, multivariate chain
//! rule) as flat index references with an integer coefficient. Two terms
//! are similar when all their index fields compare equal (argument lists
//! are kept sorted, so comparison is elementwise); similar terms are
//! combined by coefficient addition and vanishing terms are dropped.

use std::cmp::Ordering;

/// One term of the Leibniz product rule: `coeff * lhs[i] * rhs[j]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MultiplicationTerm {
    pub coeff: i64,
    pub lhs: usize,
    pub rhs: usize,
}

/// One term of Faà-di-Bruno's formula:
/// `coeff * f[f_index] * Π operand[ds_indices[k]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CompositionTerm {
    pub coeff: i64,
    pub f_index: usize,
    /// Kept sorted; factor order is insignificant.
    pub ds_indices: Vec<usize>,
}

/// One term of the multivariate chain rule:
/// `coeff * ds[ds_index] * Π p[product_indices[k]]`.
///
/// Each product index packs an intermediate-variable number and a base
/// derivative index as `intermediate * base_size + base_index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RebaseTerm {
    pub coeff: i64,
    pub ds_index: usize,
    /// Kept sorted; factor order is insignificant.
    pub product_indices: Vec<usize>,
}

/// Common shape of the three term records, exposing the merge key.
pub(crate) trait SimilarTerm {
    /// Total order on the non-coefficient fields; `Equal` means similar.
    fn key_cmp(&self, other: &Self) -> Ordering;
    fn coeff(&self) -> i64;
    fn coeff_mut(&mut self) -> &mut i64;
}

impl SimilarTerm for MultiplicationTerm {
    fn key_cmp(&self, other: &Self) -> Ordering {
        (self.lhs, self.rhs).cmp(&(other.lhs, other.rhs))
    }

    fn coeff(&self) -> i64 {
        self.coeff
    }

    fn coeff_mut(&mut self) -> &mut i64 {
        &mut self.coeff
    }
}

impl SimilarTerm for CompositionTerm {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.f_index
            .cmp(&other.f_index)
            .then_with(|| self.ds_indices.cmp(&other.ds_indices))
    }

    fn coeff(&self) -> i64 {
        self.coeff
    }

    fn coeff_mut(&mut self) -> &mut i64 {
        &mut self.coeff
    }
}

impl SimilarTerm for RebaseTerm {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.ds_index
            .cmp(&other.ds_index)
            .then_with(|| self.product_indices.cmp(&other.product_indices))
    }

    fn coeff(&self) -> i64 {
        self.coeff
    }

    fn coeff_mut(&mut self) -> &mut i64 {
        &mut self.coeff
    }
}

/// Sort terms by key, combine runs of similar terms by coefficient
/// addition, and drop terms whose combined coefficient is zero.
///
/// The sort doubles as the row-layout guarantee the forward-substitution
/// loops rely on: in a multiplication row for output index `i`, the term
/// `(c, 0, i)` sorts first and `(c, i, 0)` sorts last, since no product
/// term can reference an index above `i`.
pub(crate) fn merge_similar<T: SimilarTerm>(mut terms: Vec<T>) -> Vec<T> {
    terms.sort_unstable_by(|a, b| a.key_cmp(b));
    let mut merged: Vec<T> = Vec::with_capacity(terms.len());
    for term in terms {
        match merged.last_mut() {
            Some(last) if last.key_cmp(&term) == Ordering::Equal => {
                *last.coeff_mut() += term.coeff();
            }
            _ => merged.push(term),
        }
    }
    merged.retain(|t| t.coeff() != 0);
    merged
}
