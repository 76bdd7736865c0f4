//! Runtime operations driven by the precomputed tables.
//!
//! Everything here is a plain loop over coefficient slices; the
//! combinatorics were paid for once at table-construction time. All
//! operations are generic over [`Float`], the one scalar capability the
//! loops need.
//!
//! Aliasing: `add`, `subtract` and `remainder` may write in place, and
//! taking `result` as `&mut [F]` next to shared input slices lets the
//! borrow checker enforce the no-aliasing requirement of `multiply`,
//! `compose` and the elementary functions at compile time. The
//! forward-substitution loops (`divide`, `reciprocal`, `sqrt`) read
//! already-computed lower indices of `result` while filling it, which is
//! why their traversal must stay in increasing index order.

use crate::error::DsError;
use crate::float::Float;
use crate::indexing::factorial;

use super::DsCompiler;

impl DsCompiler {
    /// `result = lhs + rhs`, elementwise.
    pub fn add<F: Float>(&self, lhs: &[F], rhs: &[F], result: &mut [F]) {
        for i in 0..self.size() {
            result[i] = lhs[i] + rhs[i];
        }
    }

    /// `result = lhs - rhs`, elementwise.
    pub fn subtract<F: Float>(&self, lhs: &[F], rhs: &[F], result: &mut [F]) {
        for i in 0..self.size() {
            result[i] = lhs[i] - rhs[i];
        }
    }

    /// `result = lhs * rhs` via the Leibniz table.
    pub fn multiply<F: Float>(&self, lhs: &[F], rhs: &[F], result: &mut [F]) {
        for (i, row) in self.mult_table.iter().enumerate() {
            let mut r = F::zero();
            for term in row {
                r = r + F::from(term.coeff).unwrap() * lhs[term.lhs] * rhs[term.rhs];
            }
            result[i] = r;
        }
    }

    /// `result = lhs / rhs`, solving `result * rhs = lhs` index by index.
    ///
    /// Row `i` of the multiplication table carries the unknown
    /// `result[i] * rhs[0]` as its last term; every other term only
    /// references already-solved lower indices of `result`, so a single
    /// increasing-index pass suffices (power-series division).
    pub fn divide<F: Float>(&self, lhs: &[F], rhs: &[F], result: &mut [F]) {
        result[0] = lhs[0] / rhs[0];
        for i in 1..self.mult_table.len() {
            let row = &self.mult_table[i];
            let mut r = lhs[i];
            for term in &row[..row.len() - 1] {
                r = r - F::from(term.coeff).unwrap() * result[term.lhs] * rhs[term.rhs];
            }
            result[i] = r / (rhs[0] * F::from(row[0].coeff).unwrap());
        }
    }

    /// `result = 1 / operand`, by the same forward substitution as
    /// [`divide`](Self::divide).
    pub fn reciprocal<F: Float>(&self, operand: &[F], result: &mut [F]) {
        result[0] = operand[0].recip();
        for i in 1..self.mult_table.len() {
            let row = &self.mult_table[i];
            let mut r = F::zero();
            for term in &row[..row.len() - 1] {
                r = r - F::from(term.coeff).unwrap() * result[term.lhs] * operand[term.rhs];
            }
            result[i] = r / (operand[0] * F::from(row[0].coeff).unwrap());
        }
    }

    /// `result = lhs - k * rhs` with `k` the quotient of the values
    /// rounded to the nearest integer, so that the value slot holds the
    /// IEEE-style remainder and the derivatives follow linearly.
    pub fn remainder<F: Float>(&self, lhs: &[F], rhs: &[F], result: &mut [F]) {
        let k = (lhs[0] / rhs[0]).round();
        for i in 0..self.size() {
            result[i] = lhs[i] - k * rhs[i];
        }
    }

    /// `result = sqrt(operand)`, solving `result * result = operand` index
    /// by index.
    ///
    /// The first and last terms of row `i` both carry
    /// `result[0] * result[i]`; the remaining terms pair already-solved
    /// lower indices.
    pub fn sqrt<F: Float>(&self, operand: &[F], result: &mut [F]) {
        result[0] = operand[0].sqrt();
        for i in 1..self.mult_table.len() {
            let row = &self.mult_table[i];
            let mut r = operand[i];
            for term in &row[1..row.len() - 1] {
                r = r - F::from(term.coeff).unwrap() * result[term.lhs] * result[term.rhs];
            }
            result[i] = r / (result[0] * F::from(row[0].coeff + row[row.len() - 1].coeff).unwrap());
        }
    }

    /// Compose the operand with a univariate function given by its value
    /// and derivatives `f[0..=order]` at `operand[0]` (Faà-di-Bruno).
    pub fn compose<F: Float>(&self, operand: &[F], f: &[F], result: &mut [F]) {
        for (i, row) in self.comp_table.iter().enumerate() {
            let mut r = F::zero();
            for term in row {
                let mut product = F::from(term.coeff).unwrap() * f[term.f_index];
                for &k in &term.ds_indices {
                    product = product * operand[k];
                }
                r = r + product;
            }
            result[i] = r;
        }
    }

    // ── Elementary functions ──
    // Each builds the univariate Taylor seed [f(x), f'(x), ..., f^(o)(x)]
    // at the operand value with a closed-form recurrence, then composes.

    /// `result = exp(operand)`.
    pub fn exp<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let function = vec![operand[0].exp(); 1 + self.order];
        self.compose(operand, &function, result);
    }

    /// `result = exp(operand) - 1`.
    pub fn exp_m1<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![operand[0].exp(); 1 + self.order];
        function[0] = operand[0].exp_m1();
        self.compose(operand, &function, result);
    }

    /// `result = ln(operand)`.
    pub fn ln<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        function[0] = operand[0].ln();
        let inv = operand[0].recip();
        let mut xk = inv;
        for i in 1..=self.order {
            function[i] = xk;
            xk = -xk * inv * F::from(i).unwrap();
        }
        self.compose(operand, &function, result);
    }

    /// `result = ln(1 + operand)`.
    pub fn ln_1p<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        function[0] = operand[0].ln_1p();
        let inv = (F::one() + operand[0]).recip();
        let mut xk = inv;
        for i in 1..=self.order {
            function[i] = xk;
            xk = -xk * inv * F::from(i).unwrap();
        }
        self.compose(operand, &function, result);
    }

    /// `result = log10(operand)`.
    pub fn log10<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        function[0] = operand[0].log10();
        let inv = operand[0].recip();
        let mut xk = inv / F::from(10).unwrap().ln();
        for i in 1..=self.order {
            function[i] = xk;
            xk = -xk * inv * F::from(i).unwrap();
        }
        self.compose(operand, &function, result);
    }

    /// `result = a ^ operand` for a plain scalar base.
    pub fn pow_scalar<F: Float>(&self, a: F, operand: &[F], result: &mut [F]) {
        // [a^x, ln(a)·a^x, ln(a)²·a^x, ...]
        let mut function = vec![F::zero(); 1 + self.order];
        if a == F::zero() {
            if operand[0] == F::zero() {
                function[0] = F::one();
                let mut infinity = F::infinity();
                for f in function.iter_mut().skip(1) {
                    infinity = -infinity;
                    *f = infinity;
                }
            } else if operand[0] < F::zero() {
                for f in function.iter_mut() {
                    *f = F::nan();
                }
            }
        } else {
            function[0] = a.powf(operand[0]);
            let ln_a = a.ln();
            for i in 1..=self.order {
                function[i] = function[i - 1] * ln_a;
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = operand ^ p` for a real exponent.
    pub fn pow<F: Float>(&self, operand: &[F], p: F, result: &mut [F]) {
        if p == F::zero() {
            // x^0 = 1 for all x
            result[0] = F::one();
            for r in result.iter_mut().take(self.size()).skip(1) {
                *r = F::zero();
            }
            return;
        }

        if operand[0] == F::zero() {
            // 0^p = 0 for all p != 0
            for r in result.iter_mut().take(self.size()) {
                *r = F::zero();
            }
            return;
        }

        // [x^p, p·x^(p-1), p(p-1)·x^(p-2), ...]
        let mut function = vec![F::zero(); 1 + self.order];
        let mut xk = operand[0].powf(p - F::from(self.order).unwrap());
        for i in (1..=self.order).rev() {
            function[i] = xk;
            xk = xk * operand[0];
        }
        function[0] = xk;
        let mut coefficient = p;
        for i in 1..=self.order {
            function[i] = function[i] * coefficient;
            coefficient = coefficient * (p - F::from(i).unwrap());
        }

        self.compose(operand, &function, result);
    }

    /// `result = operand ^ n` for an integer exponent.
    pub fn powi<F: Float>(&self, operand: &[F], n: i32, result: &mut [F]) {
        if n == 0 {
            result[0] = F::one();
            for r in result.iter_mut().take(self.size()).skip(1) {
                *r = F::zero();
            }
            return;
        }

        // [x^n, n·x^(n-1), n(n-1)·x^(n-2), ...]
        let mut function = vec![F::zero(); 1 + self.order];
        if n > 0 {
            let max_order = self.order.min(n as usize);
            let mut xk = operand[0].powi(n - max_order as i32);
            for i in (1..=max_order).rev() {
                function[i] = xk;
                xk = xk * operand[0];
            }
            function[0] = xk;
        } else {
            let inv = operand[0].recip();
            let mut xk = inv.powi(-n);
            for f in function.iter_mut() {
                *f = xk;
                xk = xk * inv;
            }
        }

        let mut coefficient = F::from(n).unwrap();
        for i in 1..=self.order {
            function[i] = function[i] * coefficient;
            coefficient = coefficient * F::from(n - i as i32).unwrap();
        }

        self.compose(operand, &function, result);
    }

    /// `result = x ^ y` for two derivative structures, as `exp(y·ln(x))`.
    pub fn pow_ds<F: Float>(&self, x: &[F], y: &[F], result: &mut [F]) {
        let mut ln_x = vec![F::zero(); self.size()];
        self.ln(x, &mut ln_x);
        let mut y_ln_x = vec![F::zero(); self.size()];
        self.multiply(&ln_x, y, &mut y_ln_x);
        self.exp(&y_ln_x, result);
    }

    /// `result = operand ^ (1/n)`.
    pub fn root_n<F: Float>(&self, operand: &[F], n: i32, result: &mut [F]) {
        // [x^(1/n), (1/n)·x^(1/n - 1), ...]
        let mut function = vec![F::zero(); 1 + self.order];
        let mut xk;
        if n == 2 {
            function[0] = operand[0].sqrt();
            xk = (function[0] + function[0]).recip();
        } else if n == 3 {
            function[0] = operand[0].cbrt();
            xk = (F::from(3).unwrap() * function[0] * function[0]).recip();
        } else {
            function[0] = operand[0].powf(F::from(n).unwrap().recip());
            xk = (F::from(n).unwrap() * function[0].powi(n - 1)).recip();
        }
        let n_reciprocal = F::from(n).unwrap().recip();
        let x_reciprocal = operand[0].recip();
        for i in 1..=self.order {
            function[i] = xk;
            xk = xk * x_reciprocal * (n_reciprocal - F::from(i).unwrap());
        }

        self.compose(operand, &function, result);
    }

    /// `result = cos(operand)`.
    pub fn cos<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let (s, c) = operand[0].sin_cos();
        function[0] = c;
        if self.order > 0 {
            function[1] = -s;
            for i in 2..=self.order {
                function[i] = -function[i - 2];
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = sin(operand)`.
    pub fn sin<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let (s, c) = operand[0].sin_cos();
        function[0] = s;
        if self.order > 0 {
            function[1] = c;
            for i in 2..=self.order {
                function[i] = -function[i - 2];
            }
        }
        self.compose(operand, &function, result);
    }

    /// Combined `(sin, cos)` of the operand, sharing one scalar `sin_cos`.
    pub fn sin_cos<F: Float>(&self, operand: &[F], sin: &mut [F], cos: &mut [F]) {
        let mut function_sin = vec![F::zero(); 1 + self.order];
        let mut function_cos = vec![F::zero(); 1 + self.order];
        let (s, c) = operand[0].sin_cos();
        function_sin[0] = s;
        function_cos[0] = c;
        if self.order > 0 {
            function_sin[1] = c;
            function_cos[1] = -s;
            for i in 2..=self.order {
                function_sin[i] = -function_sin[i - 2];
                function_cos[i] = -function_cos[i - 2];
            }
        }
        self.compose(operand, &function_sin, sin);
        self.compose(operand, &function_cos, cos);
    }

    /// `result = tan(operand)`.
    pub fn tan<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let t = operand[0].tan();
        function[0] = t;

        if self.order > 0 {
            // dⁿtan/dxⁿ = P_n(tan x) with P_n a degree n+1 polynomial of
            // the parity of n+1, P_n(t) = (1+t²) P_{n-1}'(t); parity lets
            // P_{n-1} and P_n share one coefficient array
            let mut p = vec![F::zero(); self.order + 2];
            p[1] = F::one();
            let t2 = t * t;
            for n in 1..=self.order {
                let mut v = F::zero();
                p[n + 1] = p[n] * F::from(n).unwrap();
                let mut k = n + 1;
                loop {
                    v = v * t2 + p[k];
                    if k > 2 {
                        p[k - 2] =
                            p[k - 1] * F::from(k - 1).unwrap() + p[k - 3] * F::from(k - 3).unwrap();
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * t;
                }
                function[n] = v;
            }
        }

        self.compose(operand, &function, result);
    }

    /// `result = acos(operand)`.
    pub fn acos<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let x = operand[0];
        function[0] = x.acos();
        if self.order > 0 {
            // dⁿacos/dxⁿ = P_n(x) / (1-x²)^((2n-1)/2) with P_n of degree
            // n-1 and the parity of n-1, P_1 = -1,
            // P_n(x) = (1-x²) P_{n-1}'(x) + (2n-3) x P_{n-1}(x)
            let mut p = vec![F::zero(); self.order];
            p[0] = -F::one();
            let x2 = x * x;
            let f = (F::one() - x2).recip();
            let mut coeff = f.sqrt();
            function[1] = coeff * p[0];
            for n in 2..=self.order {
                let mut v = F::zero();
                p[n - 1] = p[n - 2] * F::from(n - 1).unwrap();
                let mut k = n - 1;
                loop {
                    v = v * x2 + p[k];
                    if k > 2 {
                        p[k - 2] = p[k - 1] * F::from(k - 1).unwrap()
                            + p[k - 3] * F::from(2 * n - k).unwrap();
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * x;
                }
                coeff = coeff * f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = asin(operand)`.
    pub fn asin<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let x = operand[0];
        function[0] = x.asin();
        if self.order > 0 {
            // same polynomial recurrence as acos with P_1 = 1
            let mut p = vec![F::zero(); self.order];
            p[0] = F::one();
            let x2 = x * x;
            let f = (F::one() - x2).recip();
            let mut coeff = f.sqrt();
            function[1] = coeff * p[0];
            for n in 2..=self.order {
                let mut v = F::zero();
                p[n - 1] = p[n - 2] * F::from(n - 1).unwrap();
                let mut k = n - 1;
                loop {
                    v = v * x2 + p[k];
                    if k > 2 {
                        p[k - 2] = p[k - 1] * F::from(k - 1).unwrap()
                            + p[k - 3] * F::from(2 * n - k).unwrap();
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * x;
                }
                coeff = coeff * f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = atan(operand)`.
    pub fn atan<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let x = operand[0];
        function[0] = x.atan();
        if self.order > 0 {
            // dⁿatan/dxⁿ = Q_n(x) / (1+x²)ⁿ with Q_n of degree n-1 and the
            // parity of n-1, Q_1 = 1,
            // Q_n(x) = (1+x²) Q_{n-1}'(x) - 2(n-1) x Q_{n-1}(x)
            let mut q = vec![F::zero(); self.order];
            q[0] = F::one();
            let x2 = x * x;
            let f = (F::one() + x2).recip();
            let mut coeff = f;
            function[1] = coeff * q[0];
            for n in 2..=self.order {
                let mut v = F::zero();
                q[n - 1] = -(q[n - 2] * F::from(n).unwrap());
                let mut k = n - 1;
                loop {
                    v = v * x2 + q[k];
                    if k > 2 {
                        q[k - 2] = q[k - 1] * F::from(k - 1).unwrap()
                            + q[k - 3] * F::from(k as i64 - 1 - 2 * n as i64).unwrap();
                    } else if k == 2 {
                        q[0] = q[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * x;
                }
                coeff = coeff * f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = atan2(y, x)` with full quadrant handling.
    ///
    /// Uses the half-angle identity `atan2(y, x) = 2·atan(y / (r ± x))`
    /// with `r = sqrt(x² + y²)`, then overwrites the value slot with the
    /// exact scalar `atan2` so the signed-zero and infinity special cases
    /// come out right.
    pub fn atan2<F: Float>(&self, y: &[F], x: &[F], result: &mut [F]) {
        let n = self.size();
        let mut tmp1 = vec![F::zero(); n];
        let mut tmp2 = vec![F::zero(); n];

        // r = sqrt(x² + y²)
        self.multiply(x, x, &mut tmp1);
        self.multiply(y, y, &mut tmp2);
        for i in 0..n {
            tmp2[i] = tmp1[i] + tmp2[i];
        }
        self.root_n(&tmp2, 2, &mut tmp1);

        if x[0] >= F::zero() {
            // atan2(y, x) = 2 atan(y / (r + x))
            for i in 0..n {
                tmp2[i] = tmp1[i] + x[i];
            }
            self.divide(y, &tmp2, &mut tmp1);
            self.atan(&tmp1, &mut tmp2);
            for i in 0..n {
                result[i] = tmp2[i] + tmp2[i];
            }
        } else {
            // atan2(y, x) = ±π - 2 atan(y / (r - x))
            for i in 0..n {
                tmp2[i] = tmp1[i] - x[i];
            }
            self.divide(y, &tmp2, &mut tmp1);
            self.atan(&tmp1, &mut tmp2);
            let half_turn = if tmp2[0] <= F::zero() { -F::PI() } else { F::PI() };
            result[0] = half_turn - (tmp2[0] + tmp2[0]);
            for i in 1..n {
                result[i] = -(tmp2[i] + tmp2[i]);
            }
        }

        result[0] = y[0].atan2(x[0]);
    }

    /// `result = cosh(operand)`.
    pub fn cosh<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        function[0] = operand[0].cosh();
        if self.order > 0 {
            function[1] = operand[0].sinh();
            for i in 2..=self.order {
                function[i] = function[i - 2];
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = sinh(operand)`.
    pub fn sinh<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        function[0] = operand[0].sinh();
        if self.order > 0 {
            function[1] = operand[0].cosh();
            for i in 2..=self.order {
                function[i] = function[i - 2];
            }
        }
        self.compose(operand, &function, result);
    }

    /// Combined `(sinh, cosh)` of the operand.
    pub fn sinh_cosh<F: Float>(&self, operand: &[F], sinh: &mut [F], cosh: &mut [F]) {
        let mut function_sinh = vec![F::zero(); 1 + self.order];
        let mut function_cosh = vec![F::zero(); 1 + self.order];
        function_sinh[0] = operand[0].sinh();
        function_cosh[0] = operand[0].cosh();
        for i in 1..=self.order {
            function_sinh[i] = function_cosh[i - 1];
            function_cosh[i] = function_sinh[i - 1];
        }
        self.compose(operand, &function_sinh, sinh);
        self.compose(operand, &function_cosh, cosh);
    }

    /// `result = tanh(operand)`.
    pub fn tanh<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let t = operand[0].tanh();
        function[0] = t;

        if self.order > 0 {
            // dⁿtanh/dxⁿ = P_n(tanh x), P_n(t) = (1-t²) P_{n-1}'(t)
            let mut p = vec![F::zero(); self.order + 2];
            p[1] = F::one();
            let t2 = t * t;
            for n in 1..=self.order {
                let mut v = F::zero();
                p[n + 1] = -(p[n] * F::from(n).unwrap());
                let mut k = n + 1;
                loop {
                    v = v * t2 + p[k];
                    if k > 2 {
                        p[k - 2] =
                            p[k - 1] * F::from(k - 1).unwrap() - p[k - 3] * F::from(k - 3).unwrap();
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * t;
                }
                function[n] = v;
            }
        }

        self.compose(operand, &function, result);
    }

    /// `result = acosh(operand)`.
    pub fn acosh<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let x = operand[0];
        function[0] = x.acosh();
        if self.order > 0 {
            // dⁿacosh/dxⁿ = P_n(x) / (x²-1)^((2n-1)/2), P_1 = 1,
            // P_n(x) = (x²-1) P_{n-1}'(x) - (2n-3) x P_{n-1}(x)
            let mut p = vec![F::zero(); self.order];
            p[0] = F::one();
            let x2 = x * x;
            let f = (x2 - F::one()).recip();
            let mut coeff = f.sqrt();
            function[1] = coeff * p[0];
            for n in 2..=self.order {
                let mut v = F::zero();
                p[n - 1] = p[n - 2] * F::from(1 - n as i64).unwrap();
                let mut k = n - 1;
                loop {
                    v = v * x2 + p[k];
                    if k > 2 {
                        p[k - 2] = p[k - 1] * F::from(1 - k as i64).unwrap()
                            + p[k - 3] * F::from(k as i64 - 2 * n as i64).unwrap();
                    } else if k == 2 {
                        p[0] = -p[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * x;
                }
                coeff = coeff * f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = asinh(operand)`.
    pub fn asinh<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let x = operand[0];
        function[0] = x.asinh();
        if self.order > 0 {
            // dⁿasinh/dxⁿ = P_n(x) / (x²+1)^((2n-1)/2), P_1 = 1,
            // P_n(x) = (x²+1) P_{n-1}'(x) - (2n-3) x P_{n-1}(x)
            let mut p = vec![F::zero(); self.order];
            p[0] = F::one();
            let x2 = x * x;
            let f = (F::one() + x2).recip();
            let mut coeff = f.sqrt();
            function[1] = coeff * p[0];
            for n in 2..=self.order {
                let mut v = F::zero();
                p[n - 1] = p[n - 2] * F::from(1 - n as i64).unwrap();
                let mut k = n - 1;
                loop {
                    v = v * x2 + p[k];
                    if k > 2 {
                        p[k - 2] = p[k - 1] * F::from(k - 1).unwrap()
                            + p[k - 3] * F::from(k as i64 - 2 * n as i64).unwrap();
                    } else if k == 2 {
                        p[0] = p[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * x;
                }
                coeff = coeff * f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// `result = atanh(operand)`.
    pub fn atanh<F: Float>(&self, operand: &[F], result: &mut [F]) {
        let mut function = vec![F::zero(); 1 + self.order];
        let x = operand[0];
        function[0] = x.atanh();
        if self.order > 0 {
            // dⁿatanh/dxⁿ = Q_n(x) / (1-x²)ⁿ, Q_1 = 1,
            // Q_n(x) = (1-x²) Q_{n-1}'(x) + 2(n-1) x Q_{n-1}(x)
            let mut q = vec![F::zero(); self.order];
            q[0] = F::one();
            let x2 = x * x;
            let f = (F::one() - x2).recip();
            let mut coeff = f;
            function[1] = coeff * q[0];
            for n in 2..=self.order {
                let mut v = F::zero();
                q[n - 1] = q[n - 2] * F::from(n).unwrap();
                let mut k = n - 1;
                loop {
                    v = v * x2 + q[k];
                    if k > 2 {
                        q[k - 2] = q[k - 1] * F::from(k - 1).unwrap()
                            + q[k - 3] * F::from(2 * n as i64 - k as i64 + 1).unwrap();
                    } else if k == 2 {
                        q[0] = q[1];
                    }
                    if k < 2 {
                        break;
                    }
                    k -= 2;
                }
                if n % 2 == 0 {
                    v = v * x;
                }
                coeff = coeff * f;
                function[n] = coeff * v;
            }
        }
        self.compose(operand, &function, result);
    }

    /// Evaluate the multivariate Taylor expansion of a structure at some
    /// parameter offset: `Σᵢ ds[i] · Π_k Δ_k^{o_k} / o_k!`.
    pub fn taylor<F: Float>(&self, ds: &[F], delta: &[F]) -> Result<F, DsError> {
        if delta.len() != self.parameters {
            return Err(DsError::DimensionMismatch {
                expected: self.parameters,
                actual: delta.len(),
            });
        }
        let mut value = F::zero();
        for i in (0..self.size()).rev() {
            let mut term = ds[i];
            for (k, &o) in self.derivative_orders[i].iter().enumerate() {
                if o > 0 {
                    term = term * delta[k].powi(o as i32)
                        / F::from(factorial(o)?).unwrap();
                }
            }
            value = value + term;
        }
        Ok(value)
    }

    /// Re-express a derivative structure's derivatives with respect to the
    /// lower-level parameters of `base_compiler` (multivariate chain rule).
    ///
    /// `p` packs the intermediate variables' own derivative structures
    /// over the base parameters, one `base_compiler.size()` block per
    /// intermediate variable (one block per free parameter of this
    /// compiler). `result` has `base_compiler.size()` entries. The base
    /// compiler must share this compiler's derivation order.
    pub fn rebase<F: Float>(
        &self,
        ds: &[F],
        base_compiler: &DsCompiler,
        p: &[F],
        result: &mut [F],
    ) {
        let rebaser = self.rebaser(base_compiler);
        for (i, row) in rebaser.iter().enumerate() {
            let mut r = F::zero();
            for term in row {
                let mut product = F::from(term.coeff).unwrap() * ds[term.ds_index];
                for &k in &term.product_indices {
                    product = product * p[k];
                }
                r = r + product;
            }
            result[i] = r;
        }
    }
}
