use approx::assert_relative_eq;
use multidiff::{DsError, DsFactory, Gradient};

type Gradient2 = Gradient<f64, 2>;

// ══════════════════════════════════════════════
//  1. First-order rules
// ══════════════════════════════════════════════

#[test]
fn variables_and_constants() {
    let x = Gradient2::variable(0, 3.0);
    let c = Gradient2::constant(5.0);
    assert_eq!(x.value(), 3.0);
    assert_eq!(x.gradient, [1.0, 0.0]);
    assert_eq!(c.gradient, [0.0, 0.0]);
}

#[test]
fn product_and_quotient_rules() {
    let x = Gradient2::variable(0, 3.0);
    let y = Gradient2::variable(1, -2.0);

    let p = x * y;
    assert_eq!(p.value(), -6.0);
    assert_eq!(p.gradient, [-2.0, 3.0]);

    let q = x / y;
    assert_eq!(q.value(), -1.5);
    // d(x/y)/dx = 1/y, d(x/y)/dy = -x/y²
    assert_relative_eq!(q.gradient[0], -0.5, epsilon = 1.0e-15);
    assert_relative_eq!(q.gradient[1], -0.75, epsilon = 1.0e-15);
}

#[test]
fn chain_rule_through_elementary_functions() {
    let x = Gradient2::variable(0, 0.3);
    let y = Gradient2::variable(1, 1.7);
    // f = exp(x) * ln(y) + sin(x y)
    let f = x.exp() * y.ln() + (x * y).sin();

    let (x0, y0) = (0.3_f64, 1.7_f64);
    assert_relative_eq!(f.value(), x0.exp() * y0.ln() + (x0 * y0).sin(), epsilon = 1.0e-14);
    assert_relative_eq!(
        f.gradient[0],
        x0.exp() * y0.ln() + y0 * (x0 * y0).cos(),
        epsilon = 1.0e-14
    );
    assert_relative_eq!(
        f.gradient[1],
        x0.exp() / y0 + x0 * (x0 * y0).cos(),
        epsilon = 1.0e-14
    );
}

#[test]
fn taylor_expansion_is_linear() {
    let x = Gradient2::variable(0, 1.0);
    let y = Gradient2::variable(1, 2.0);
    let f = x * y;
    assert_relative_eq!(f.taylor(&[0.1, -0.2]).unwrap(), 2.0 + 0.2 - 0.2, epsilon = 1.0e-15);
}

// ══════════════════════════════════════════════
//  2. Contract shared with order-1 structures
// ══════════════════════════════════════════════

#[test]
fn gradient_matches_order_one_derivative_structure() {
    let factory = DsFactory::<f64>::new(2, 1);
    let xs = factory.variable(0, 0.8).unwrap();
    let ys = factory.variable(1, -1.1).unwrap();
    let xg = Gradient2::variable(0, 0.8);
    let yg = Gradient2::variable(1, -1.1);

    // the same expression through both implementations
    let fs = xs.sin().multiply(&ys.exp()).unwrap().add(&xs.atan2(&ys).unwrap()).unwrap();
    let fg = xg.sin() * yg.exp() + xg.atan2(yg);

    assert_relative_eq!(fg.value(), fs.value(), epsilon = 1.0e-13);
    assert_relative_eq!(
        fg.partial_derivative(&[1, 0]).unwrap(),
        fs.partial_derivative(&[1, 0]).unwrap(),
        epsilon = 1.0e-13
    );
    assert_relative_eq!(
        fg.partial_derivative(&[0, 1]).unwrap(),
        fs.partial_derivative(&[0, 1]).unwrap(),
        epsilon = 1.0e-13
    );
}

#[test]
fn conversions_round_trip() {
    let g = Gradient2::new(2.5, [1.0, -3.0]);
    let ds = g.to_derivative_structure().unwrap();
    assert_eq!(ds.value(), 2.5);
    assert_eq!(ds.partial_derivative(&[1, 0]).unwrap(), 1.0);
    assert_eq!(ds.partial_derivative(&[0, 1]).unwrap(), -3.0);
    let back = Gradient2::from_derivative_structure(&ds).unwrap();
    assert_eq!(back.value(), g.value());
    assert_eq!(back.gradient, g.gradient);
}

#[test]
fn narrowing_rejects_higher_orders() {
    let factory = DsFactory::<f64>::new(2, 2);
    let ds = factory.variable(0, 1.0).unwrap();
    assert_eq!(
        Gradient2::from_derivative_structure(&ds).unwrap_err(),
        DsError::DimensionMismatch { expected: 1, actual: 2 }
    );
}

// ══════════════════════════════════════════════
//  3. First-order-only limits
// ══════════════════════════════════════════════

#[test]
fn order_two_requests_are_out_of_range() {
    let g = Gradient2::variable(0, 1.0);
    assert_eq!(g.partial_derivative(&[0, 0]).unwrap(), 1.0);
    assert_eq!(g.partial_derivative(&[1, 0]).unwrap(), 1.0);
    assert_eq!(g.partial_derivative(&[0, 1]).unwrap(), 0.0);
    assert_eq!(
        g.partial_derivative(&[2, 0]).unwrap_err(),
        DsError::IndexOutOfRange { index: 2, limit: 2 }
    );
    assert_eq!(
        g.partial_derivative(&[1, 1]).unwrap_err(),
        DsError::IndexOutOfRange { index: 2, limit: 2 }
    );
    assert_eq!(
        g.partial_derivative(&[1]).unwrap_err(),
        DsError::DimensionMismatch { expected: 2, actual: 1 }
    );
}

// ══════════════════════════════════════════════
//  4. Operators
// ══════════════════════════════════════════════

#[test]
fn scalar_operators() {
    let x = Gradient::<f64, 1>::variable(0, 2.0);
    let a = 3.0 * x + 1.0;
    assert_eq!(a.value(), 7.0);
    assert_eq!(a.gradient, [3.0]);

    let b = 1.0 / x;
    assert_eq!(b.value(), 0.5);
    assert_eq!(b.gradient, [-0.25]);

    let mut c = x;
    c += x;
    assert_eq!(c.value(), 4.0);
    assert_eq!(c.gradient, [2.0]);
}

#[test]
fn remainder_follows_the_rounded_quotient() {
    let x = Gradient::<f64, 1>::variable(0, 7.25);
    let r = x % Gradient::constant(2.0);
    assert_relative_eq!(r.value(), -0.75, epsilon = 1.0e-15);
    assert_eq!(r.gradient, [1.0]);
}
