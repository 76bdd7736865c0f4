use approx::assert_relative_eq;
use multidiff::{DsError, DsFactory};

// ══════════════════════════════════════════════
//  1. Worked example: f(x, y) = x²y + sin(x)
// ══════════════════════════════════════════════

#[test]
fn polynomial_plus_sine_at_origin() {
    let factory = DsFactory::<f64>::new(2, 2);
    let x = factory.variable(0, 0.0).unwrap();
    let y = factory.variable(1, 1.0).unwrap();
    let f = &(&(&x * &x) * &y) + &x.sin();

    assert_relative_eq!(f.value(), 0.0, epsilon = 1.0e-15);
    // df/dx = 2xy + cos(x) = 1
    assert_relative_eq!(f.partial_derivative(&[1, 0]).unwrap(), 1.0, epsilon = 1.0e-15);
    // df/dy = x² = 0
    assert_relative_eq!(f.partial_derivative(&[0, 1]).unwrap(), 0.0, epsilon = 1.0e-15);
    // d²f/dx² = 2y - sin(x) = 2
    assert_relative_eq!(f.partial_derivative(&[2, 0]).unwrap(), 2.0, epsilon = 1.0e-15);
    // d²f/dxdy = 2x = 0
    assert_relative_eq!(f.partial_derivative(&[1, 1]).unwrap(), 0.0, epsilon = 1.0e-15);
    // d²f/dy² = 0
    assert_relative_eq!(f.partial_derivative(&[0, 2]).unwrap(), 0.0, epsilon = 1.0e-15);
}

#[test]
fn polynomial_plus_sine_away_from_origin() {
    let factory = DsFactory::<f64>::new(2, 2);
    let (x0, y0) = (0.7, -1.3);
    let x = factory.variable(0, x0).unwrap();
    let y = factory.variable(1, y0).unwrap();
    let f = &(&(&x * &x) * &y) + &x.sin();

    assert_relative_eq!(f.value(), x0 * x0 * y0 + x0.sin(), epsilon = 1.0e-14);
    assert_relative_eq!(
        f.partial_derivative(&[1, 0]).unwrap(),
        2.0 * x0 * y0 + x0.cos(),
        epsilon = 1.0e-14
    );
    assert_relative_eq!(f.partial_derivative(&[0, 1]).unwrap(), x0 * x0, epsilon = 1.0e-14);
    assert_relative_eq!(
        f.partial_derivative(&[2, 0]).unwrap(),
        2.0 * y0 - x0.sin(),
        epsilon = 1.0e-14
    );
    assert_relative_eq!(f.partial_derivative(&[1, 1]).unwrap(), 2.0 * x0, epsilon = 1.0e-14);
}

// ══════════════════════════════════════════════
//  2. Factory and container semantics
// ══════════════════════════════════════════════

#[test]
fn constants_have_zero_derivatives() {
    let factory = DsFactory::<f64>::new(3, 2);
    let c = factory.constant(4.25);
    assert_eq!(c.value(), 4.25);
    assert!(c.all_derivatives()[1..].iter().all(|&d| d == 0.0));
    assert_eq!(c.free_parameters(), 3);
    assert_eq!(c.order(), 2);
}

#[test]
fn variables_carry_a_unit_first_derivative() {
    let factory = DsFactory::<f64>::new(3, 2);
    for index in 0..3 {
        let v = factory.variable(index, 1.5).unwrap();
        let mut orders = vec![0; 3];
        orders[index] = 1;
        assert_eq!(v.partial_derivative(&orders).unwrap(), 1.0);
        assert_eq!(
            v.all_derivatives().iter().filter(|&&d| d != 0.0).count(),
            2,
            "value and one first derivative"
        );
    }
    assert_eq!(
        factory.variable(3, 0.0).unwrap_err(),
        DsError::IndexOutOfRange { index: 3, limit: 3 }
    );
}

#[test]
fn build_rejects_wrong_array_length() {
    let factory = DsFactory::<f64>::new(2, 2);
    assert_eq!(
        factory.build(&[1.0, 2.0]).unwrap_err(),
        DsError::DimensionMismatch { expected: 6, actual: 2 }
    );
}

#[test]
fn operations_leave_operands_untouched() {
    let factory = DsFactory::<f64>::new(2, 2);
    let x = factory.variable(0, 2.0).unwrap();
    let before = x.all_derivatives().to_vec();
    let _ = x.sin();
    let _ = &x * &x;
    let _ = x.reciprocal();
    assert_eq!(x.all_derivatives(), &before[..]);
}

#[test]
fn mixed_shape_operations_fail() {
    let a = DsFactory::<f64>::new(2, 2).constant(1.0);
    let b = DsFactory::<f64>::new(3, 2).constant(1.0);
    assert_eq!(
        a.add(&b).unwrap_err(),
        DsError::DimensionMismatch { expected: 2, actual: 3 }
    );
}

#[test]
fn compose_checks_the_coefficient_count() {
    let factory = DsFactory::<f64>::new(2, 3);
    let ds = factory.variable(0, 1.0).unwrap();
    assert_eq!(
        ds.compose(&[1.0, 2.0]).unwrap_err(),
        DsError::DimensionMismatch { expected: 4, actual: 2 }
    );
    // identity composition: f(u) = u at the operand value
    let id = ds.compose(&[1.0, 1.0, 0.0, 0.0]).unwrap();
    assert_eq!(id.all_derivatives(), ds.all_derivatives());
}

// ══════════════════════════════════════════════
//  3. Taylor evaluation
// ══════════════════════════════════════════════

#[test]
fn taylor_at_zero_offset_is_the_value() {
    let factory = DsFactory::<f64>::new(3, 3);
    let x = factory.variable(0, 1.2).unwrap();
    let y = factory.variable(1, -0.4).unwrap();
    let z = factory.variable(2, 2.0).unwrap();
    let f = (&(&x * &y) + &z.sin()).exp();
    assert_eq!(f.taylor(&[0.0, 0.0, 0.0]).unwrap(), f.value());
}

#[test]
fn taylor_is_exact_on_polynomials() {
    // x²y is fully captured at order 3
    let factory = DsFactory::<f64>::new(2, 3);
    let x = factory.variable(0, 1.0).unwrap();
    let y = factory.variable(1, 2.0).unwrap();
    let f = &(&x * &x) * &y;
    for (dx, dy) in [(0.5, -0.25), (-1.0, 3.0), (2.0, 1.0)] {
        let expected = (1.0 + dx) * (1.0 + dx) * (2.0 + dy);
        assert_relative_eq!(f.taylor(&[dx, dy]).unwrap(), expected, epsilon = 1.0e-12);
    }
}

#[test]
fn taylor_approximates_the_function_to_high_order() {
    // g(x, y) = exp(x) sin(y), expanded at (0.5, 1.2) to order 4:
    // the truncation error at offset h scales as h^5
    let factory = DsFactory::<f64>::new(2, 4);
    let x = factory.variable(0, 0.5).unwrap();
    let y = factory.variable(1, 1.2).unwrap();
    let g = x.exp().multiply(&y.sin()).unwrap();
    for h in [1.0e-1_f64, 1.0e-2] {
        let exact = (0.5 + h).exp() * (1.2 + h).sin();
        let approximated = g.taylor(&[h, h]).unwrap();
        assert!(
            (exact - approximated).abs() < 60.0 * h.powi(5),
            "h = {h}: error {}",
            (exact - approximated).abs()
        );
    }
}

#[test]
fn taylor_rejects_wrong_offset_count() {
    let factory = DsFactory::<f64>::new(2, 2);
    let f = factory.constant(1.0);
    assert_eq!(
        f.taylor(&[0.1]).unwrap_err(),
        DsError::DimensionMismatch { expected: 2, actual: 1 }
    );
}

#[test]
fn taylor_overflows_on_huge_factorials() {
    // order 21 requires 21! which no longer fits an u64
    let factory = DsFactory::<f64>::new(1, 21);
    let x = factory.variable(0, 1.0).unwrap();
    assert_eq!(
        x.taylor(&[0.5]).unwrap_err(),
        DsError::ArithmeticOverflow { argument: 21 }
    );
}

// ══════════════════════════════════════════════
//  4. Value-only operations
// ══════════════════════════════════════════════

#[test]
fn abs_follows_the_value_sign() {
    let factory = DsFactory::<f64>::new(1, 1);
    let negative = factory.variable(0, -3.0).unwrap();
    let a = negative.abs();
    assert_eq!(a.value(), 3.0);
    assert_eq!(a.partial_derivative(&[1]).unwrap(), -1.0);
    let positive = factory.variable(0, 3.0).unwrap();
    assert_eq!(positive.abs().partial_derivative(&[1]).unwrap(), 1.0);
}

#[test]
fn discontinuous_functions_freeze_derivatives() {
    let factory = DsFactory::<f64>::new(1, 2);
    let x = factory.variable(0, 2.7).unwrap();
    for ds in [x.floor(), x.ceil(), x.signum()] {
        assert!(ds.all_derivatives()[1..].iter().all(|&d| d == 0.0));
    }
    assert_eq!(x.floor().value(), 2.0);
    assert_eq!(x.ceil().value(), 3.0);
    assert_eq!(x.signum().value(), 1.0);
}

#[test]
fn min_max_select_by_value() {
    let factory = DsFactory::<f64>::new(1, 1);
    let a = factory.variable(0, 1.0).unwrap();
    let b = factory.constant(2.0);
    assert_eq!(a.min(&b).value(), 1.0);
    assert_eq!(a.max(&b).value(), 2.0);
    assert_eq!(a.min(&b).partial_derivative(&[1]).unwrap(), 1.0);
    assert_eq!(a.max(&b).partial_derivative(&[1]).unwrap(), 0.0);
}

#[test]
fn angle_unit_conversions_scale_linearly() {
    let factory = DsFactory::<f64>::new(1, 1);
    let x = factory.variable(0, std::f64::consts::PI).unwrap();
    let degrees = x.to_degrees();
    assert_relative_eq!(degrees.value(), 180.0, epsilon = 1.0e-12);
    assert_relative_eq!(
        degrees.partial_derivative(&[1]).unwrap(),
        180.0 / std::f64::consts::PI,
        epsilon = 1.0e-12
    );
    let back = degrees.to_radians();
    assert_relative_eq!(back.value(), std::f64::consts::PI, epsilon = 1.0e-12);
}
