use approx::assert_relative_eq;
use multidiff::{DerivativeStructure, DsError, DsFactory, TaylorMap};

fn assert_all_close(a: &DerivativeStructure<f64>, b: &DerivativeStructure<f64>, epsilon: f64) {
    for (x, y) in a.all_derivatives().iter().zip(b.all_derivatives()) {
        assert_relative_eq!(*x, *y, epsilon = epsilon, max_relative = epsilon);
    }
}

// ══════════════════════════════════════════════
//  1. Construction and evaluation
// ══════════════════════════════════════════════

#[test]
fn map_value_is_the_taylor_expansion_of_each_function() {
    let factory = DsFactory::<f64>::new(2, 3);
    let x = factory.variable(0, 1.0).unwrap();
    let y = factory.variable(1, -2.0).unwrap();
    let f0 = x.multiply(&y).unwrap();
    let f1 = x.exp();
    let map = TaylorMap::new(vec![1.0, -2.0], vec![f0.clone(), f1.clone()]).unwrap();

    assert_eq!(map.n_parameters(), 2);
    assert_eq!(map.n_functions(), 2);
    for (dx, dy) in [(0.0, 0.0), (0.1, -0.05), (-0.2, 0.3)] {
        let value = map.value(&[dx, dy]).unwrap();
        assert_eq!(value[0], f0.taylor(&[dx, dy]).unwrap());
        assert_eq!(value[1], f1.taylor(&[dx, dy]).unwrap());
    }
}

#[test]
fn constituents_must_share_one_compiler() {
    let f2 = DsFactory::<f64>::new(2, 2).constant(1.0);
    let f3 = DsFactory::<f64>::new(2, 3).constant(1.0);
    assert!(TaylorMap::new(vec![0.0, 0.0], vec![f2.clone(), f3]).is_err());
    assert!(TaylorMap::new(vec![0.0], vec![f2.clone()]).is_err());
    assert!(TaylorMap::<f64>::new(vec![0.0, 0.0], vec![]).is_err());
    assert!(TaylorMap::new(vec![0.0, 0.0], vec![f2.clone(), f2]).is_ok());
}

#[test]
fn identity_map_reproduces_offsets() {
    let id = TaylorMap::<f64>::identity(3, 2).unwrap();
    let value = id.value(&[0.25, -1.5, 2.0]).unwrap();
    assert_eq!(value, vec![0.25, -1.5, 2.0]);
}

// ══════════════════════════════════════════════
//  2. Composition
// ══════════════════════════════════════════════

#[test]
fn composition_matches_direct_evaluation() {
    // inner map: p(q) = (q0 + q1, q0 q1), outer: f(p) = (sin p0, p0 p1)
    let factory = DsFactory::<f64>::new(2, 3);
    let q0 = factory.variable(0, 0.5).unwrap();
    let q1 = factory.variable(1, 1.5).unwrap();
    let p0 = q0.add(&q1).unwrap();
    let p1 = q0.multiply(&q1).unwrap();
    let inner = TaylorMap::new(vec![0.5, 1.5], vec![p0.clone(), p1.clone()]).unwrap();

    let f_factory = DsFactory::<f64>::new(2, 3);
    let u = f_factory.variable(0, p0.value()).unwrap();
    let v = f_factory.variable(1, p1.value()).unwrap();
    let outer = TaylorMap::new(
        vec![p0.value(), p1.value()],
        vec![u.sin(), u.multiply(&v).unwrap()],
    )
    .unwrap();

    let composed = outer.compose(&inner).unwrap();

    // direct construction of f(p(q)) from the q variables
    let direct0 = p0.sin();
    let direct1 = p0.multiply(&p1).unwrap();
    assert_all_close(composed.function(0), &direct0, 1.0e-12);
    assert_all_close(composed.function(1), &direct1, 1.0e-12);
    assert_eq!(composed.point(), inner.point());
}

#[test]
fn composition_is_associative() {
    let factory = DsFactory::<f64>::new(2, 3);

    // H: base variables
    let q0 = factory.variable(0, 0.4).unwrap();
    let q1 = factory.variable(1, -0.3).unwrap();
    let h = TaylorMap::new(
        vec![0.4, -0.3],
        vec![q0.exp(), q0.add(&q1).unwrap()],
    )
    .unwrap();

    // G over H's outputs
    let g_factory = DsFactory::<f64>::new(2, 3);
    let g0 = g_factory.variable(0, h.function(0).value()).unwrap();
    let g1 = g_factory.variable(1, h.function(1).value()).unwrap();
    let g = TaylorMap::new(
        vec![h.function(0).value(), h.function(1).value()],
        vec![g0.multiply(&g1).unwrap(), g1.sin()],
    )
    .unwrap();

    // F over G's outputs
    let f_factory = DsFactory::<f64>::new(2, 3);
    let f0 = f_factory.variable(0, g.function(0).value()).unwrap();
    let f1 = f_factory.variable(1, g.function(1).value()).unwrap();
    let f = TaylorMap::new(
        vec![g.function(0).value(), g.function(1).value()],
        vec![f0.add(&f1).unwrap(), f0.multiply(&f1).unwrap()],
    )
    .unwrap();

    let left = f.compose(&g).unwrap().compose(&h).unwrap();
    let right = f.compose(&g.compose(&h).unwrap()).unwrap();
    for i in 0..2 {
        assert_all_close(left.function(i), right.function(i), 1.0e-11);
    }
}

#[test]
fn composition_requires_matching_dimensions() {
    let two = TaylorMap::<f64>::identity(2, 2).unwrap();
    let three = TaylorMap::<f64>::identity(3, 2).unwrap();
    assert!(two.compose(&three).is_err());
}

// ══════════════════════════════════════════════
//  3. Inversion
// ══════════════════════════════════════════════

#[test]
fn inverse_of_exp_is_log() {
    let factory = DsFactory::<f64>::new(1, 6);
    for x in [0.1, 0.5, 1.0, 2.0, 2.9] {
        let x_ds = factory.variable(0, x).unwrap();
        let exp_map = TaylorMap::new(vec![x], vec![x_ds.exp()]).unwrap();
        let inverse = exp_map.invert().unwrap();
        let log = factory
            .variable(0, exp_map.function(0).value())
            .unwrap()
            .ln();
        assert_all_close(inverse.function(0), &log, 1.0e-9);
        assert_eq!(inverse.point(), &[x.exp()]);
    }
}

#[test]
fn cartesian_to_polar_inverts_polar_to_cartesian() {
    let factory = DsFactory::<f64>::new(2, 4);
    for (x, y) in [(1.0, 0.5), (-0.8, 1.3), (0.7, -1.1)] {
        let x_ds = factory.variable(0, x).unwrap();
        let y_ds = factory.variable(1, y).unwrap();
        let polar_map = TaylorMap::new(
            vec![x, y],
            vec![x_ds.hypot(&y_ds).unwrap(), y_ds.atan2(&x_ds).unwrap()],
        )
        .unwrap();
        let cartesian_map = polar_map.invert().unwrap();
        let round_trip = cartesian_map.compose(&polar_map).unwrap();
        assert_all_close(round_trip.function(0), &x_ds, 1.0e-8);
        assert_all_close(round_trip.function(1), &y_ds, 1.0e-8);
    }
}

#[test]
fn inversion_recovers_offsets() {
    // F(q) and its inverse: feeding the inverse the evaluation offsets
    // df = F(p + Δp) - F(p) must recover p + Δp to O(Δp^(order+1))
    let factory = DsFactory::<f64>::new(2, 4);
    let (p0, p1) = (0.6, -0.4);
    let x = factory.variable(0, p0).unwrap();
    let y = factory.variable(1, p1).unwrap();
    let f = TaylorMap::new(
        vec![p0, p1],
        vec![
            x.exp().multiply(&y.cos()).unwrap(),
            x.add(&y.sin()).unwrap(),
        ],
    )
    .unwrap();
    let inverse = f.invert().unwrap();

    let delta = [1.0e-3, -1.5e-3];
    let moved = f.value(&delta).unwrap();
    let df = [moved[0] - f.function(0).value(), moved[1] - f.function(1).value()];
    let recovered = inverse.value(&df).unwrap();
    assert_relative_eq!(recovered[0], p0 + delta[0], epsilon = 1.0e-9);
    assert_relative_eq!(recovered[1], p1 + delta[1], epsilon = 1.0e-9);
}

#[test]
fn non_square_maps_cannot_be_inverted() {
    let factory = DsFactory::<f64>::new(2, 2);
    let x = factory.variable(0, 1.0).unwrap();
    let y = factory.variable(1, -3.0).unwrap();
    let map = TaylorMap::new(
        vec![1.0, -3.0],
        vec![x.clone(), y.clone(), x.add(&y).unwrap()],
    )
    .unwrap();
    assert_eq!(
        map.invert().unwrap_err(),
        DsError::DimensionMismatch { expected: 2, actual: 3 }
    );
}

#[test]
fn singular_linear_parts_are_reported() {
    let factory = DsFactory::<f64>::new(2, 2);
    let x = factory.variable(0, 1.0).unwrap();
    let y = factory.variable(1, 2.0).unwrap();
    let sum = x.add(&y).unwrap();
    // both functions share the same linear part: the Jacobian is singular
    let map = TaylorMap::new(vec![1.0, 2.0], vec![sum.clone(), sum]).unwrap();
    assert_eq!(map.invert().unwrap_err(), DsError::SingularMatrix);
}
