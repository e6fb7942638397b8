use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use subspace_eig::{
    backend::NativeBackend, block_subspace, eigh::generalized_eigh, norm::m_orthogonality_defect,
    ConfigError, EigError, Eigenpairs, Operator, Order, Pencil, SubspaceConfig,
};

mod common;

fn check_pairs(
    k: &Array2<f64>,
    m: &Array2<f64>,
    vals: &Array1<f64>,
    vecs: &Array2<f64>,
    tol: f64,
) {
    for (lambda, x) in vals.iter().zip(vecs.columns()) {
        let mx = m.dot(&x) * *lambda;
        let residual = (&k.dot(&x) - &mx).mapv(|v| v * v).sum().sqrt();
        let scale = mx.mapv(|v| v * v).sum().sqrt();
        assert!(residual / scale < tol, "residual {}", residual / scale);
        assert_abs_diff_eq!(x.dot(&m.dot(&x)), 1.0, epsilon = 1e-10);
    }
    assert_abs_diff_eq!(m_orthogonality_defect(vecs, m), 0.0, epsilon = 1e-10);
}

#[test]
fn diagonal_identity_mass() {
    let k = common::diag(&[1.0, 2.0, 3.0, 4.0]);
    let m = Array2::<f64>::eye(4);
    let config = SubspaceConfig::new(4, 2)
        .block_size(2)
        .precision(1e-8)
        .maxiter(100)
        .seed(42);

    let res = block_subspace(&NativeBackend, k.view(), m.view(), &config).unwrap();
    assert_abs_diff_eq!(res.eigvals, array![1.0, 2.0], epsilon = 1e-8);
    assert_abs_diff_eq!(
        res.eigvecs.mapv(f64::abs),
        array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 0.0]],
        epsilon = 1e-6
    );
    assert!(res.all_converged());
    check_pairs(&k, &m, &res.eigvals, &res.eigvecs, 1e-8);
}

#[test]
fn diagonal_scaled_mass() {
    let k = common::diag(&[1.0, 2.0, 3.0, 4.0]);
    let m = common::diag(&[2.0, 2.0, 2.0, 2.0]);
    let config = SubspaceConfig::new(4, 2).block_size(2).seed(42);

    let res = block_subspace(&NativeBackend, k.view(), m.view(), &config).unwrap();
    assert_abs_diff_eq!(res.eigvals, array![0.5, 1.0], epsilon = 1e-8);
    let h = 0.5f64.sqrt();
    assert_abs_diff_eq!(
        res.eigvecs.mapv(f64::abs),
        array![[h, 0.0], [0.0, h], [0.0, 0.0], [0.0, 0.0]],
        epsilon = 1e-6
    );
    check_pairs(&k, &m, &res.eigvals, &res.eigvecs, 1e-8);
}

#[test]
fn ritz_values_do_not_increase() {
    let pencil = Pencil::bar(40);
    let config = SubspaceConfig::new(40, 3).block_size(4).seed(7);

    let res = block_subspace(
        &NativeBackend,
        pencil.stiffness.view(),
        pencil.mass.view(),
        &config,
    )
    .unwrap();
    assert!(res.history.len() >= 2);
    for step in res.history.windows(2) {
        for (new, old) in step[1].iter().zip(step[0].iter()) {
            assert!(*new <= *old * (1.0 + 1e-10), "{} > {}", new, old);
        }
    }
}

#[test]
fn single_iteration_not_converged() {
    let pencil = Pencil::bar(30);
    let config = SubspaceConfig::new(30, 3).maxiter(1);

    match block_subspace(
        &NativeBackend,
        pencil.stiffness.view(),
        pencil.mass.view(),
        &config,
    ) {
        Err((
            EigError::NotConverged {
                iterations: 1,
                requested: 3,
                ..
            },
            Some(pairs),
        )) => {
            assert_eq!(pairs.len(), 3);
            assert_eq!(pairs.iterations, 1);
            assert!(!pairs.all_converged());
            assert_abs_diff_eq!(
                m_orthogonality_defect(&pairs.eigvecs, &pencil.mass),
                0.0,
                epsilon = 1e-10
            );
        }
        other => panic!("expected non-convergence, got {:?}", other.map(|p| p.eigvals)),
    }
}

#[test]
fn bar_spectrum() {
    let n = 60;
    let pencil = Pencil::bar(n);
    let config = SubspaceConfig::new(n, 4).maxiter(200);

    let res = block_subspace(
        &NativeBackend,
        pencil.stiffness.view(),
        pencil.mass.view(),
        &config,
    )
    .unwrap();
    for (j, lambda) in res.eigvals.iter().enumerate() {
        let exact = Pencil::bar_eigenvalue(n, j + 1);
        assert_abs_diff_eq!(*lambda / exact, 1.0, epsilon = 1e-8);
    }
    check_pairs(
        &pencil.stiffness,
        &pencil.mass,
        &res.eigvals,
        &res.eigvecs,
        1e-8,
    );
}

#[test]
fn random_pencil_both_ends() {
    let n = 16;
    let pencil = Pencil::random(n, Xoshiro256Plus::seed_from_u64(11));
    let (exact, _) = generalized_eigh(&pencil.stiffness, &pencil.mass).unwrap();

    let config = SubspaceConfig::new(n, 2).block_size(6).maxiter(5000);
    let res = block_subspace(
        &NativeBackend,
        pencil.stiffness.view(),
        pencil.mass.view(),
        &config,
    )
    .unwrap();
    assert_abs_diff_eq!(res.eigvals, exact.slice(s![..2]), epsilon = 1e-8 * exact[n - 1]);

    let config = config.order(Order::Largest);
    let res = block_subspace(
        &NativeBackend,
        pencil.stiffness.view(),
        pencil.mass.view(),
        &config,
    )
    .unwrap();
    assert_abs_diff_eq!(res.eigvals[0], exact[n - 1], epsilon = 1e-8 * exact[n - 1]);
    assert_abs_diff_eq!(res.eigvals[1], exact[n - 2], epsilon = 1e-8 * exact[n - 1]);
    check_pairs(
        &pencil.stiffness,
        &pencil.mass,
        &res.eigvals,
        &res.eigvecs,
        1e-8,
    );
}

#[test]
fn random_stiffness_identity_mass() {
    let n = 12;
    let mut rng = Xoshiro256Plus::seed_from_u64(21);
    let k = common::random_spd(n, &mut rng);
    let m = Array2::<f64>::eye(n);
    let (exact, _) = generalized_eigh(&k, &m).unwrap();

    let config = SubspaceConfig::new(n, 3).block_size(6).maxiter(2000);
    let res = block_subspace(&NativeBackend, k.view(), m.view(), &config).unwrap();
    assert_abs_diff_eq!(res.eigvals, exact.slice(s![..3]), epsilon = 1e-8 * exact[n - 1]);
    check_pairs(&k, &m, &res.eigvals, &res.eigvecs, 1e-8);
}

#[test]
fn seeded_runs_are_identical() {
    let pencil = Pencil::bar(25);
    let config = SubspaceConfig::new(25, 2).seed(1234);
    let solve = || {
        block_subspace(
            &NativeBackend,
            pencil.stiffness.view(),
            pencil.mass.view(),
            &config,
        )
        .unwrap()
    };
    assert_eq!(solve(), solve());
}

#[test]
fn configuration_errors() {
    let k = Array2::<f64>::eye(4);
    let cases = [
        (
            SubspaceConfig::new(4, 3).block_size(2),
            ConfigError::BlockTooSmall {
                block_size: 2,
                nev: 3,
            },
        ),
        (
            SubspaceConfig::new(4, 1).precision(0.0),
            ConfigError::NonPositiveTolerance,
        ),
        (SubspaceConfig::new(4, 0), ConfigError::NoEigenpairs),
    ];
    for (config, expected) in cases {
        match block_subspace(&NativeBackend, k.view(), k.view(), &config) {
            Err((EigError::Config(err), None)) => assert_eq!(err, expected),
            other => panic!("expected {:?}, got {:?}", expected, other.map(|p| p.eigvals)),
        }
    }

    let config = SubspaceConfig::new(3, 1);
    assert!(matches!(
        block_subspace(&NativeBackend, k.view(), k.view(), &config),
        Err((EigError::DimensionMismatch { .. }, None))
    ));
}

#[test]
fn indefinite_stiffness() {
    let k = common::diag(&[1.0, -2.0, 3.0, 4.0]);
    let m = Array2::<f64>::eye(4);
    let config = SubspaceConfig::new(4, 1);
    assert!(matches!(
        block_subspace(&NativeBackend, k.view(), m.view(), &config),
        Err((
            EigError::Factorization {
                operator: Operator::Stiffness
            },
            None
        ))
    ));

    // the largest end only needs M to be positive definite
    let config = config.order(Order::Largest).maxiter(500);
    let res = block_subspace(&NativeBackend, k.view(), m.view(), &config).unwrap();
    assert_abs_diff_eq!(res.eigvals[0], 4.0, epsilon = 1e-8);
}

#[test]
fn semidefinite_stiffness() {
    // a free structure: one rigid-body mode with zero stiffness
    let k = common::diag(&[0.0, 1.0, 2.0, 3.0]);
    let m = Array2::<f64>::eye(4);
    let config = SubspaceConfig::new(4, 1).block_size(2);
    assert!(matches!(
        block_subspace(&NativeBackend, k.view(), m.view(), &config),
        Err((
            EigError::Factorization {
                operator: Operator::Stiffness
            },
            None
        ))
    ));

    // shifting by M makes K positive definite and moves every eigenvalue by one
    let shifted = &k + &m;
    let res = block_subspace(&NativeBackend, shifted.view(), m.view(), &config).unwrap();
    assert_abs_diff_eq!(res.eigvals[0] - 1.0, 0.0, epsilon = 1e-8);

    let config = config.order(Order::Largest).maxiter(500);
    let res = block_subspace(&NativeBackend, k.view(), m.view(), &config).unwrap();
    assert_abs_diff_eq!(res.eigvals[0], 3.0, epsilon = 1e-8);
}

fn solve_borrowed<'k, 'm>(
    stiffness: ArrayView2<'k, f64>,
    mass: ArrayView2<'m, f64>,
    config: &SubspaceConfig,
) -> Eigenpairs<f64> {
    block_subspace(&NativeBackend, stiffness, mass, config).unwrap()
}

#[test]
fn matrices_from_different_owners() {
    let k = common::diag(&[1.0, 2.0, 3.0, 4.0]);
    let mass_data: Vec<f64> = (0..16).map(|i| if i % 5 == 0 { 2.0 } else { 0.0 }).collect();
    let m = ArrayView2::from_shape((4, 4), &mass_data).unwrap();
    let config = SubspaceConfig::new(4, 2).block_size(3).seed(5);

    let res = solve_borrowed(k.view(), m, &config);
    assert_abs_diff_eq!(res.eigvals, array![0.5, 1.0], epsilon = 1e-8);
    check_pairs(&k, &m.to_owned(), &res.eigvals, &res.eigvecs, 1e-8);

    // a transposed view has its own strides but borrows the same data
    let res = solve_borrowed(k.t(), m.t(), &config);
    assert_abs_diff_eq!(res.eigvals, array![0.5, 1.0], epsilon = 1e-8);
}
