//! Test Markov and memoryless process layers and their hierarchical composition.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;

use bayes_ssm::distribution::{Categorical, Conditional, Distribution, Gaussian};
use bayes_ssm::error::EstimateError;
use bayes_ssm::map::{ControlledLinearGaussian, LinearGaussian, SwitchingAdditiveLinearGaussian, TransitionMatrix};
use bayes_ssm::models::{Variable, VariableKind};
use bayes_ssm::process::{Hierarchical, Markov, Memoryless, Process};

type LinearMarkov = Markov<Gaussian, LinearGaussian, Gaussian>;

fn random_walk(d: usize) -> LinearMarkov {
    let map = LinearGaussian::new(DMatrix::identity(d, d), DMatrix::identity(d, d)).unwrap();
    Markov::new(Conditional::new(Gaussian::standard(d), map).unwrap(), Gaussian::standard(d)).unwrap()
}

fn observer(z: usize, d: usize) -> Memoryless<Gaussian, LinearGaussian> {
    let map = LinearGaussian::new(DMatrix::identity(z, d), DMatrix::identity(z, z)).unwrap();
    Memoryless::new(Conditional::new(Gaussian::standard(z), map).unwrap())
}

#[test]
fn test_markov_before_initialize() {
    let mut markov = random_walk(2);
    let mut rng = StdRng::seed_from_u64(1);
    assert!(markov.state().is_none());
    let e = markov.random(&[], &mut rng).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
    let e = markov.likelihood(&DVector::zeros(2), &[]).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
}

#[test]
fn test_markov_state() {
    let mut markov = random_walk(2);
    let mut rng = StdRng::seed_from_u64(2);
    let x0 = markov.initialize(&mut rng);
    assert_eq!(markov.state(), Some(&x0));
    let x1 = markov.random(&[], &mut rng).unwrap();
    assert_eq!(markov.state(), Some(&x1));

    // likelihood is of a transition from the current state and does not move it
    let expected = Gaussian::new(x1.clone(), DMatrix::identity(2, 2))
        .unwrap()
        .likelihood(&x0)
        .unwrap();
    assert_relative_eq!(markov.likelihood(&x0, &[]).unwrap(), expected, epsilon = 1e-12);
    assert_eq!(markov.state(), Some(&x1));
}

#[test]
fn test_markov_construction() {
    let map = LinearGaussian::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2)).unwrap();
    let conditional = Conditional::new(Gaussian::standard(2), map).unwrap();
    let e = Markov::new(conditional, Gaussian::standard(3)).unwrap_err();
    assert!(matches!(e, EstimateError::Construction(_)));

    // transition conditioned on a 3 dimensional variable is not a transition of a 2 dimensional state
    let map = LinearGaussian::new(DMatrix::identity(2, 3), DMatrix::identity(2, 2)).unwrap();
    let conditional = Conditional::new(Gaussian::standard(2), map).unwrap();
    let e = Markov::new(conditional, Gaussian::standard(2)).unwrap_err();
    assert!(matches!(e, EstimateError::Construction(_)));
}

#[test]
fn test_memoryless_initialize() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut m = observer(3, 2);
    assert_eq!(
        Process::initialize(&mut m, &mut rng).unwrap(),
        Variable::Vector(DVector::zeros(3))
    );
    assert!(m.initial_density().is_none());

    let t = TransitionMatrix::new(DMatrix::identity(2, 2)).unwrap();
    let mut c = Memoryless::new(Conditional::new(Categorical::default(), t).unwrap());
    assert_eq!(Process::initialize(&mut c, &mut rng).unwrap(), Variable::Category(0));
}

#[test]
fn test_hierarchical_two_layers() {
    let mut rng = StdRng::seed_from_u64(4);
    let layers: Vec<Box<dyn Process>> = vec![Box::new(random_walk(2)), Box::new(observer(1, 2))];
    let mut process = Hierarchical::new(layers).unwrap();
    assert_eq!(process.depth(), 2);
    assert_eq!(process.arities(), &[0, 0]);
    assert_eq!(process.variable_kinds(), vec![VariableKind::Vector(2), VariableKind::Vector(1)]);

    let e = process.random(&[], &mut rng).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));

    let xs0 = process.initialize(&mut rng).unwrap();
    assert_eq!(xs0[1], Variable::Vector(DVector::zeros(1)));
    let xs = process.random(&[], &mut rng).unwrap();
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].kind(), VariableKind::Vector(2));
    assert_eq!(xs[1].kind(), VariableKind::Vector(1));

    let e = process.random(&[Variable::Category(0)], &mut rng).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
}

#[test]
fn test_hierarchical_likelihood() {
    let mut rng = StdRng::seed_from_u64(5);
    let layers: Vec<Box<dyn Process>> = vec![Box::new(random_walk(2)), Box::new(observer(1, 2))];
    let mut process = Hierarchical::new(layers).unwrap();
    process.initialize(&mut rng).unwrap();

    let x0 = process.layer::<LinearMarkov>(0).unwrap().state().unwrap().clone();
    let x = DVector::from_vec(vec![0.5, -0.5]);
    let z = DVector::from_vec(vec![1.]);
    let expected = Gaussian::new(x0, DMatrix::identity(2, 2)).unwrap().likelihood(&x).unwrap()
        * Gaussian::new(DVector::from_vec(vec![0.5]), DMatrix::identity(1, 1))
            .unwrap()
            .likelihood(&z)
            .unwrap();

    let lik = process
        .likelihood(&[Variable::Vector(x), Variable::Vector(z)], &[])
        .unwrap();
    assert_relative_eq!(lik, expected, epsilon = 1e-12);

    let e = process.likelihood(&[Variable::Vector(DVector::zeros(2))], &[]).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
}

#[test]
fn test_hierarchical_composition_errors() {
    let e = Hierarchical::new(Vec::new()).unwrap_err();
    assert!(matches!(e, EstimateError::Construction(_)));

    let layers: Vec<Box<dyn Process>> = vec![Box::new(random_walk(2)), Box::new(observer(1, 3))];
    let e = Hierarchical::new(layers).unwrap_err();
    assert!(matches!(e, EstimateError::Construction(_)));

    let layers: Vec<Box<dyn Process>> = vec![Box::new(random_walk(2)), Box::new(observer(1, 2))];
    let mut process = Hierarchical::new(layers).unwrap();
    assert!(process.layer::<Memoryless<Gaussian, LinearGaussian>>(0).is_err());
    assert!(process.layer::<Memoryless<Gaussian, LinearGaussian>>(1).is_ok());
    assert!(matches!(process.process(2), Err(EstimateError::Precondition(_))));
    assert!(matches!(process.process_mut(2), Err(EstimateError::Precondition(_))));
    assert!(process.process_mut(1).is_ok());
}

#[test]
fn test_hierarchical_control_routing() {
    let mut rng = StdRng::seed_from_u64(6);
    let small = DMatrix::identity(2, 2) * 1e-10;
    let state_map =
        ControlledLinearGaussian::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2), small.clone()).unwrap();
    let state = Markov::new(
        Conditional::new(Gaussian::standard(2), state_map).unwrap(),
        Gaussian::new(DVector::zeros(2), small).unwrap(),
    )
    .unwrap();
    let measurement_map = ControlledLinearGaussian::new(
        DMatrix::from_row_slice(1, 2, &[1., 0.]),
        DMatrix::identity(1, 1),
        DMatrix::identity(1, 1) * 1e-10,
    )
    .unwrap();
    let measurement = Memoryless::new(Conditional::new(Gaussian::standard(1), measurement_map).unwrap());

    let layers: Vec<Box<dyn Process>> = vec![Box::new(state), Box::new(measurement)];
    let mut process = Hierarchical::new(layers).unwrap();
    assert_eq!(process.arities(), &[1, 1]);
    assert_eq!(process.control_count(), 2);
    process.initialize(&mut rng).unwrap();

    let u0 = Variable::Vector(DVector::from_vec(vec![5., 5.]));
    let u1 = Variable::Vector(DVector::from_vec(vec![100.]));
    let e = process.random(&[u0.clone()], &mut rng).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));

    let xs = process.random(&[u0, u1], &mut rng).unwrap();
    assert_abs_diff_eq!(xs[0].as_vector().unwrap(), &DVector::from_vec(vec![5., 5.]), epsilon = 1e-3);
    assert_abs_diff_eq!(xs[1].as_vector().unwrap()[0], 105., epsilon = 1e-3);
}

#[test]
fn test_hierarchical_switching_three_layers() {
    let mut rng = StdRng::seed_from_u64(7);
    // mode chain stuck in mode 1
    let modes = Markov::new(
        Conditional::new(Categorical::default(), TransitionMatrix::new(DMatrix::identity(2, 2)).unwrap()).unwrap(),
        Categorical::new(DVector::from_vec(vec![0., 1.])).unwrap(),
    )
    .unwrap();
    let biases = DMatrix::from_row_slice(2, 2, &[0., 10., 0., 0.]);
    let state_map = SwitchingAdditiveLinearGaussian::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2), biases).unwrap();
    let state = Markov::new(
        Conditional::new(Gaussian::standard(2), state_map).unwrap(),
        Gaussian::standard(2),
    )
    .unwrap();

    let layers: Vec<Box<dyn Process>> = vec![Box::new(modes), Box::new(state), Box::new(observer(1, 2))];
    let mut process = Hierarchical::new(layers).unwrap();
    assert_eq!(process.depth(), 3);
    assert_eq!(process.arities(), &[0, 0, 0]);
    process.initialize(&mut rng).unwrap();

    let trajectory = process.random_n(5, &[], &mut rng).unwrap();
    assert_eq!(trajectory.len(), 5);
    for xs in &trajectory {
        assert_eq!(xs.len(), 3);
        assert_eq!(xs[0], Variable::Category(1));
        assert_eq!(xs[2].kind(), VariableKind::Vector(1));
    }
    // drift of 10 per step in the first state component
    let x = trajectory[4][1].as_vector().unwrap();
    assert!(x[0] > 30.);
}

#[test]
fn test_hierarchical_bad_controls_keep_state() {
    let mut rng = StdRng::seed_from_u64(8);
    let state_map =
        ControlledLinearGaussian::new(DMatrix::identity(1, 1), DMatrix::identity(1, 1), DMatrix::identity(1, 1)).unwrap();
    let state = Markov::new(
        Conditional::new(Gaussian::standard(1), state_map).unwrap(),
        Gaussian::standard(1),
    )
    .unwrap();
    let measurement_map =
        ControlledLinearGaussian::new(DMatrix::identity(1, 1), DMatrix::identity(1, 1), DMatrix::identity(1, 1)).unwrap();
    let measurement = Memoryless::new(Conditional::new(Gaussian::standard(1), measurement_map).unwrap());
    let layers: Vec<Box<dyn Process>> = vec![Box::new(state), Box::new(measurement)];
    let mut process = Hierarchical::new(layers).unwrap();
    process.initialize(&mut rng).unwrap();

    let state_of = |process: &Hierarchical| {
        process
            .layer::<Markov<Gaussian, ControlledLinearGaussian, Gaussian>>(0)
            .unwrap()
            .state()
            .unwrap()
            .clone()
    };
    let x0 = state_of(&process);

    // the measurement layer's control is of the wrong kind, so no layer may advance
    let u = Variable::Vector(DVector::from_element(1, 100.));
    let e = process.random(&[u.clone(), Variable::Category(0)], &mut rng).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
    assert_eq!(state_of(&process), x0);

    let e = process
        .random(&[Variable::Vector(DVector::zeros(2)), u.clone()], &mut rng)
        .unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
    assert_eq!(state_of(&process), x0);

    let e = process
        .likelihood(&[Variable::Vector(DVector::zeros(1)), Variable::Vector(DVector::zeros(1))], &[u.clone(), Variable::Category(0)])
        .unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));

    process.random(&[u.clone(), u], &mut rng).unwrap();
    assert!(state_of(&process)[0] > 90.);
}
