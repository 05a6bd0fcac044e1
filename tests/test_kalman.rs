//! Test the Kalman filter numerics against hand computed values, and its failure modes.

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

use bayes_ssm::distribution::{Conditional, Gaussian};
use bayes_ssm::error::EstimateError;
use bayes_ssm::estimators::kalman::KalmanFilter;
use bayes_ssm::map::{ControlledLinearGaussian, LinearGaussian};
use bayes_ssm::models::{RecursiveBayesian, StepControls, Variable};
use bayes_ssm::process::{Hierarchical, Markov, Memoryless, Process};

fn state_layer(q: f64) -> Markov<Gaussian, LinearGaussian, Gaussian> {
    let map = LinearGaussian::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2) * q).unwrap();
    Markov::new(
        Conditional::new(Gaussian::standard(2), map).unwrap(),
        Gaussian::new(DVector::zeros(2), DMatrix::identity(2, 2)).unwrap(),
    )
    .unwrap()
}

fn measurement_layer(r: f64) -> Memoryless<Gaussian, LinearGaussian> {
    let map = LinearGaussian::new(DMatrix::from_row_slice(1, 2, &[1., 0.]), DMatrix::identity(1, 1) * r).unwrap();
    Memoryless::new(Conditional::new(Gaussian::standard(1), map).unwrap())
}

fn filter() -> KalmanFilter<LinearGaussian, LinearGaussian> {
    KalmanFilter::from_layers(state_layer(1.), measurement_layer(1.)).unwrap()
}

#[test]
fn test_kalman_models() {
    let kf = filter();
    assert_eq!(kf.state_transition(), &DMatrix::identity(2, 2));
    assert_eq!(kf.state_noise(), &DMatrix::identity(2, 2));
    assert_eq!(kf.measurement_matrix(), &DMatrix::from_row_slice(1, 2, &[1., 0.]));
    assert_eq!(kf.measurement_noise(), &DMatrix::identity(1, 1));
    assert_eq!(kf.process().depth(), 2);
}

#[test]
fn test_kalman_step() {
    let mut kf = filter();
    let initial = kf.initialize().unwrap();
    assert_eq!(initial.x, DVector::zeros(2));
    assert_eq!(initial.X, DMatrix::identity(2, 2));

    kf.predict(&[]).unwrap();
    let predicted = kf.predicted().unwrap();
    assert_eq!(predicted.x, DVector::zeros(2));
    assert_relative_eq!(predicted.X, DMatrix::identity(2, 2) * 2., epsilon = 1e-12);

    let corrected = kf.correct(&DVector::from_element(1, 1.), &[]).unwrap();
    assert_relative_eq!(corrected.x, DVector::from_vec(vec![2. / 3., 0.]), epsilon = 1e-12);
    assert_relative_eq!(
        corrected.X,
        DMatrix::from_row_slice(2, 2, &[2. / 3., 0., 0., 2.]),
        epsilon = 1e-12
    );
    assert_eq!(kf.corrected(), Some(&corrected));
}

#[test]
fn test_kalman_order() {
    let mut kf = filter();
    let e = kf.predict(&[]).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));

    kf.initialize().unwrap();
    let e = kf.correct(&DVector::from_element(1, 1.), &[]).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));

    kf.predict(&[]).unwrap();
    let e = kf.correct(&DVector::zeros(2), &[]).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
}

#[test]
fn test_kalman_innovation_not_pd() {
    let mut kf = KalmanFilter::from_layers(state_layer(1.), measurement_layer(-10.)).unwrap();
    kf.initialize().unwrap();
    kf.predict(&[]).unwrap();
    let e = kf.correct(&DVector::from_element(1, 1.), &[]).unwrap_err();
    assert!(matches!(e, EstimateError::Numerical(_)));
}

#[test]
fn test_kalman_construction() {
    let layers: Vec<Box<dyn Process>> = vec![Box::new(state_layer(1.)), Box::new(measurement_layer(1.))];
    let process = Hierarchical::new(layers).unwrap();
    let e = KalmanFilter::<ControlledLinearGaussian, LinearGaussian>::new(process).err().unwrap();
    assert!(matches!(e, EstimateError::Construction(_)));

    let layers: Vec<Box<dyn Process>> = vec![
        Box::new(state_layer(1.)),
        Box::new(measurement_layer(1.)),
        Box::new(measurement_layer(1.)),
    ];
    // a measurement layer below a 1 dimensional measurement is not composable
    assert!(Hierarchical::new(layers).is_err());

    let layers: Vec<Box<dyn Process>> = vec![Box::new(state_layer(1.))];
    let process = Hierarchical::new(layers).unwrap();
    let e = KalmanFilter::<LinearGaussian, LinearGaussian>::new(process).err().unwrap();
    assert!(matches!(e, EstimateError::Construction(_)));
}

#[test]
fn test_kalman_filter_trajectory() {
    let mut kf = filter();
    let measurements = vec![DVector::from_element(1, 1.); 20];
    let beliefs = kf.filter(&measurements).unwrap();
    assert_eq!(beliefs.len(), 21);
    assert_eq!(beliefs[0].x, DVector::zeros(2));

    let last = &beliefs[20];
    assert_relative_eq!(last.x[0], 1., epsilon = 1e-6);
    assert_eq!(last.x[1], 0.);
    // unobserved component is a random walk
    assert_relative_eq!(last.X[(1, 1)], 21., epsilon = 1e-9);
    // observed component reaches the steady state P = (-1 + sqrt(5)) / 2
    assert_relative_eq!(last.X[(0, 0)], (5f64.sqrt() - 1.) / 2., epsilon = 1e-9);

    let e = kf
        .filter_with_controls(&measurements, &[StepControls::default()])
        .unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
}

#[test]
fn test_kalman_controlled_predict() {
    let map = ControlledLinearGaussian::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2), DMatrix::identity(2, 2))
        .unwrap();
    let state = Markov::new(
        Conditional::new(Gaussian::standard(2), map).unwrap(),
        Gaussian::standard(2),
    )
    .unwrap();
    let mut kf = KalmanFilter::from_layers(state, measurement_layer(1.)).unwrap();
    kf.initialize().unwrap();

    let u = Variable::Vector(DVector::from_vec(vec![1., 2.]));
    let e = kf.predict(&[]).unwrap_err();
    assert!(matches!(e, EstimateError::Precondition(_)));
    kf.predict(&[u.clone()]).unwrap();
    assert_eq!(kf.predicted().unwrap().x, DVector::from_vec(vec![1., 2.]));

    // predict again from the corrected state, the control shift is not applied twice
    let controls = StepControls {
        predict: vec![u],
        correct: Vec::new(),
    };
    let corrected = kf.step(&DVector::from_element(1, 1.), &controls).unwrap();
    assert_relative_eq!(corrected.x, DVector::from_vec(vec![1., 2.]), epsilon = 1e-12);
}
