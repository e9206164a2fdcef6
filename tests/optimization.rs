use ml_toolkit::{
    Dataset, MlErr, TrainingConfig,
    models::{LeastSquares, Logistic},
};

fn identity_line() -> Dataset {
    let xs: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
    let ys: Vec<f64> = (0..5).map(|i| i as f64).collect();
    Dataset::from_rows(&xs, &ys).unwrap()
}

#[test]
fn configured_batch_ascent_fits_the_identity_line() {
    let config = TrainingConfig::from_json(
        r#"{ "learning_rate": 0.01, "max_iterations": 500, "method": "batch" }"#,
    )
    .unwrap();

    let mut model = LeastSquares::from_config(identity_line(), &config);
    config.method().unwrap().optimize(&mut model).unwrap();

    assert!((model.predict(&[10.]).unwrap() - 10.).abs() < 1e-1);
}

#[test]
fn configured_stochastic_ascent_fits_the_identity_line() {
    let config = TrainingConfig::from_json(
        r#"{ "learning_rate": 0.01, "max_iterations": 500, "method": "stochasticGA" }"#,
    )
    .unwrap();

    let mut model = LeastSquares::from_config(identity_line(), &config);
    config.method().unwrap().optimize(&mut model).unwrap();

    assert!((model.predict(&[10.]).unwrap() - 10.).abs() < 1e-1);
}

#[test]
fn unknown_method_is_rejected_before_training() {
    let err = TrainingConfig::from_json(r#"{ "learning_rate": 0.1, "method": "newton" }"#)
        .unwrap_err();

    assert!(matches!(err, MlErr::InvalidConfig(_)));
}

#[test]
fn divergence_is_fatal_in_batch_mode() {
    let config = TrainingConfig::from_json(r#"{ "learning_rate": 1e6 }"#).unwrap();
    let mut model = LeastSquares::from_config(identity_line(), &config);

    let err = config.method().unwrap().optimize(&mut model).unwrap_err();

    assert!(matches!(err, MlErr::Diverged { .. }));
    assert!(model.predict(&[1.]).unwrap().is_finite());
}

#[test]
fn logistic_model_learns_a_threshold() {
    let xs: Vec<Vec<f64>> = (-5..5).map(|i| vec![i as f64]).collect();
    let ys: Vec<f64> = (-5..5).map(|i| if i < 0 { 0. } else { 1. }).collect();
    let dataset = Dataset::from_rows(&xs, &ys).unwrap();

    let config = TrainingConfig::from_json(r#"{ "learning_rate": 0.1, "max_iterations": 300 }"#)
        .unwrap();
    let mut model = Logistic::from_config(dataset, &config);
    config.method().unwrap().optimize(&mut model).unwrap();

    assert!(model.predict(&[-4.]).unwrap() < 0.5);
    assert!(model.predict(&[4.]).unwrap() > 0.5);
}
