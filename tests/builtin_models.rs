use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use curvefit::{
    EquationRegistry, FitError, FitOptions, GuessOverrides, ModelKind, SampleSet, fit, fit_builtin,
};

fn grid(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

fn noisy(y: &[f64], sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).unwrap();
    y.iter().map(|v| v + normal.sample(&mut rng)).collect()
}

fn run(kind: ModelKind, samples: &SampleSet) -> curvefit::ModelFit {
    fit_builtin(
        &EquationRegistry::standard(),
        samples,
        kind,
        &GuessOverrides::default(),
        &FitOptions::default(),
    )
    .unwrap_or_else(|e| panic!("{kind} fit failed: {e}"))
}

#[test]
fn slope_through_origin_is_recovered_exactly() {
    let samples = SampleSet::new([1.0, 2.0, 3.0, 4.0, 5.0], [3.0, 6.0, 9.0, 12.0, 15.0]);
    let result = fit(&samples, &ModelKind::LinearOrigin, &["m"], None, None).unwrap();
    assert_relative_eq!(result.params[0], 3.0, epsilon = 1e-8);
    assert_abs_diff_eq!(result.statistics.r_squared, 1.0, epsilon = 1e-10);
    assert!(result.statistics.r_squared <= 1.0);
}

#[test]
fn noiseless_models_recover_their_parameters() {
    let x = grid(0.5, 0.25, 24);
    let cases: [(ModelKind, &[f64]); 8] = [
        (ModelKind::Linear, &[1.5, -2.0]),
        (ModelKind::Quadratic, &[0.5, -1.0, 2.0]),
        (ModelKind::Cubic, &[0.1, -0.5, 1.0, 3.0]),
        (ModelKind::SquareOrigin, &[1.25]),
        (ModelKind::Ln, &[2.0]),
        (ModelKind::Inverse, &[4.0]),
        (ModelKind::InverseSquare, &[-3.0]),
        (ModelKind::Exponential, &[2.0, -0.4]),
    ];
    for (kind, truth) in cases {
        let y = kind_predict(kind, &x, truth);
        let fit = run(kind, &SampleSet::new(x.clone(), y));
        for (got, want) in fit.result.params.iter().zip(truth.iter()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-6, max_relative = 1e-6);
        }
        assert!(fit.result.statistics.r_squared > 1.0 - 1e-10, "{kind}");
    }
}

fn kind_predict(kind: ModelKind, x: &[f64], params: &[f64]) -> Vec<f64> {
    use curvefit::Model;
    kind.predict_grid(x, params)
}

#[test]
fn noisy_gaussian_fit_brackets_the_truth() {
    let x = grid(-4.0, 0.1, 81);
    let clean = kind_predict(ModelKind::Gaussian, &x, &[5.0, 0.3, 0.9]);
    let samples = SampleSet::new(x, noisy(&clean, 0.05, 7)).with_uy(vec![0.05; 81]);
    let fit = run(ModelKind::Gaussian, &samples);

    let r = &fit.result;
    assert_abs_diff_eq!(r.params[0], 5.0, epsilon = 0.1);
    assert_abs_diff_eq!(r.params[1], 0.3, epsilon = 0.05);
    assert_abs_diff_eq!(r.params[2].abs(), 0.9, epsilon = 0.05);
    let chi2_red = r.statistics.reduced_chi_squared.unwrap();
    assert!(chi2_red > 0.5 && chi2_red < 1.6, "χ²_red = {chi2_red}");
    let (lo, hi) = r.confidence_intervals.as_ref().unwrap()[0];
    assert!(lo < r.params[0] && r.params[0] < hi);
    assert!(fit.equation.starts_with("y = "));
}

#[test]
fn noisy_sine_fit_finds_the_frequency() {
    let x = grid(0.0, 0.05, 240);
    let clean = kind_predict(ModelKind::Sin, &x, &[1.5, 2.2, 0.4]);
    let samples = SampleSet::new(x, noisy(&clean, 0.05, 11));
    let fit = run(ModelKind::Sin, &samples);
    assert_abs_diff_eq!(fit.result.params[1], 2.2, epsilon = 0.02);
    assert_abs_diff_eq!(fit.result.params[0].abs(), 1.5, epsilon = 0.05);
    assert!(fit.result.statistics.r_squared > 0.98);
}

#[test]
fn logistic_and_square_pulse_converge() {
    let x = grid(0.0, 0.1, 101);
    let y = kind_predict(ModelKind::Logistic, &x, &[3.0, 1.8, 5.0]);
    let fit = run(ModelKind::Logistic, &SampleSet::new(x.clone(), y));
    assert_abs_diff_eq!(fit.result.params[0], 3.0, epsilon = 1e-4);
    assert_abs_diff_eq!(fit.result.params[2], 5.0, epsilon = 1e-4);

    // The pulse is flat almost everywhere, so only check the fit is sane.
    let y: Vec<f64> = x.iter().map(|v| if (*v - 4.0).abs() <= 1.0 { 2.0 } else { 0.0 }).collect();
    let fit = run(ModelKind::SquarePulse, &SampleSet::new(x, y));
    assert_abs_diff_eq!(fit.result.params[0], 2.0, epsilon = 1e-9);
    assert!(fit.result.statistics.rmse < 0.2);
}

#[test]
fn hyperbolic_bounds_reject_an_override_outside_them() {
    let x = grid(1.0, 1.0, 10);
    let y = kind_predict(ModelKind::Cosh, &x, &[0.5, 0.2]);
    let samples = SampleSet::new(x, y);

    let within = run(ModelKind::Cosh, &samples);
    assert_abs_diff_eq!(within.result.params[1].abs(), 0.2, epsilon = 1e-5);

    let overrides = GuessOverrides {
        guess: vec![None, Some(500.0)],
        ..GuessOverrides::default()
    };
    let err = fit_builtin(
        &EquationRegistry::standard(),
        &samples,
        ModelKind::Cosh,
        &overrides,
        &FitOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, FitError::Fitting(_)), "{err}");
}

#[test]
fn equal_sample_and_parameter_counts_skip_intervals() {
    let samples = SampleSet::new([1.0, 2.0, 3.0], [2.0, 5.0, 10.0]);
    let fit = run(ModelKind::Quadratic, &samples);
    let r = &fit.result;
    assert_eq!(r.statistics.dof, 0);
    assert!(r.confidence_intervals.is_none());
    assert!(r.statistics.reduced_chi_squared.is_none());
    assert_abs_diff_eq!(r.params[0], 1.0, epsilon = 1e-8);
}

#[test]
fn results_serialize_to_json() {
    let samples = SampleSet::new([1.0, 2.0, 3.0, 4.0], [2.0, 4.1, 5.9, 8.0]);
    let fit = run(ModelKind::Linear, &samples);
    let json = serde_json::to_value(&fit).unwrap();
    assert_eq!(json["model"], "linear");
    assert!(json["result"]["statistics"]["r_squared"].as_f64().unwrap() > 0.99);
}
