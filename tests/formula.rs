use approx::assert_abs_diff_eq;

use curvefit::estimate::estimate_inverse_parameter;
use curvefit::{
    Bounds, DataTable, FitError, FitOptions, FormulaModel, Model, SampleSet, merge_bounds, merge_guess,
};

fn line_table() -> DataTable {
    DataTable::new()
        .with_column("x", [1.0, 2.0, 3.0, 4.0])
        .with_column("y", [3.0, 5.0, 7.0, 9.0])
}

#[test]
fn straight_line_formula_round_trips() {
    let model = FormulaModel::new("a*x + b", &["a", "b"]).unwrap();
    let result = model.fit(&line_table(), &["x"], "y").unwrap();

    assert_abs_diff_eq!(result.param("a").unwrap(), 2.0, epsilon = 1e-8);
    assert_abs_diff_eq!(result.param("b").unwrap(), 1.0, epsilon = 1e-8);
    assert_abs_diff_eq!(result.statistics.r_squared, 1.0, epsilon = 1e-10);
    assert_eq!(result.parameter_names, ["a", "b"]);

    let predicted = result.predict(&model, &[10.0]);
    assert_abs_diff_eq!(predicted[0], 21.0, epsilon = 1e-6);
}

#[test]
fn formulas_cannot_reach_outside_their_scope() {
    for expr in [
        "__import__('os').system('ls')",
        "open(a)",
        "a*x; b",
        "exec(a)",
        "a*unknown",
        "a.__class__",
    ] {
        let err = FormulaModel::new(expr, &["a", "b"]).unwrap_err();
        assert!(matches!(err, FitError::Equation(_)), "{expr}: {err}");
    }
}

#[test]
fn two_variable_formula_fits_named_columns() {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let t = [0.5, -1.0, 2.0, 0.0, 1.5, -0.5];
    let y: Vec<f64> = x.iter().zip(t.iter()).map(|(x, t)| 1.5 * x - 2.0 * t + 0.25).collect();
    let table = DataTable::new()
        .with_column("x", x)
        .with_column("t", t)
        .with_column("signal", y);

    let model = FormulaModel::with_variables("a*x + b*t + c", &["a", "b", "c"], &["x", "t"]).unwrap();
    assert_eq!(model.input_count(), 2);
    let result = model.fit(&table, &["x", "t"], "signal").unwrap();

    assert_abs_diff_eq!(result.params[0], 1.5, epsilon = 1e-7);
    assert_abs_diff_eq!(result.params[1], -2.0, epsilon = 1e-7);
    assert_abs_diff_eq!(result.params[2], 0.25, epsilon = 1e-7);
}

#[test]
fn missing_columns_are_validation_errors() {
    let model = FormulaModel::new("a*x + b", &["a", "b"]).unwrap();
    let err = model.fit(&line_table(), &["x"], "z").unwrap_err();
    assert!(matches!(err, FitError::Validation(_)));
}

#[test]
fn explicit_guess_and_bounds_are_honoured() {
    let model = FormulaModel::new("a*x + b", &["a", "b"]).unwrap();
    let bounds = Bounds::new(vec![0.0, 0.0], vec![10.0, 0.5]);
    let result = model
        .fit_with_guess(&line_table(), &["x"], "y", Some([1.0, 0.1].as_slice()), Some(&bounds))
        .unwrap();
    // b is pinned at its upper bound, a absorbs the rest.
    assert!(result.params[1] <= 0.5 + 1e-12);
    assert!(result.params[0] > 2.0);

    let outside = model.fit_with_guess(&line_table(), &["x"], "y", Some([1.0, 2.0].as_slice()), Some(&bounds));
    assert!(matches!(outside, Err(FitError::Fitting(_))));
}

#[test]
fn bounds_without_a_guess_start_inside_them() {
    let model = FormulaModel::new("m*x", &["m"]).unwrap();
    let samples = SampleSet::new([1.0, 2.0, 3.0, 4.0], [10.0, 20.0, 30.0, 40.0]);
    let bounds = Bounds::new(vec![5.0], vec![20.0]);
    let result = model
        .fit_samples(&samples, None, Some(&bounds), &FitOptions::default())
        .unwrap();
    assert_abs_diff_eq!(result.params[0], 10.0, epsilon = 1e-8);

    let half_open = Bounds::new(vec![f64::NEG_INFINITY], vec![-2.0]);
    let flipped = SampleSet::new([1.0, 2.0, 3.0], [-3.0, -6.0, -9.0]);
    let result = model
        .fit_samples(&flipped, None, Some(&half_open), &FitOptions::default())
        .unwrap();
    assert_abs_diff_eq!(result.params[0], -3.0, epsilon = 1e-8);
}

#[test]
fn overrides_replace_only_the_slots_they_name() {
    assert_eq!(merge_guess(&[1.0, 2.0, 3.0], Some([None, Some(9.0), None].as_slice())), [1.0, 9.0, 3.0]);
    assert_eq!(merge_guess(&[1.0, 2.0], None), [1.0, 2.0]);

    let computed = Bounds::new(vec![-1.0, -1.0], vec![1.0, 1.0]);
    let merged = merge_bounds(Some(&computed), Some([Some(-5.0)].as_slice()), None, 2);
    assert_eq!(merged.lower, [-5.0, -1.0]);
    assert_eq!(merged.upper, [1.0, 1.0]);
}

#[test]
fn inverse_estimate_ignores_a_single_outlier() {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
    let mut y: Vec<f64> = x.iter().map(|v| 6.0 / v).collect();
    y[3] = 1000.0;
    assert_abs_diff_eq!(estimate_inverse_parameter(&x, &y, 1), 6.0, epsilon = 1e-9);
}
