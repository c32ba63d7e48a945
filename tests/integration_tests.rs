//! Integration tests for the rlinear binding
//!
//! These exercise the full path through the native library: training,
//! prediction, cross-validation and model round-trips through the text
//! format.

use std::io::Cursor;

use approx::assert_relative_eq;
use tempfile::NamedTempFile;

use rlinear::{
    cross_validation, from_dense_vector, FeatureValue, LinearError, Model, Parameters, Problem,
    SolverType, TrainingInstance,
};

/// Initialize logging once so `RUST_LOG=debug` surfaces the native
/// library's training output.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn simple_instances() -> Vec<TrainingInstance> {
    vec![
        TrainingInstance::new(0.0, from_dense_vector(&[1.0, 1.0, 1.0, 0.0, 0.0])),
        TrainingInstance::new(0.0, from_dense_vector(&[0.0, 1.0, 0.0, 0.0, 0.0])),
        TrainingInstance::new(1.0, from_dense_vector(&[1.0, 0.0, 1.0, 1.0, 1.0])),
        TrainingInstance::new(1.0, from_dense_vector(&[0.0, 0.0, 0.0, 1.0, 1.0])),
    ]
}

fn simple_problem() -> Problem {
    let mut problem = Problem::new();
    for instance in simple_instances() {
        problem.add(&instance).expect("instance should be accepted");
    }
    problem
}

fn ten_instance_problem() -> Problem {
    let dense: [(f64, [f64; 5]); 10] = [
        (0.0, [1.0, 1.0, 1.0, 0.0, 0.0]),
        (0.0, [1.0, 1.0, 1.0, 0.0, 0.0]),
        (0.0, [1.0, 1.0, 0.0, 0.0, 0.0]),
        (0.0, [1.0, 1.0, 0.0, 0.0, 0.0]),
        (0.0, [1.0, 1.0, 0.0, 0.0, 0.0]),
        (1.0, [0.0, 0.0, 1.0, 1.0, 1.0]),
        (1.0, [0.0, 0.0, 1.0, 1.0, 1.0]),
        (1.0, [0.0, 0.0, 0.0, 1.0, 1.0]),
        (1.0, [0.0, 0.0, 0.0, 1.0, 1.0]),
        (1.0, [0.0, 0.0, 0.0, 1.0, 1.0]),
    ];

    let mut problem = Problem::new();
    for (label, features) in &dense {
        problem
            .add(&TrainingInstance::new(*label, from_dense_vector(features)))
            .expect("instance should be accepted");
    }
    problem
}

fn three_class_problem() -> Problem {
    let mut problem = Problem::new();
    for (label, features) in [
        (0.0, [1.0, 1.0, 0.0, 0.0]),
        (0.0, [1.0, 0.9, 0.0, 0.0]),
        (1.0, [0.0, 0.0, 1.0, 1.0]),
        (1.0, [0.0, 0.0, 0.9, 1.0]),
        (2.0, [1.0, 0.0, 0.0, 1.0]),
        (2.0, [0.9, 0.0, 0.0, 1.0]),
    ] {
        problem
            .add(&TrainingInstance::new(label, from_dense_vector(&features)))
            .expect("instance should be accepted");
    }
    problem
}

#[test]
fn test_train_and_predict() {
    init_logging();
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    let check1 = model
        .predict(&from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]))
        .expect("prediction should succeed");
    assert_eq!(check1, 0.0);

    let check2 = model
        .predict(&from_dense_vector(&[0.0, 0.0, 0.0, 1.0, 1.0]))
        .expect("prediction should succeed");
    assert_eq!(check2, 1.0);
}

#[test]
fn test_model_keeps_problem_alive() {
    // The problem value goes away before the model does; the shared
    // native buffers must survive until the model is dropped.
    let model = {
        let problem = simple_problem();
        Model::train(&Parameters::default(), &problem).expect("training should succeed")
    };

    let label = model
        .predict(&from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]))
        .expect("prediction should succeed");
    assert_eq!(label, 0.0);
}

#[test]
fn test_predict_probability_logistic_regression() {
    let problem = simple_problem();
    let params = Parameters {
        solver_type: SolverType::l2r_logistic_regression_default(),
        ..Parameters::default()
    };
    let model = Model::train(&params, &problem).expect("training should succeed");

    let (label1, probs1) = model
        .predict_probability(&from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]))
        .expect("prediction should succeed");
    assert_eq!(label1, 0.0);
    assert!(probs1[&0] > probs1[&1], "want p(0) > p(1), got {probs1:?}");

    let (label2, probs2) = model
        .predict_probability(&from_dense_vector(&[0.0, 0.0, 0.0, 1.0, 1.0]))
        .expect("prediction should succeed");
    assert_eq!(label2, 1.0);
    assert!(probs2[&1] > probs2[&0], "want p(1) > p(0), got {probs2:?}");

    let sum: f64 = probs1.values().sum();
    assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
}

#[test]
fn test_predict_probability_without_support_is_all_zero() {
    // Solvers without probability support report a zero probability for
    // every class instead of an error.
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    let (_, probs) = model
        .predict_probability_slice(&from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]))
        .expect("prediction should succeed");
    assert_eq!(probs, vec![0.0, 0.0]);
}

#[test]
fn test_predict_decision_values() {
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    let (label, values) = model
        .predict_decision_values(&from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]))
        .expect("prediction should succeed");
    assert_eq!(label, 0.0);
    assert_eq!(values.len(), 2);
    // The decision value for the first stored label is positive when
    // that label wins.
    assert!(values[&0] > 0.0, "want positive decision value, got {values:?}");
}

#[test]
fn test_labels_in_storage_order() {
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    // First-seen order: class 0 before class 1.
    assert_eq!(model.labels(), vec![0, 1]);
    assert_eq!(model.n_classes(), 2);
    assert_eq!(model.n_features(), 5);
}

#[test]
fn test_cross_validation_leave_one_out() {
    init_logging();
    let problem = ten_instance_problem();
    let results = cross_validation(&problem, &Parameters::default(), 10)
        .expect("cross-validation should succeed");

    assert_eq!(
        results,
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]
    );
}

#[test]
fn test_cross_validation_rejects_bad_parameters() {
    let problem = simple_problem();
    let params = Parameters {
        cost: -1.0,
        ..Parameters::default()
    };

    let err = cross_validation(&problem, &params, 2).unwrap_err();
    assert!(matches!(err, LinearError::Parameter(_)));
}

#[test]
fn test_train_rejects_bad_parameters() {
    let problem = simple_problem();
    let params = Parameters {
        solver_type: SolverType::l2r_l2loss_svc_dual(-0.5),
        ..Parameters::default()
    };

    let err = Model::train(&params, &problem).unwrap_err();
    match err {
        LinearError::Parameter(message) => assert!(!message.is_empty()),
        other => panic!("want a parameter error, got {other:?}"),
    }
}

#[test]
fn test_class_weights_are_accepted() {
    let problem = simple_problem();
    let params = Parameters {
        rel_costs: vec![
            rlinear::ClassWeight {
                label: 0,
                value: 1.0,
            },
            rlinear::ClassWeight {
                label: 1,
                value: 2.0,
            },
        ],
        ..Parameters::default()
    };

    let model = Model::train(&params, &problem).expect("training should succeed");
    let label = model
        .predict(&from_dense_vector(&[0.0, 0.0, 0.0, 1.0, 1.0]))
        .expect("prediction should succeed");
    assert_eq!(label, 1.0);
}

#[test]
fn test_weights_and_bias_two_class() {
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    let weights = model.weights().expect("two-class weights");
    assert_eq!(weights.len(), 5);
    // No bias term was trained.
    assert_eq!(model.bias().expect("two-class bias"), 0.0);

    // With a bias term the bias weight becomes meaningful.
    let mut biased = simple_problem();
    biased.set_bias(1.0);
    let biased_model =
        Model::train(&Parameters::default(), &biased).expect("training should succeed");
    assert_eq!(biased_model.weights().expect("two-class weights").len(), 5);
    assert!(biased_model.bias().expect("two-class bias").is_finite());
}

#[test]
fn test_weights_three_class_unsupported() {
    let problem = three_class_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    assert_eq!(model.n_classes(), 3);
    assert!(matches!(
        model.weights(),
        Err(LinearError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        model.bias(),
        Err(LinearError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_invalid_feature_index_is_rejected() {
    let mut problem = Problem::new();
    let erroneous = vec![
        FeatureValue::new(1, 1.0),
        FeatureValue::new(2, 0.5),
        FeatureValue::new(0, 1.0),
    ];

    let err = problem
        .add(&TrainingInstance::new(0.0, erroneous))
        .unwrap_err();
    assert!(matches!(
        err,
        LinearError::InvalidFeatureIndex { index: 0, .. }
    ));
    assert_eq!(problem.len(), 0);
}

#[test]
fn test_iterate() {
    let problem = simple_problem();
    let instances = simple_instances();

    let mut idx = 0;
    problem.iterate(|instance| {
        assert_eq!(instance.features, instances[idx].features);
        assert_eq!(instance.label, instances[idx].label);
        idx += 1;
        true
    });
    assert_eq!(idx, instances.len());

    // Iteration is cancelled as soon as the visitor returns false.
    let mut count = 0;
    problem.iterate(|_| {
        count += 1;
        false
    });
    assert_eq!(count, 1);
}

#[test]
fn test_iterate_reflects_later_additions() {
    let mut problem = simple_problem();
    problem
        .add(&TrainingInstance::new(
            1.0,
            from_dense_vector(&[0.0, 0.0, 1.0, 1.0, 0.0]),
        ))
        .expect("instance should be accepted");

    let mut count = 0;
    problem.iterate(|_| {
        count += 1;
        true
    });
    assert_eq!(count, 5);
}

#[test]
fn test_unsorted_features_are_sorted_for_storage() {
    let mut problem = Problem::new();
    let shuffled = vec![
        FeatureValue::new(4, 0.4),
        FeatureValue::new(1, 0.1),
        FeatureValue::new(3, 0.3),
    ];
    problem
        .add(&TrainingInstance::new(0.0, shuffled))
        .expect("instance should be accepted");

    problem.iterate(|instance| {
        assert_eq!(
            instance.features,
            vec![
                FeatureValue::new(1, 0.1),
                FeatureValue::new(3, 0.3),
                FeatureValue::new(4, 0.4),
            ]
        );
        true
    });
}

#[test]
fn test_save_and_load_round_trip() {
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    let temp_file = NamedTempFile::new().expect("failed to create temp file");
    model.save(temp_file.path()).expect("save should succeed");

    let loaded = Model::load(temp_file.path()).expect("load should succeed");
    assert_eq!(loaded.n_classes(), model.n_classes());
    assert_eq!(loaded.n_features(), model.n_features());
    assert_eq!(loaded.labels(), model.labels());

    let original = model.weights().expect("two-class weights");
    let reloaded = loaded.weights().expect("two-class weights");
    for (&a, &b) in original.iter().zip(reloaded.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-15);
    }

    // The reloaded model predicts like the original.
    for features in [
        from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]),
        from_dense_vector(&[0.0, 0.0, 0.0, 1.0, 1.0]),
        from_dense_vector(&[1.0, 0.0, 1.0, 0.0, 1.0]),
    ] {
        assert_eq!(
            loaded.predict(&features).expect("prediction should succeed"),
            model.predict(&features).expect("prediction should succeed"),
        );
    }
}

#[test]
fn test_write_and_read_round_trip() {
    let problem = ten_instance_problem();
    let params = Parameters {
        solver_type: SolverType::l2r_logistic_regression_default(),
        ..Parameters::default()
    };
    let model = Model::train(&params, &problem).expect("training should succeed");

    let mut text = Vec::new();
    model.write(&mut text).expect("write should succeed");
    let reloaded = Model::read(Cursor::new(&text[..])).expect("read should succeed");

    assert_eq!(reloaded.n_classes(), model.n_classes());
    assert_eq!(reloaded.n_features(), model.n_features());
    assert_eq!(reloaded.labels(), model.labels());

    // Probability estimates survive the round trip to well within the
    // serialized precision.
    let features = from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]);
    let (_, original) = model
        .predict_probability_slice(&features)
        .expect("prediction should succeed");
    let (_, round_tripped) = reloaded
        .predict_probability_slice(&features)
        .expect("prediction should succeed");
    for (&a, &b) in original.iter().zip(round_tripped.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_load_missing_file() {
    let err = Model::load("/non/existent/model.txt").unwrap_err();
    assert!(matches!(err, LinearError::Io(_)));
}

#[test]
fn test_predict_rejects_invalid_index() {
    let problem = simple_problem();
    let model =
        Model::train(&Parameters::default(), &problem).expect("training should succeed");

    let err = model
        .predict(&vec![FeatureValue::new(-1, 1.0)])
        .unwrap_err();
    assert!(matches!(err, LinearError::InvalidFeatureIndex { .. }));
}
