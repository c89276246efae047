use super::*;

fn sample() -> DataFrame {
    DataFrame::new(vec![
        ("x".to_string(), Column::Numeric(vec![1.0, 2.0, 3.0, 4.0])),
        (
            "school".to_string(),
            Column::Categorical(vec!["a".into(), "a".into(), "b".into(), "b".into()]),
        ),
        ("year".to_string(), Column::Numeric(vec![1.0, 2.0, 1.0, 1.0])),
    ])
    .expect("valid frame")
}

#[test]
fn test_new_and_shape() {
    let df = sample();
    assert_eq!(df.shape(), (4, 3));
    assert_eq!(df.column_names(), vec!["x", "school", "year"]);
}

#[test]
fn test_new_rejects_empty() {
    assert!(DataFrame::new(vec![]).is_err());
}

#[test]
fn test_new_rejects_ragged_columns() {
    let result = DataFrame::from_numeric(vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])]);
    assert!(matches!(result, Err(CvError::DimensionMismatch { .. })));
}

#[test]
fn test_new_rejects_duplicate_names() {
    let result = DataFrame::from_numeric(vec![("a", vec![1.0]), ("a", vec![2.0])]);
    assert!(matches!(result, Err(CvError::InvalidData(_))));
}

#[test]
fn test_numeric_lookup() {
    let df = sample();
    assert_eq!(df.numeric("x").expect("numeric column"), &[1.0, 2.0, 3.0, 4.0]);
    assert!(df.numeric("school").is_err());
    assert!(matches!(df.numeric("nope"), Err(CvError::ColumnNotFound(_))));
}

#[test]
fn test_add_column() {
    let mut df = sample();
    df.add_column("z".into(), Column::Numeric(vec![0.0; 4]))
        .expect("matching length");
    assert!(df.has_column("z"));
    assert!(df
        .add_column("z".into(), Column::Numeric(vec![0.0; 4]))
        .is_err());
    assert!(df
        .add_column("w".into(), Column::Numeric(vec![0.0; 3]))
        .is_err());
}

#[test]
fn test_without_rows_preserves_order() {
    let df = sample();
    let sub = df.without_rows(&[2, 0]);
    assert_eq!(sub.n_rows(), 2);
    assert_eq!(sub.numeric("x").expect("numeric"), &[2.0, 4.0]);
}

#[test]
fn test_take_rows() {
    let df = sample();
    let sub = df.take_rows(&[3, 1]);
    assert_eq!(sub.numeric("x").expect("numeric"), &[4.0, 2.0]);
}

#[test]
fn test_cluster_keys_single_variable() {
    let df = sample();
    let keys = df.cluster_keys(&["school".to_string()]).expect("keys");
    assert_eq!(keys, vec![vec!["a"], vec!["a"], vec!["b"], vec!["b"]]);
}

#[test]
fn test_cluster_keys_combined_variables() {
    let df = sample();
    let keys = df
        .cluster_keys(&["school".to_string(), "year".to_string()])
        .expect("keys");
    assert_eq!(keys[0], vec!["a", "1"]);
    assert_eq!(keys[1], vec!["a", "2"]);
    assert_eq!(keys[2], keys[3]);
    assert_eq!(cluster_label(&keys[1]), "a.2");
}

#[test]
fn test_cluster_keys_keep_values_apart() {
    // Joined with `.`, both rows would read "x.y.z" and "1.5.2".
    let df = DataFrame::new(vec![
        (
            "a".to_string(),
            Column::Categorical(vec!["x.y".into(), "x".into()]),
        ),
        (
            "b".to_string(),
            Column::Categorical(vec!["z".into(), "y.z".into()]),
        ),
        ("u".to_string(), Column::Numeric(vec![1.5, 1.0])),
        ("v".to_string(), Column::Numeric(vec![2.0, 5.2])),
    ])
    .expect("valid frame");

    let text = df
        .cluster_keys(&["a".to_string(), "b".to_string()])
        .expect("keys");
    assert_ne!(text[0], text[1]);
    assert_eq!(cluster_label(&text[0]), cluster_label(&text[1]));

    let numbers = df
        .cluster_keys(&["u".to_string(), "v".to_string()])
        .expect("keys");
    assert_ne!(numbers[0], numbers[1]);
}

#[test]
fn test_cluster_keys_errors() {
    let df = sample();
    assert!(df.cluster_keys(&[]).is_err());
    assert!(df.cluster_keys(&["missing".to_string()]).is_err());
}
