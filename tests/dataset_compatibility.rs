//! Dataset compatibility and format validation tests
//!
//! Exercises the IDX and CSV loaders on malformed and unusual inputs and
//! checks how the preparer reacts to what they produce.

use rdigits::data::{
    encode_images, encode_labels, load_csv_pair, load_idx_dir, load_idx_pair, prepare, CSVDigits,
    TEST_IMAGES, TEST_LABELS, TRAIN_IMAGES, TRAIN_LABELS,
};
use rdigits::{ClassifierError, PrepareConfig};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

fn write_idx(dir: &TempDir, images: &[Vec<u8>], labels: &[u8], train: bool) {
    let (image_name, label_name) = if train {
        (TRAIN_IMAGES, TRAIN_LABELS)
    } else {
        (TEST_IMAGES, TEST_LABELS)
    };
    fs::write(dir.path().join(image_name), encode_images(images, 1, 3)).unwrap();
    fs::write(dir.path().join(label_name), encode_labels(labels)).unwrap();
}

/// Test CSV format variations
#[test]
fn test_csv_format_variations() {
    let test_cases = vec![
        // Plain rows
        ("0,1,2,3\n1,4,5,6\n", 2, "plain rows"),
        // Header row is skipped
        ("label,a,b,c\n0,1,2,3\n1,4,5,6\n", 2, "header"),
        // Comments and blank lines are ignored
        ("# digits\n0,1,2,3\n\n1,4,5,6\n# end\n", 2, "comments"),
        // Surrounding whitespace is trimmed
        (" 0 , 1 , 2 , 3 \n1,4,5,6\n", 2, "whitespace"),
        // Windows line endings
        ("0,1,2,3\r\n1,4,5,6\r\n2,7,8,9\r\n", 3, "crlf"),
    ];

    for (text, rows, description) in test_cases {
        let digits = CSVDigits::from_reader(Cursor::new(text))
            .unwrap_or_else(|e| panic!("{description}: {e}"));
        assert_eq!(digits.len(), rows, "{description}");
        assert_eq!(digits.dim(), 3, "{description}");
    }
}

#[test]
fn test_csv_malformed_rows() {
    let cases = vec![
        ("0,1,2,3\n1,4,5\n", "ragged row"),
        ("0,1,x,3\n", "non-numeric pixel"),
        ("zero,1,2,3\n0,1,2,3\n", "non-numeric label"),
        ("-1,1,2,3\n", "negative label"),
        ("\n# nothing\n", "no data"),
    ];

    for (text, description) in cases {
        assert!(
            CSVDigits::from_reader_with_options(Cursor::new(text), false).is_err(),
            "{description} should be rejected"
        );
    }
}

#[test]
fn test_csv_pair_width_mismatch() {
    let dir = TempDir::new().unwrap();
    let train = dir.path().join("train.csv");
    let test = dir.path().join("test.csv");
    fs::write(&train, "0,1,2,3\n1,4,5,6\n").unwrap();
    fs::write(&test, "0,1,2\n1,4,5\n").unwrap();

    assert!(matches!(
        load_csv_pair(&train, &test),
        Err(ClassifierError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
}

#[test]
fn test_idx_rows_are_grouped_by_label() {
    let dir = TempDir::new().unwrap();
    write_idx(
        &dir,
        &[vec![1, 1, 1], vec![2, 2, 2], vec![3, 3, 3], vec![4, 4, 4]],
        &[1, 0, 1, 0],
        true,
    );

    let blocks = load_idx_pair(dir.path().join(TRAIN_IMAGES), dir.path().join(TRAIN_LABELS)).unwrap();
    assert_eq!(blocks[&0].column(0).to_vec(), vec![2.0, 4.0]);
    assert_eq!(blocks[&1].column(0).to_vec(), vec![1.0, 3.0]);
}

#[test]
fn test_idx_count_mismatch() {
    let dir = TempDir::new().unwrap();
    write_idx(&dir, &[vec![1, 2, 3], vec![4, 5, 6]], &[0, 1, 0], true);

    assert!(matches!(
        load_idx_pair(dir.path().join(TRAIN_IMAGES), dir.path().join(TRAIN_LABELS)),
        Err(ClassifierError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
}

#[test]
fn test_idx_swapped_files_rejected() {
    let dir = TempDir::new().unwrap();
    write_idx(&dir, &[vec![1, 2, 3]], &[0], true);

    // Image data where labels are expected and vice versa
    assert!(matches!(
        load_idx_pair(dir.path().join(TRAIN_LABELS), dir.path().join(TRAIN_IMAGES)),
        Err(ClassifierError::ParseError(_))
    ));
}

#[test]
fn test_idx_missing_test_files() {
    let dir = TempDir::new().unwrap();
    write_idx(&dir, &[vec![1, 2, 3]], &[0], true);

    assert!(matches!(
        load_idx_dir(dir.path()),
        Err(ClassifierError::IoError(_))
    ));
}

#[test]
fn test_prepare_ignores_extra_classes() {
    let dir = TempDir::new().unwrap();
    write_idx(
        &dir,
        &[
            vec![10, 0, 5],
            vec![20, 90, 5],
            vec![30, 0, 5],
            vec![40, 80, 5],
            vec![99, 99, 99],
        ],
        &[0, 1, 0, 1, 2],
        true,
    );
    write_idx(&dir, &[vec![1, 2, 3], vec![4, 5, 6]], &[0, 1], false);

    let config = PrepareConfig::default()
        .with_n_class(2)
        .with_validation_per_class(1);
    let prepared = prepare(&load_idx_dir(dir.path()).unwrap(), &config).unwrap();

    assert_eq!(prepared.train.len(), 2);
    assert!(prepared.train.labels.iter().all(|&label| label < 2));
    // Column 2 is constant once class 2 is left out
    assert_eq!(prepared.kept_features, vec![0, 1]);
}

#[test]
fn test_prepare_reports_missing_class() {
    let dir = TempDir::new().unwrap();
    write_idx(&dir, &[vec![1, 2, 3], vec![4, 5, 6]], &[0, 0], true);
    write_idx(&dir, &[vec![1, 2, 3]], &[0], false);

    let config = PrepareConfig::default()
        .with_n_class(2)
        .with_validation_per_class(1);
    assert!(matches!(
        prepare(&load_idx_dir(dir.path()).unwrap(), &config),
        Err(ClassifierError::MissingClass(1))
    ));
}
