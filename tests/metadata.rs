//! Metadata table built alongside the vectorized features

use std::fs;

use ember_vectorizer::dataset::{DataLayout, Split};
use ember_vectorizer::metadata::{create_metadata, read_metadata, MetadataColumn};
use ember_vectorizer::pipeline::{create_vectorized_features, VectorizeOptions};
use ember_vectorizer::{read_vectorized_features, PrecomputedExtractor};

fn line(sha: &str, label: i64, value: f32, family: &str) -> String {
    format!(
        r#"{{"sha256":"{}","appeared":"2018-03","label":{},"avclass":"{}","features":[{},{}]}}"#,
        sha, label, family, value, value
    )
}

#[test]
fn test_metadata_rows_align_with_features() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::with_train_shards(dir.path(), 2);

    let mut expected = Vec::new();
    for (s, path) in layout.raw_feature_paths(Split::Train).iter().enumerate() {
        let lines: Vec<String> = (0..150)
            .map(|i| {
                let row = s * 150 + i;
                expected.push(format!("train{}", row));
                line(&format!("train{}", row), (row % 2) as i64, row as f32, "fam")
            })
            .collect();
        fs::write(path, lines.join("\n")).unwrap();
    }
    let test_lines: Vec<String> = (0..20)
        .map(|i| line(&format!("test{}", i), -1, 1000.0 + i as f32, ""))
        .collect();
    fs::write(&layout.raw_feature_paths(Split::Test)[0], test_lines.join("\n")).unwrap();

    let extractor = PrecomputedExtractor::new(2);
    let options = VectorizeOptions {
        threads: 4,
        ..VectorizeOptions::default()
    };
    create_vectorized_features(&layout, &extractor, options).unwrap();
    let table = create_metadata(&layout, 4, false).unwrap();

    assert_eq!(table.len(), 320);
    assert_eq!(table.columns, MetadataColumn::ALL.to_vec());

    let data = read_vectorized_features(&layout, None, &extractor).unwrap();
    let train = data.get(Split::Train).unwrap();
    for (row, meta) in table.split_rows(Split::Train).enumerate() {
        assert_eq!(meta.record.identifier.as_deref(), Some(expected[row].as_str()));
        assert_eq!(train.features.row(row)[0], row as f32);
        assert_eq!(Some(train.labels.as_slice()[row] as i64), meta.record.label);
    }
    let test = data.get(Split::Test).unwrap();
    for (row, meta) in table.split_rows(Split::Test).enumerate() {
        assert_eq!(meta.record.identifier, Some(format!("test{}", row)));
        assert_eq!(test.features.row(row)[0], 1000.0 + row as f32);
    }

    let loaded = read_metadata(layout.metadata_path()).unwrap();
    assert_eq!(loaded.columns, table.columns);
    assert_eq!(loaded.len(), table.len());
    assert_eq!(loaded.rows[150], table.rows[150]);
    assert_eq!(loaded.rows[300].split, Split::Test);
}

#[test]
fn test_metadata_columns_follow_first_record() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::with_train_shards(dir.path(), 1);
    fs::write(
        &layout.raw_feature_paths(Split::Train)[0],
        r#"{"sha256":"a","label":1}"#,
    )
    .unwrap();
    fs::write(
        &layout.raw_feature_paths(Split::Test)[0],
        r#"{"sha256":"b","label":0,"avclass":"x"}"#,
    )
    .unwrap();

    create_metadata(&layout, 2, false).unwrap();
    let text = fs::read_to_string(layout.metadata_path()).unwrap();
    assert_eq!(text, ",sha256,subset,label\n0,a,train,1\n1,b,test,0\n");
}
