use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pv_segmentation_dataset::core::dataset::read_split_table;
use pv_segmentation_dataset::core::{streaming_stats, to_chw_tensor};
use pv_segmentation_dataset::{
    attribute_and_split, AttributionConfig, DataLoader, Dataset, DatasetError, ImageLabelDataset,
    LabelAttribution,
};

struct Fixture {
    _root: tempfile::TempDir,
    base: PathBuf,
}

fn write_png(dir: &Path, id: &str, shade: u8) {
    fs::create_dir_all(dir).unwrap();
    RgbImage::from_pixel(4, 4, Rgb([shade, shade / 2, 255 - shade]))
        .save(dir.join(format!("{}.png", id)))
        .unwrap();
}

/// A-images {1,2,3}, A-masks {2}, B-images {3,4}, B-masks {4}, metadata {1..5}.
fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let base = root.path().to_path_buf();

    for (i, id) in ["1", "2", "3"].iter().enumerate() {
        write_png(&base.join("google/img"), id, 40 * i as u8);
    }
    write_png(&base.join("google/mask"), "2", 255);
    for id in ["3", "4"] {
        write_png(&base.join("ign/img"), id, 200);
    }
    write_png(&base.join("ign/mask"), "4", 255);
    for (i, id) in ["1", "2", "3", "4"].iter().enumerate() {
        write_png(&base.join("pool"), id, 60 * i as u8);
    }

    fs::write(
        base.join("metadata.csv"),
        "identifiant,city,surface\n1,Lyon,12.5\n2,Nice,8.0\n3,Brest,3.1\n4,Lille,9.9\n5,Pau,4.2\n",
    )
    .unwrap();

    Fixture { _root: root, base }
}

fn config(fx: &Fixture, output: &str) -> AttributionConfig {
    AttributionConfig::new(
        fx.base.join("google/img"),
        fx.base.join("google/mask"),
        fx.base.join("ign/img"),
        fx.base.join("ign/mask"),
        fx.base.join("metadata.csv"),
        "identifiant",
        fx.base.join(output),
    )
}

fn all_rows(out: &Path) -> BTreeMap<String, Option<u8>> {
    let mut rows = BTreeMap::new();
    for name in ["train_data.csv", "test_data.csv"] {
        for record in read_split_table(&out.join(name)).unwrap() {
            assert!(rows.insert(record.filename, record.label).is_none());
        }
    }
    rows
}

#[test]
fn test_both_sources_scenario() {
    let fx = fixture();
    let engine = LabelAttribution::new(config(&fx, "out").with_sources(true, true)).unwrap();

    let mut table: Vec<_> = engine
        .attribution_table()
        .unwrap()
        .into_iter()
        .map(|r| (r.identifier, r.label))
        .collect();
    table.sort();
    assert_eq!(
        table,
        vec![
            ("1".to_string(), 0),
            ("2".to_string(), 1),
            ("3".to_string(), 0),
            ("4".to_string(), 1),
        ]
    );

    let report = engine.run().unwrap();
    assert_eq!(report.attributed_rows, 4);
    assert_eq!(report.positive_rows, 2);
    assert_eq!(report.metadata_rows, 5);
    assert_eq!(report.joined_rows, 5);
    assert_eq!(report.test_rows, 1);
    assert_eq!(report.train_rows, 4);

    let rows = all_rows(&fx.base.join("out"));
    let expected: BTreeMap<String, Option<u8>> = [
        ("1.png", Some(0)),
        ("2.png", Some(1)),
        ("3.png", Some(0)),
        ("4.png", Some(1)),
        ("5.png", None),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    assert_eq!(rows, expected);

    let header = fs::read_to_string(&report.train_path).unwrap();
    assert!(header.starts_with("identifiant,Label\n"));
}

#[test]
fn test_source_a_only_excludes_source_b_images() {
    let fx = fixture();
    attribute_and_split(&config(&fx, "out").with_sources(true, false)).unwrap();

    let rows = all_rows(&fx.base.join("out"));
    // "4" only survives through the metadata side, without a label
    assert_eq!(rows.get("4.png"), Some(&None));
    assert_eq!(rows.get("3.png"), Some(&Some(0)));
    assert_eq!(rows.get("2.png"), Some(&Some(1)));
}

#[test]
fn test_neither_source_keeps_everything() {
    let fx = fixture();
    attribute_and_split(&config(&fx, "both").with_sources(true, true)).unwrap();
    attribute_and_split(&config(&fx, "neither").with_sources(false, false)).unwrap();

    for name in ["train_data.csv", "test_data.csv"] {
        assert_eq!(
            fs::read(fx.base.join("both").join(name)).unwrap(),
            fs::read(fx.base.join("neither").join(name)).unwrap()
        );
    }
}

#[test]
fn test_same_seed_gives_identical_files() {
    let fx = fixture();
    let first = attribute_and_split(&config(&fx, "run1").with_split(0.4, 3)).unwrap();
    let second = attribute_and_split(&config(&fx, "run2").with_split(0.4, 3)).unwrap();

    assert_eq!(
        fs::read(&first.train_path).unwrap(),
        fs::read(&second.train_path).unwrap()
    );
    assert_eq!(
        fs::read(&first.test_path).unwrap(),
        fs::read(&second.test_path).unwrap()
    );
    assert_eq!(first.test_rows, 2);
}

#[test]
fn test_missing_metadata_writes_nothing() {
    let fx = fixture();
    fs::remove_file(fx.base.join("metadata.csv")).unwrap();

    let err = attribute_and_split(&config(&fx, "out")).unwrap_err();
    assert!(matches!(err, DatasetError::MetadataRead { .. }));
    assert!(!fx.base.join("out").join("train_data.csv").exists());
    assert!(!fx.base.join("out").join("test_data.csv").exists());
}

#[test]
fn test_missing_directory_fails() {
    let fx = fixture();
    fs::remove_dir_all(fx.base.join("ign/mask")).unwrap();

    let err = attribute_and_split(&config(&fx, "out")).unwrap_err();
    assert!(matches!(err, DatasetError::DirectoryNotFound { .. }));
}

#[test]
fn test_dataset_over_split_tables() {
    let fx = fixture();
    let report = attribute_and_split(&config(&fx, "out").with_sources(true, true)).unwrap();

    let train = ImageLabelDataset::open(&report.train_path, fx.base.join("pool")).unwrap();
    let test = ImageLabelDataset::open(&report.test_path, fx.base.join("pool")).unwrap();
    assert_eq!(train.len() + test.len(), 5);

    for dataset in [&train, &test] {
        assert!(matches!(
            dataset.get(dataset.len()),
            Err(DatasetError::IndexOutOfRange { .. })
        ));
        for (i, record) in dataset.records().iter().enumerate() {
            let result = dataset.get(i);
            if record.filename == "5.png" {
                // metadata-only row: no image on disk
                assert!(matches!(result, Err(DatasetError::ImageDecode { .. })));
            } else {
                let (image, label) = result.unwrap();
                assert_eq!(image.dimensions(), (4, 4));
                assert_eq!(label, record.label);
            }
        }
    }

    let images_only: Vec<_> = train
        .records()
        .iter()
        .filter(|r| r.filename != "5.png")
        .cloned()
        .collect();
    let tensors = ImageLabelDataset::from_records(images_only, fx.base.join("pool"))
        .with_resize(2, 2)
        .with_transform(|img| to_chw_tensor(&img));
    let loader = DataLoader::new(tensors, 2);
    let stats = streaming_stats(&loader).unwrap();
    assert_eq!(stats.channels(), 3);
    assert!(stats.mean.iter().all(|m| (0.0..=1.0).contains(m)));
}

#[test]
fn test_every_labelled_row_points_at_a_loadable_file() {
    let root = tempfile::tempdir().unwrap();
    let base = root.path();
    write_png(&base.join("a/img"), "8", 10);
    RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
        .save_with_format(base.join("a/img/7.PNG"), image::ImageFormat::Png)
        .unwrap();
    for dir in ["a/mask", "b/img", "b/mask"] {
        fs::create_dir_all(base.join(dir)).unwrap();
    }
    fs::write(base.join("meta.csv"), "id\n7\n8\n").unwrap();

    let config = AttributionConfig::new(
        base.join("a/img"),
        base.join("a/mask"),
        base.join("b/img"),
        base.join("b/mask"),
        base.join("meta.csv"),
        "id",
        base.join("out"),
    )
    .with_split(0.5, 0);
    attribute_and_split(&config).unwrap();

    let rows = all_rows(&base.join("out"));
    // the upper-case file is not a `png` listing, so 7 only comes from metadata
    assert_eq!(rows.get("7.png"), Some(&None));
    assert_eq!(rows.get("8.png"), Some(&Some(0)));

    for name in ["train_data.csv", "test_data.csv"] {
        let dataset = ImageLabelDataset::open(&base.join("out").join(name), base.join("a/img")).unwrap();
        for (i, record) in dataset.records().iter().enumerate() {
            if record.label.is_some() {
                let (image, _) = dataset.get(i).unwrap();
                assert_eq!(image.dimensions(), (4, 4));
            }
        }
    }
}
