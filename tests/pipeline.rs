use std::fs;

use ndarray::Array3;
use nifti::NiftiHeader;
use volume_slicer::{Error, Header, Pipeline, PipelineConfig, SliceRole, Volume, load_slice};

fn write_reference(path: &std::path::Path) -> Volume {
    let mut header = NiftiHeader::default();
    header.pixdim = [1.0, 0.7, 0.7, 3.0, 1.0, 1.0, 1.0, 1.0];
    let data = Array3::from_shape_fn((6, 5, 3), |(x, y, z)| (x * 40 + y * 25 + z * 100) as f32);
    let volume = Volume::new(data, Header::Nifti(Box::new(header)));
    volume.write(path).unwrap();
    volume
}

#[test]
fn test_slice_and_rebuild_with_normalization() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("case1.nii.gz");
    let slices = dir.path().join("slices");
    let output = dir.path().join("out").join("case1_pred.nii.gz");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    write_reference(&input);

    let config = PipelineConfig::from_json(
        r#"{ "slice": { "width": 6, "height": 5 }, "normalize": {} }"#,
    )
    .unwrap();
    let pipeline = Pipeline::new(config).unwrap();
    assert!(pipeline.config().contrast.is_none());

    let manifest = pipeline.slice_volume(&input, &slices).unwrap();
    assert_eq!(manifest.stem, "case1");
    assert_eq!(manifest.slices.len(), 3);

    let rebuilt = pipeline
        .rebuild_volume("case1", &slices, &input, &output)
        .unwrap();
    assert!(rebuilt.skipped.is_empty());

    let read = Volume::read(&output).unwrap();
    assert_eq!(read.dim(), (6, 5, 3));
    let data = read.data();
    assert_eq!(data[[0, 0, 0]], 0.0);
    assert_eq!(data[[5, 4, 2]], 255.0);
    assert!(data.iter().all(|&v| (0.0..=255.0).contains(&v)));
    match &read.header {
        Header::Nifti(header) => assert_eq!(&header.pixdim[1..4], &[0.7, 0.7, 3.0]),
        other => panic!("expected a NIfTI header, got {other:?}"),
    }
}

#[test]
fn test_contrast_wins_over_normalize() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("case2.nii");
    let reference = write_reference(&input);

    let config = PipelineConfig::from_json(
        r#"{
            "slice": { "width": 6, "height": 5 },
            "normalize": { "out_min": 0, "out_max": 1 },
            "contrast": { "out_min": 0, "out_max": 255 }
        }"#,
    )
    .unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    let prepared = pipeline.prepare(&reference).unwrap();
    let max = prepared.data().iter().copied().fold(f32::MIN, f32::max);
    assert_eq!(max, 255.0);
}

#[test]
fn test_rebuild_into_uses_configured_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("case3.gipl");
    let slices = dir.path().join("slices");
    let reference = Volume::new(
        Array3::from_shape_fn((4, 4, 2), |(x, y, z)| (x + y + z) as f32),
        Header::None,
    );
    reference.write(&input).unwrap();

    let config = PipelineConfig::from_json(
        r#"{ "slice": { "width": 4, "height": 4 }, "output_extension": "nrrd" }"#,
    )
    .unwrap();
    let pipeline = Pipeline::new(config).unwrap();
    pipeline.slice_volume(&input, &slices).unwrap();
    pipeline
        .rebuild_into("case3", &slices, &input, dir.path().join("rebuilt"))
        .unwrap();

    let rebuilt = Volume::read(dir.path().join("rebuilt").join("case3.nrrd")).unwrap();
    assert_eq!(rebuilt.data(), reference.data());
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = PipelineConfig::from_json(r#"{ "slice": { "width": 0, "height": 5 } }"#);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));

    let config = PipelineConfig {
        output_extension: ".".into(),
        ..PipelineConfig::default()
    };
    assert!(matches!(Pipeline::new(config), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    fs::write(&path, r#"{ "contrast": { "pmin": 2, "pmax": 98 } }"#).unwrap();

    let config = PipelineConfig::load(&path).unwrap();

    assert_eq!(config.slice.width, 512);
    assert_eq!(config.output_extension, "nii.gz");
    let contrast = config.contrast.unwrap();
    assert_eq!((contrast.pmin, contrast.pmax, contrast.bins), (2.0, 98.0, 256));
}

#[test]
fn test_sliced_outputs_load_for_training() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("case4.nii");
    write_reference(&input);

    let pipeline = Pipeline::new(
        PipelineConfig::from_json(r#"{ "slice": { "width": 8, "height": 8 }, "normalize": {} }"#)
            .unwrap(),
    )
    .unwrap();
    pipeline.slice_volume(&input, dir.path()).unwrap();

    let image = load_slice(dir.path().join("case4_2.png"), SliceRole::Image).unwrap();
    assert_eq!(image.dim(), (8, 8));
    assert!(image.iter().all(|&v| (0.0..=1.0).contains(&v)));

    let label = load_slice(dir.path().join("case4_2.png"), SliceRole::Label).unwrap();
    assert!(label.iter().all(|&v| v == 0.0 || v == 1.0));
}

fn write_hounsfield(path: &std::path::Path) {
    // air at -1000 HU around a block of soft tissue and bone
    let data = Array3::from_shape_fn((6, 5, 3), |(x, y, z)| {
        if x == 0 || y == 0 || x == 5 || y == 4 {
            -1000.0
        } else {
            (x * 60 + y * 40 + z * 30) as f32 - 20.0
        }
    });
    Volume::new(data, Header::None).write(path).unwrap();
}

#[test]
fn test_negative_hounsfield_volume_slices_with_contrast_and_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ct1.nii.gz");
    write_hounsfield(&input);

    let contrast = PipelineConfig::from_json(
        r#"{ "slice": { "width": 6, "height": 5 }, "contrast": {} }"#,
    )
    .unwrap();
    let plain = PipelineConfig {
        slice: volume_slicer::SliceConfig::new(6, 5),
        ..PipelineConfig::default()
    };

    for (name, config) in [("contrast", contrast), ("default", plain)] {
        let outdir = dir.path().join(name);
        let manifest = Pipeline::new(config)
            .unwrap()
            .slice_volume(&input, &outdir)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(manifest.slices.len(), 3, "{name}");

        let (slice, _) =
            volume_slicer::FormatAdapter::read(outdir.join("ct1_1.png")).unwrap();
        assert_eq!(slice.shape(), &[6, 5], "{name}");
        assert!(slice.iter().all(|&v| (0.0..=255.0).contains(&v)), "{name}");
        assert_eq!(slice[[0, 0]], 0.0, "{name}");
    }
}
