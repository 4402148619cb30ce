use std::fs;
use std::path::Path;

use ndarray::{Array2, Array3};
use volume_slicer::{
    Decomposer, Error, FormatAdapter, Header, Reconstructor, SliceConfig, SliceManifest, Volume,
};

fn sample_volume(width: usize, height: usize, depth: usize) -> Volume {
    let data = Array3::from_shape_fn((width, height, depth), |(x, y, z)| {
        ((x * 7 + y * 3 + z * 11) % 256) as f32
    });
    Volume::new(data, Header::None)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_decompose_then_reconstruct_recovers_volume() {
    let dir = tempfile::tempdir().unwrap();
    let volume = sample_volume(6, 5, 4);

    Decomposer::decompose(&volume, "scan1.nii.gz", dir.path(), &SliceConfig::new(6, 5)).unwrap();
    let rebuilt = Reconstructor::reconstruct("scan1", dir.path(), &volume).unwrap();

    assert!(rebuilt.skipped.is_empty());
    assert_eq!(rebuilt.filled, vec![0, 1, 2, 3]);
    assert!(rebuilt.missing().is_empty());
    assert_eq!(rebuilt.volume.data(), volume.data());
}

#[test]
fn test_slice_files_follow_naming_convention() {
    let dir = tempfile::tempdir().unwrap();
    let volume = sample_volume(4, 4, 5);

    Decomposer::decompose(&volume, "scan1.nii", dir.path(), &SliceConfig::new(8, 8)).unwrap();

    assert_eq!(
        file_names(dir.path()),
        vec![
            "scan1.slices.json",
            "scan1_0.png",
            "scan1_1.png",
            "scan1_2.png",
            "scan1_3.png",
            "scan1_4.png",
        ]
    );
}

#[test]
fn test_resampled_slices_come_back_at_original_shape() {
    let dir = tempfile::tempdir().unwrap();
    let volume = sample_volume(6, 5, 3);

    let manifest =
        Decomposer::decompose(&volume, "scan2.gipl", dir.path(), &SliceConfig::new(16, 12)).unwrap();
    assert_eq!(manifest.slice_size, [16, 12]);
    let (slice, _) = FormatAdapter::read(dir.path().join("scan2_0.png")).unwrap();
    assert_eq!(slice.shape(), &[16, 12]);

    let rebuilt = Reconstructor::reconstruct("scan2", dir.path(), &volume).unwrap();
    assert_eq!(rebuilt.volume.dim(), (6, 5, 3));
    for (rebuilt, original) in rebuilt.volume.data().iter().zip(volume.data()) {
        assert!((rebuilt - original).abs() <= 16.0, "{rebuilt} vs {original}");
    }
}

#[test]
fn test_reconstruct_from_file_names_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    // more than ten slices so lexical and numeric order differ
    let data = Array3::from_shape_fn((3, 3, 12), |(_, _, z)| (z * 10) as f32);
    let volume = Volume::new(data, Header::None);

    Decomposer::decompose(&volume, "scan1.nii.gz", dir.path(), &SliceConfig::new(3, 3)).unwrap();
    fs::remove_file(SliceManifest::path_for(dir.path(), "scan1")).unwrap();

    let rebuilt = Reconstructor::reconstruct("scan1", dir.path(), &volume).unwrap();
    assert!(rebuilt.skipped.is_empty());
    for z in 0..12 {
        assert_eq!(rebuilt.volume.data()[[1, 1, z]], (z * 10) as f32, "slice {z}");
    }
}

#[test]
fn test_manifest_indices_win_over_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let volume = sample_volume(3, 3, 2);
    let mut manifest =
        Decomposer::decompose(&volume, "scan1.nii", dir.path(), &SliceConfig::new(3, 3)).unwrap();

    // a consumer renamed the files; only the manifest knows the order
    for (record, name) in manifest.slices.iter_mut().zip(["first.png", "second.png"]) {
        fs::rename(dir.path().join(&record.file), dir.path().join(name)).unwrap();
        record.file = name.to_string();
    }
    manifest.save(dir.path()).unwrap();

    let rebuilt = Reconstructor::reconstruct("scan1", dir.path(), &volume).unwrap();
    assert!(rebuilt.skipped.is_empty());
    assert_eq!(rebuilt.volume.data(), volume.data());
}

#[test]
fn test_bad_slice_files_are_skipped_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let volume = sample_volume(4, 4, 3);
    Decomposer::decompose(&volume, "scan1.nii", dir.path(), &SliceConfig::new(4, 4)).unwrap();
    fs::remove_file(SliceManifest::path_for(dir.path(), "scan1")).unwrap();
    fs::remove_file(dir.path().join("scan1_1.png")).unwrap();

    let slice = Array2::<f32>::from_elem((4, 4), 9.0);
    for name in ["scan1_abc.png", "scan1_99.png", "scan10_0.png", "other_0.png"] {
        FormatAdapter::write(dir.path().join(name), &slice, &Header::None).unwrap();
    }

    let rebuilt = Reconstructor::reconstruct("scan1", dir.path(), &volume).unwrap();

    assert_eq!(rebuilt.filled, vec![0, 2]);
    assert_eq!(rebuilt.missing(), vec![1]);
    assert!(rebuilt.volume.data().index_axis(ndarray::Axis(2), 1).iter().all(|&v| v == 0.0));

    let reason = |name: &str| {
        rebuilt
            .skipped
            .iter()
            .find(|skip| skip.path.file_name().unwrap() == name)
            .map(|skip| &skip.reason)
    };
    assert!(matches!(reason("scan1_abc.png"), Some(Error::MalformedSliceName { .. })));
    assert!(matches!(
        reason("scan1_99.png"),
        Some(Error::SliceIndexOutOfRange { index: 99, depth: 3, .. })
    ));
    assert!(matches!(reason("scan10_0.png"), Some(Error::StemMismatch { .. })));
    assert!(reason("other_0.png").is_none());
    assert_eq!(rebuilt.skipped.len(), 3);
}

#[test]
fn test_duplicate_indices_keep_one_slice() {
    let dir = tempfile::tempdir().unwrap();
    let volume = sample_volume(3, 3, 2);
    Decomposer::decompose(&volume, "scan1.nii", dir.path(), &SliceConfig::new(3, 3)).unwrap();
    fs::remove_file(SliceManifest::path_for(dir.path(), "scan1")).unwrap();
    fs::copy(dir.path().join("scan1_0.png"), dir.path().join("scan1_00.png")).unwrap();

    let rebuilt = Reconstructor::reconstruct("scan1", dir.path(), &volume).unwrap();

    assert_eq!(rebuilt.filled, vec![0, 1]);
    assert_eq!(rebuilt.skipped.len(), 1);
    assert!(matches!(
        rebuilt.skipped[0].reason,
        Error::DuplicateSliceIndex { index: 0, .. }
    ));
    assert_eq!(rebuilt.volume.data(), volume.data());
}

#[test]
fn test_reconstruct_into_writes_named_output() {
    let slices = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let volume = sample_volume(4, 3, 2);
    Decomposer::decompose(&volume, "case7.nrrd", slices.path(), &SliceConfig::new(4, 3)).unwrap();

    let (path, _) =
        Reconstructor::reconstruct_into("case7", slices.path(), &volume, out.path().join("pred"), ".nrrd.gz")
            .unwrap();

    assert_eq!(path, out.path().join("pred").join("case7.nrrd.gz"));
    assert_eq!(Volume::read(&path).unwrap().data(), volume.data());
}
