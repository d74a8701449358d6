use std::path::Path;
use std::sync::{Arc, Mutex};

use super::*;
use crate::backend::cpu::CpuBackend;
use crate::error::{ConfigError, Error};
use crate::opacity::{FadeMode, FadeSettings};
use crate::progress::StackingProgress;
use crate::skyglow::SkyglowLevel;
use crate::testing::{RecordingBackend, init_tracing, read_rgb8, to_rgb8, write_rgb, write_solid};

/// One star per frame, at x = frame number, on a black 4x1 sky.
fn write_moving_star(dir: &Path, frames: u32) {
    for i in 0..frames {
        write_rgb(&dir.join(format!("IMG_{i:04}.png")), 4, 1, |x, _| {
            if x == i { [255; 3] } else { [0; 3] }
        });
    }
}

fn red_channel(pixels: &[u8]) -> Vec<u8> {
    pixels.iter().step_by(3).copied().collect()
}

#[test]
fn test_single_frame_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_rgb(&dir.path().join("only.png"), 5, 3, |x, y| {
        [(x * 40) as u8, (y * 70) as u8, 9]
    });

    let mut backend = CpuBackend::new();
    let outcome = run(&mut backend, &StartrailConfig::new(dir.path())).unwrap();

    let image = outcome.into_composite().unwrap();
    assert_eq!(to_rgb8(&image), read_rgb8(&path));
}

#[test]
fn test_empty_directory_reports_no_images() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not a frame").unwrap();

    let mut backend = RecordingBackend::default();
    let outcome = run(&mut backend, &StartrailConfig::new(dir.path())).unwrap();

    assert!(matches!(outcome, StackOutcome::NoImages));
    assert_eq!(outcome.reason(), Some("No images found to stack"));
    assert!(backend.loads.is_empty());
    assert_eq!(backend.canvases, 0);
}

#[test]
fn test_config_errors_before_any_load() {
    let dir = tempfile::tempdir().unwrap();
    write_solid(&dir.path().join("a.png"), 2, 2, 50);

    let mut config = StartrailConfig::new(dir.path());
    config.dark_frames = Some(dir.path().join("no_darks"));

    let mut backend = RecordingBackend::default();
    let err = run(&mut backend, &config).unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::DarkFramePathNotFound(_))
    ));
    assert_eq!(err.to_string(), "Dark frame path doesn't exist.");
    assert!(backend.loads.is_empty());
}

#[test]
fn test_lighten_accumulates_trail() {
    let dir = tempfile::tempdir().unwrap();
    write_moving_star(dir.path(), 3);

    let mut backend = CpuBackend::new();
    let image = run(&mut backend, &StartrailConfig::new(dir.path()))
        .unwrap()
        .into_composite()
        .unwrap();

    assert_eq!(red_channel(&to_rgb8(&image)), [255, 255, 255, 0]);
}

#[test]
fn test_fade_out_dims_later_frames() {
    let dir = tempfile::tempdir().unwrap();
    write_moving_star(dir.path(), 3);

    let mut config = StartrailConfig::new(dir.path());
    config.fade = FadeSettings::new(FadeMode::Out, 100, 100);

    let mut backend = CpuBackend::new();
    let image = run(&mut backend, &config).unwrap().into_composite().unwrap();

    // opacities 100, 66.7, 33.3
    assert_eq!(red_channel(&to_rgb8(&image)), [255, 170, 85, 0]);
}

#[test]
fn test_fade_in_walks_frames_backwards() {
    let dir = tempfile::tempdir().unwrap();
    write_moving_star(dir.path(), 3);

    let mut config = StartrailConfig::new(dir.path());
    config.fade = FadeSettings::new(FadeMode::In, 100, 100);

    let mut backend = RecordingBackend::default();
    let image = run(&mut backend, &config).unwrap().into_composite().unwrap();

    let loaded: Vec<_> = backend
        .loads
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(loaded, ["IMG_0002.png", "IMG_0001.png", "IMG_0000.png"]);
    assert_eq!(red_channel(&to_rgb8(&image)), [85, 170, 255, 0]);
}

#[test]
fn test_in_and_out_keeps_black_base_layer() {
    let dir = tempfile::tempdir().unwrap();
    write_moving_star(dir.path(), 3);

    let mut config = StartrailConfig::new(dir.path());
    config.merge_layers = false;
    config.fade = FadeSettings::new(FadeMode::InAndOut, 50, 50);

    let mut backend = CpuBackend::new();
    let image = run(&mut backend, &config).unwrap().into_composite().unwrap();

    assert_eq!(
        image.layer_names(),
        ["layer_black", "layer 00001", "layer 00002", "layer 00003"]
    );
    // never-lit pixel stays black
    assert_eq!(image.composite_pixel(3, 0), [0.0; 3]);
}

#[test]
fn test_unmerged_run_matches_merged_run() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..4u32 {
        write_rgb(&dir.path().join(format!("{i}.png")), 6, 4, |x, y| {
            [((x * 37 + i * 50) % 256) as u8, ((y * 60 + i * 13) % 256) as u8, (i * 20) as u8]
        });
    }

    let mut merged = StartrailConfig::new(dir.path());
    merged.fade = FadeSettings::new(FadeMode::Out, 100, 60);
    let mut unmerged = merged.clone();
    unmerged.merge_layers = false;

    let mut backend = CpuBackend::new();
    let a = run(&mut backend, &merged).unwrap().into_composite().unwrap();
    let b = run(&mut backend, &unmerged).unwrap().into_composite().unwrap();

    assert_eq!(a.layers().len(), 1);
    assert_eq!(b.layers().len(), 4);
    for (x, y) in a.composite().iter().zip(b.composite()) {
        assert!((x - y).abs() < 1e-6);
    }
}

#[test]
fn test_intermediate_frames_are_numbered() {
    let lights = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_moving_star(lights.path(), 3);

    let mut config = StartrailConfig::new(lights.path());
    config.intermediate_dir = Some(out.path().to_path_buf());

    let mut backend = CpuBackend::new();
    run(&mut backend, &config).unwrap();

    let mut names: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["trail00001.jpg", "trail00002.jpg", "trail00003.jpg"]);
    assert_eq!(intermediate_file_name(99_998), "trail99999.jpg");
}

#[test]
fn test_live_display_does_not_change_result() {
    let lights = tempfile::tempdir().unwrap();
    let preview = tempfile::tempdir().unwrap();
    write_moving_star(lights.path(), 3);

    let mut config = StartrailConfig::new(lights.path());
    let mut backend = CpuBackend::new();
    let quiet = run(&mut backend, &config).unwrap().into_composite().unwrap();

    config.live_display = true;
    let mut backend = RecordingBackend {
        inner: CpuBackend::new().with_preview(preview.path().join("preview.png")),
        ..RecordingBackend::default()
    };
    let live = run(&mut backend, &config).unwrap().into_composite().unwrap();

    assert_eq!(quiet.composite(), live.composite());
    // once per frame plus the final refresh
    assert_eq!(backend.presents, 4);
    assert!(preview.path().join("preview.png").is_file());
}

#[test]
fn test_dark_frames_are_subtracted() {
    let lights = tempfile::tempdir().unwrap();
    let darks = tempfile::tempdir().unwrap();
    write_solid(&lights.path().join("l1.png"), 3, 3, 120);
    write_solid(&lights.path().join("l2.png"), 3, 3, 100);
    write_solid(&darks.path().join("d1.png"), 3, 3, 10);
    write_solid(&darks.path().join("d2.png"), 3, 3, 30);

    let mut config = StartrailConfig::new(lights.path());
    config.dark_frames = Some(darks.path().to_path_buf());

    let mut backend = RecordingBackend::default();
    let image = run(&mut backend, &config).unwrap().into_composite().unwrap();

    // max(120, 100) - mean(10, 30)
    assert!(to_rgb8(&image).iter().all(|&v| v == 100));
    assert_eq!(backend.loads.len(), 4);
}

#[test]
fn test_empty_dark_directory_disables_subtraction() {
    init_tracing();
    let lights = tempfile::tempdir().unwrap();
    let darks = tempfile::tempdir().unwrap();
    write_solid(&lights.path().join("l1.png"), 2, 2, 77);

    let mut config = StartrailConfig::new(lights.path());
    config.dark_frames = Some(darks.path().to_path_buf());

    let mut backend = CpuBackend::new();
    let image = run(&mut backend, &config).unwrap().into_composite().unwrap();

    assert!(to_rgb8(&image).iter().all(|&v| v == 77));
}

#[test]
fn test_skyglow_full_on_uniform_frames_is_black() {
    let dir = tempfile::tempdir().unwrap();
    write_solid(&dir.path().join("a.png"), 8, 6, 90);
    write_solid(&dir.path().join("b.png"), 8, 6, 140);

    let mut config = StartrailConfig::new(dir.path());
    config.skyglow = SkyglowLevel::Full;

    let mut backend = CpuBackend::new();
    let image = run(&mut backend, &config).unwrap().into_composite().unwrap();

    assert!(to_rgb8(&image).iter().all(|&v| v == 0));
}

#[test]
fn test_progress_reports_each_stage() {
    let lights = tempfile::tempdir().unwrap();
    let darks = tempfile::tempdir().unwrap();
    write_moving_star(lights.path(), 3);
    write_solid(&darks.path().join("d1.png"), 4, 1, 0);
    write_solid(&darks.path().join("d2.png"), 4, 1, 0);

    let mut config = StartrailConfig::new(lights.path());
    config.dark_frames = Some(darks.path().to_path_buf());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress = ProgressCallback::new(Arc::new(move |p: StackingProgress| {
        sink.lock().unwrap().push((p.stage, p.current, p.total));
    }));

    let mut backend = CpuBackend::new();
    run_with_progress(&mut backend, &config, &progress).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        [
            (StackingStage::DarkFrames, 1, 2),
            (StackingStage::DarkFrames, 2, 2),
            (StackingStage::LightFrames, 1, 3),
            (StackingStage::LightFrames, 2, 3),
            (StackingStage::LightFrames, 3, 3),
        ]
    );
}

#[test]
fn test_corrupt_frame_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    write_solid(&dir.path().join("a.png"), 2, 2, 50);
    std::fs::write(dir.path().join("b.png"), b"garbage").unwrap();
    write_solid(&dir.path().join("c.png"), 2, 2, 50);

    let mut backend = RecordingBackend::default();
    let err = run(&mut backend, &StartrailConfig::new(dir.path())).unwrap_err();

    assert!(matches!(err, Error::ImageLoad { ref path, .. } if path.ends_with("b.png")));
    // the third frame is never attempted
    assert_eq!(backend.loads.len(), 2);
}

#[test]
fn test_size_mismatch_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    write_solid(&dir.path().join("a.png"), 2, 2, 50);
    write_solid(&dir.path().join("b.png"), 3, 2, 50);

    let mut backend = CpuBackend::new();
    let err = run(&mut backend, &StartrailConfig::new(dir.path())).unwrap_err();

    assert!(matches!(err, Error::DimensionMismatch { index: 1, .. }));
}
