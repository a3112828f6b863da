//! End-to-end runs against the real ffmpeg/ffprobe.

use std::process::Command;
use std::sync::Arc;
use venh_media::probe_video;
use venh_models::{EnhancementJobConfig, EnhancerKind, GpenVariant, JobId, RemuxOutcome};
use venh_worker::{EnhancementProcessor, JobContext, PassthroughBackend, WorkerConfig};

/// 10 frames at 30 fps, 640x480, with a sine audio track.
fn generate_source(path: &std::path::Path) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error"])
        .args(["-f", "lavfi", "-i", "testsrc=size=640x480:rate=30"])
        .args(["-f", "lavfi", "-i", "sine=frequency=440:sample_rate=44100"])
        .args(["-frames:v", "10", "-t", "1"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest"])
        .arg(path)
        .status()
        .expect("ffmpeg must be installed");
    assert!(status.success());
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_ten_frame_video_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("face.mp4");
    generate_source(&source);

    let config = WorkerConfig::default().with_work_dir(dir.path().join("work"));
    let processor = EnhancementProcessor::from_config(&config, Arc::new(PassthroughBackend::default()));
    let mut ctx = JobContext::new(JobId::from_string("e2e"), "test", &config);

    let job = EnhancementJobConfig {
        source_path: source.clone(),
        enhancer: EnhancerKind::Gfpgan,
        enhancer_weight: 0.5,
        identity_selection: true,
        gpen_variant: GpenVariant::R256,
        output_path: dir.path().join("out").join("face_enhanced_GFPGAN.mp4"),
    };

    let outcome = processor.process(&mut ctx, &job).await.unwrap();
    let report = ctx.release();

    assert_eq!(outcome.metadata.width, 640);
    assert_eq!(outcome.metadata.height, 480);
    assert_eq!(outcome.metadata.frame_count, 10);
    assert_eq!(outcome.pipeline.frames_processed, 10);
    assert_eq!(outcome.pipeline.frames_fallback, 0);
    assert_eq!(outcome.remux, RemuxOutcome::Merged);
    assert!(report.is_clean());
    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("work"))
        .map(|entries| entries.filter_map(Result::ok).map(|e| e.path()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);

    let result = probe_video(&job.output_path).await.unwrap();
    assert_eq!((result.width, result.height), (640, 480));
    assert_eq!(result.frame_rate.as_f64().round() as u64, 30);
    assert_eq!(result.frame_count, 10);

    let streams = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "a"])
        .args(["-show_entries", "stream=codec_type", "-of", "csv=p=0"])
        .arg(&job.output_path)
        .output()
        .expect("ffprobe must be installed");
    assert!(streams.status.success());
    let streams = String::from_utf8_lossy(&streams.stdout);
    assert!(
        streams.lines().any(|l| l.trim() == "audio"),
        "output has no audio stream: {:?}",
        streams
    );
}
