//! Enhance a local video file from the command line.

use anyhow::{Context as _, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use venh_models::job::{default_output_path, DEFAULT_ENHANCER_WEIGHT};
use venh_models::{EnhancementJobConfig, EnhancerKind, GpenVariant, JobId};
use venh_worker::validation::validate_weight;
use venh_worker::{
    init_tracing, EnhancementProcessor, JobContext, PassthroughBackend, WorkerConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "enhance-video",
    version,
    about = "Enhance every frame of a video and reattach its audio",
    after_help = "EXAMPLES:\n  \
                  enhance-video --input clip.mp4\n  \
                  enhance-video --face clip.mp4 --enhancer Codeformer --enhancer-w 0.7\n  \
                  enhance-video --input clip.mp4 --enhancer GPEN --gpen-type 512 --use-faceid"
)]
struct Cli {
    /// Source video
    #[arg(long = "input", visible_alias = "face", value_name = "PATH")]
    input: PathBuf,

    /// Enhancer to apply
    #[arg(long, default_value_t = EnhancerKind::default())]
    enhancer: EnhancerKind,

    /// Blend weight for GFPGAN and Codeformer, 0..1
    #[arg(long = "enhancer-w", default_value_t = DEFAULT_ENHANCER_WEIGHT, value_parser = parse_weight_arg)]
    enhancer_w: f32,

    /// GPEN model resolution
    #[arg(long = "gpen-type", default_value_t = GpenVariant::default())]
    gpen_type: GpenVariant,

    /// Keep the identity-consistent frame using the FaceID model
    #[arg(long = "use-faceid")]
    use_faceid: bool,

    /// Output file (default: <output_dir>/<stem>_enhanced_<Enhancer><ext>)
    #[arg(long, value_name = "PATH")]
    outfile: Option<PathBuf>,
}

fn parse_weight_arg(s: &str) -> Result<f32, String> {
    let w: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    validate_weight(w).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    dotenvy::dotenv().ok();
    init_tracing();

    match run(cli).await {
        Ok(output) => {
            info!("Enhanced video written to {}", output.display());
        }
        Err(e) => {
            error!("Enhancement failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<PathBuf> {
    if !cli.input.is_file() {
        anyhow::bail!("input video not found: {}", cli.input.display());
    }

    let config = WorkerConfig::from_env();
    let output_path = match cli.outfile {
        Some(path) => path,
        None => default_output_path(&config.output_dir, &cli.input, cli.enhancer),
    };

    let job = EnhancementJobConfig {
        source_path: cli.input,
        enhancer: cli.enhancer,
        enhancer_weight: cli.enhancer_w,
        identity_selection: cli.use_faceid,
        gpen_variant: cli.gpen_type,
        output_path,
    };

    let backend = Arc::new(PassthroughBackend::new(config.require_models));
    let processor = EnhancementProcessor::from_config(&config, backend);

    let job_id = JobId::from_string(std::process::id().to_string());
    let mut ctx = JobContext::new(job_id, "enhance_cli", &config);
    ctx.logger.log_start(&format!(
        "{} on {}",
        job.enhancer,
        job.source_path.display()
    ));

    let outcome = processor.process(&mut ctx, &job).await;
    ctx.release();
    let outcome = outcome.context("processing failed")?;

    ctx.logger.log_completion(&format!(
        "{} frames ({} unenhanced), audio {}",
        outcome.pipeline.frames_processed,
        outcome.pipeline.frames_fallback,
        outcome.remux.as_str()
    ));
    Ok(outcome.output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["enhance-video", "--input", "a.mp4"]).unwrap();
        assert_eq!(cli.enhancer, EnhancerKind::Gfpgan);
        assert_eq!(cli.enhancer_w, 0.5);
        assert_eq!(cli.gpen_type, GpenVariant::R256);
        assert!(!cli.use_faceid);
        assert!(cli.outfile.is_none());
    }

    #[test]
    fn test_face_alias_and_options() {
        let cli = Cli::try_parse_from([
            "enhance-video",
            "--face",
            "a.mp4",
            "--enhancer",
            "GPEN",
            "--gpen-type",
            "512",
            "--use-faceid",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("a.mp4"));
        assert_eq!(cli.enhancer, EnhancerKind::Gpen);
        assert_eq!(cli.gpen_type, GpenVariant::R512);
        assert!(cli.use_faceid);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["enhance-video", "--input", "a.mp4", "--enhancer-w", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["enhance-video", "--input", "a.mp4", "--enhancer", "Magic"]).is_err());
        assert!(Cli::try_parse_from(["enhance-video"]).is_err());
    }
}
