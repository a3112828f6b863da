use std::path::Path;
use std::process::Command;

use venh_media::resolve_binary;
use venh_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with work_dir={} output_dir={}",
        config.work_dir.display(),
        config.output_dir.display()
    );
    ensure_writable(&config.work_dir).await?;
    ensure_writable(&config.output_dir).await?;
    ensure_tool(&config.ffmpeg_bin)?;
    ensure_tool(&config.ffprobe_bin)?;
    check_models(&config)?;

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_writable(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", path.display(), e))?;

    let probe = path.join(format!(".selfcheck_{}", std::process::id()));
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await.ok();
    Ok(())
}

fn ensure_tool(binary: &str) -> anyhow::Result<()> {
    let program = resolve_binary(binary)?;
    let output = Command::new(&program)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", program.display(), e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            binary,
            output.status
        ));
    }
    Ok(())
}

fn check_models(config: &WorkerConfig) -> anyhow::Result<()> {
    let missing: Vec<_> = [&config.model_dir, &config.faceid_model]
        .into_iter()
        .filter(|p| !p.exists())
        .collect();

    for path in &missing {
        println!("worker-selfcheck: warning: {} not found", path.display());
    }
    if config.require_models && !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "ENHANCER_REQUIRE_MODELS is set but model files are missing"
        ));
    }
    Ok(())
}
