use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use merger_core::{ProgressEvent, SelectionError};
use merger_engine::{
    export_artifact, DirectorySource, ExportOptions, FfmpegCodec, FfmpegConcatEngine, Merger,
};
use merger_logging::{merger_debug, merger_info, merger_warn};

use crate::cli::Args;
use crate::{config, scan};

pub(crate) async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = config::load(args.config.as_deref());
    config::apply_args(&mut config, &args);

    let raw = scan::scan_directory(&args.dir)
        .with_context(|| format!("Error reading directory {:?}", args.dir))?;

    let codec = Arc::new(FfmpegCodec::from_settings(&config.ffmpeg));
    let engine = Arc::new(FfmpegConcatEngine::new(codec.clone(), config.ffmpeg.mode));
    let merger = Arc::new(Merger::new(
        config,
        Arc::new(DirectorySource::new(&args.dir)),
        codec,
        engine,
    ));
    merger.on_progress(|event: &ProgressEvent| {
        merger_info!("{} ({:.0}%)", event.message, event.percentage);
    });

    merger
        .wait_until_ready()
        .await
        .context("ffmpeg is not available; install it or pass --ffmpeg")?;

    let selection = match merger.select_files(&raw) {
        Ok(selection) => selection,
        Err(SelectionError::EmptySelection { .. }) => {
            bail!("No video files found in directory {:?}", args.dir)
        }
        Err(err) => return Err(err.into()),
    };
    for rejected in selection.rejected() {
        merger_debug!("Skipping {}: {:?}", rejected.name, rejected.reason);
    }

    println!("Found {} video files to merge:", selection.descriptors().len());
    for name in selection.names() {
        println!("  - {name}");
    }

    let watcher = {
        let merger = Arc::clone(&merger);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                merger_warn!("Interrupted; cancelling merge");
                merger.cancel();
            }
        })
    };
    let result = merger.start_merge().await;
    watcher.abort();
    result.context("Failed to merge videos")?;

    let handle = merger
        .artifact()
        .context("merged artifact was not packaged")?;
    let bytes = merger
        .open_artifact(&handle)
        .context("merged artifact is no longer available")?;

    let (output_dir, output_filename) = split_output(&args.output)?;
    let summary = export_artifact(
        &output_dir,
        &handle,
        &bytes,
        &selection.names(),
        ExportOptions {
            output_filename: Some(output_filename),
            manifest: args.manifest,
        },
    )?;

    println!(
        "\nSuccessfully merged videos into {:?}",
        summary.output_path
    );
    if let Some(manifest) = summary.manifest_path {
        merger_info!("Manifest written to {:?}", manifest);
    }
    Ok(())
}

fn split_output(output: &Path) -> anyhow::Result<(PathBuf, String)> {
    let filename = output
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid output filename {:?}", output))?
        .to_string();
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_output_name_goes_to_current_dir() {
        let (dir, name) = split_output(Path::new("merged.mp4")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "merged.mp4");
    }

    #[test]
    fn nested_output_keeps_parent() {
        let (dir, name) = split_output(Path::new("out/final/merged.mp4")).unwrap();
        assert_eq!(dir, PathBuf::from("out/final"));
        assert_eq!(name, "merged.mp4");
    }

    #[test]
    fn output_without_file_name_is_rejected() {
        assert!(split_output(Path::new("/")).is_err());
    }
}
