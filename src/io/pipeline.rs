//! Generation run: read sources, build samples in parallel, write outputs

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;

use crate::core::{Error, Result};
use crate::gltf::Gltf;
use crate::samples::{self, SampleConfig, SampleKind};
use super::disk::{read_assets, write_sample};

/// Outcome of a run, one entry per requested sample
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<(SampleKind, Vec<PathBuf>)>,
    pub failed: Vec<(SampleKind, Error)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generate and write `kinds`.
///
/// A sample whose sources cannot be read, whose generation fails or whose
/// output cannot be written is reported in [`RunSummary::failed`]; the
/// other samples are unaffected.
pub async fn run(config: &SampleConfig, kinds: &[SampleKind]) -> RunSummary {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    let mut inputs: Vec<(SampleKind, Result<Vec<Gltf>>)> = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let paths: Vec<PathBuf> = kind.sources().iter().map(|stem| config.source_path(stem)).collect();
        inputs.push((kind, read_assets(&paths).await));
    }

    let generate_config = config.clone();
    let generated = tokio::task::spawn_blocking(move || {
        inputs
            .into_par_iter()
            .map(|(kind, assets)| (kind, assets.and_then(|a| samples::generate(kind, &generate_config, a))))
            .collect::<Vec<_>>()
    })
    .await;

    let generated = match generated {
        Ok(generated) => generated,
        Err(e) => {
            log::warn!("Sample generation task failed: {}", e);
            for &kind in kinds {
                summary.failed.push((kind, Error::Io(std::io::Error::other(e.to_string()))));
            }
            return summary;
        }
    };

    for (kind, result) in generated {
        let written = match result {
            Ok(output) => write_sample(config, &output).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(paths) => {
                log::info!("{}: wrote {} files to {}", kind, paths.len(), config.sample_dir(kind.name()).display());
                summary.written.push((kind, paths));
            }
            Err(e) => {
                log::warn!("{}: skipped ({})", kind, e);
                summary.failed.push((kind, e));
            }
        }
    }

    log::info!(
        "Generated {}/{} samples in {:.2}s",
        summary.written.len(),
        kinds.len(),
        start.elapsed().as_secs_f64()
    );
    summary
}
