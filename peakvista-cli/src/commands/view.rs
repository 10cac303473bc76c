//! View command - load the terrain around a viewpoint once.

use std::collections::{BTreeMap, HashMap};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use peakvista::config::format_size;
use peakvista::mesh::Lod;
use peakvista::pipeline::{PipelineEvent, TerrainPipeline};
use peakvista::provider::ReqwestClient;
use peakvista::select::ViewportTileSelector;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::common::{load_config, resolve_pipeline_config, ViewpointArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub viewpoint: ViewpointArgs,

    /// Ground elevation of the viewpoint in meters
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub elevation: f64,

    /// Keep tiles in memory only, bypassing the disk cache
    #[arg(long)]
    pub no_disk_cache: bool,
}

/// Run the view command.
pub fn run(args: ViewArgs) -> Result<(), CliError> {
    let mut config = resolve_pipeline_config(&load_config(), &args.viewpoint)?;
    if args.no_disk_cache {
        config.cache.directory = None;
    }
    let viewpoint = args
        .viewpoint
        .viewpoint()?
        .with_ground_elevation(args.elevation);

    let expected = ViewportTileSelector::new(config.selector.clone())
        .compute_required_tiles(&viewpoint, config.sampling_zoom)?
        .len()
        .min(config.device_limits.max_resident_tiles);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async move {
        let client = ReqwestClient::new(config.fetch.timeout)?;
        let pipeline = TerrainPipeline::new(client, config)?;

        let progress = progress_bar(expected as u64);
        let tracker = tokio::spawn(track(pipeline.subscribe(), progress.clone()));

        info!(lat = viewpoint.lat, lon = viewpoint.lon, "Loading view");
        let summary = pipeline.load_view_at(viewpoint).await?;

        let resident = pipeline.resident_tiles();
        let stats = pipeline.cache().stats();
        let disk = pipeline.cache().persistent_summary().await;
        drop(pipeline);
        let triangles = match tracker.await {
            Ok(triangles) => triangles,
            Err(e) => {
                warn!(error = %e, "Progress tracker failed");
                0
            }
        };
        progress.finish_and_clear();

        println!("{}", summary);
        println!();
        println!("Resident tiles by LOD:");
        let mut by_lod: BTreeMap<Lod, usize> = BTreeMap::new();
        for (_, lod) in &resident {
            *by_lod.entry(*lod).or_default() += 1;
        }
        for (lod, count) in by_lod.iter().rev() {
            println!("  {:<7} {}", format!("{:?}", lod), count);
        }
        println!("Triangles: {}", triangles);
        println!("Cache: {}", stats);
        if let Some(disk) = disk {
            println!("Disk cache: {} tiles, {}", disk.entries, format_size(disk.bytes));
        }

        Ok::<(), CliError>(())
    })
}

/// Advances the bar per newly loaded tile until the pipeline is dropped.
/// Returns the triangle count of the meshes still resident at the end.
async fn track(mut events: mpsc::UnboundedReceiver<PipelineEvent>, progress: ProgressBar) -> usize {
    let mut triangles = HashMap::new();
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::TileLoaded { id, mesh, .. } => {
                if triangles.insert(id, mesh.triangle_count()).is_none() {
                    progress.set_message(id.to_string());
                    progress.inc(1);
                }
            }
            PipelineEvent::TileEvicted { id } => {
                triangles.remove(&id);
            }
            PipelineEvent::ViewCompleted(_) => progress.set_message("done"),
        }
    }
    triangles.values().sum()
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")
    {
        bar.set_style(style);
    }
    bar
}
