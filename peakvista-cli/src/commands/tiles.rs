//! Tiles command - print the tiles a viewpoint needs.

use clap::Args;
use peakvista::mesh::Lod;
use peakvista::select::{TileRequest, ViewportTileSelector};

use super::common::{load_config, resolve_pipeline_config, ViewpointArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct TilesArgs {
    #[command(flatten)]
    pub viewpoint: ViewpointArgs,

    /// Print at most this many tiles
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Run the tiles command.
pub fn run(args: TilesArgs) -> Result<(), CliError> {
    let config = resolve_pipeline_config(&load_config(), &args.viewpoint)?;
    let viewpoint = args.viewpoint.viewpoint()?;
    let selector = ViewportTileSelector::new(config.selector.clone());

    let mut tiles = selector.compute_required_tiles(&viewpoint, config.sampling_zoom)?;
    if let Some(heading) = args.viewpoint.heading {
        tiles = selector.prioritize_by_heading(&tiles, heading);
    }

    println!(
        "Viewpoint {:.6}, {:.6} at zoom {}: {} tiles (radius {})",
        viewpoint.lat,
        viewpoint.lon,
        config.sampling_zoom,
        tiles.len(),
        selector.radius_tiles(&viewpoint, config.sampling_zoom)
    );
    println!("{}", lod_breakdown(&tiles));
    println!();
    println!("{:>5}  {:<18} {:<7} {:>8}", "ORDER", "TILE", "LOD", "DISTANCE");

    let shown = args.limit.unwrap_or(tiles.len());
    for tile in tiles.iter().take(shown) {
        println!(
            "{:>5}  {:<18} {:<7} {:>8.2}",
            tile.priority,
            tile.id.to_string(),
            format!("{:?}", tile.lod),
            tile.distance_tiles
        );
    }
    if shown < tiles.len() {
        println!("  ... {} more", tiles.len() - shown);
    }

    Ok(())
}

fn lod_breakdown(tiles: &[TileRequest]) -> String {
    Lod::ALL
        .iter()
        .rev()
        .map(|lod| {
            let count = tiles.iter().filter(|t| t.lod == *lod).count();
            format!("{:?}: {}", lod, count)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
