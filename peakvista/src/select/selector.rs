//! Viewport tile selection and ordering.

use super::types::{heading_vector, TileRequest, Viewpoint};
use crate::coord::{tile_width_meters, CoordError, TileId};
use crate::mesh::Lod;

/// Default upper bound of normalised distance for [`Lod::Fine`].
pub const DEFAULT_FINE_THRESHOLD: f64 = 1.0 / 3.0;

/// Default upper bound of normalised distance for [`Lod::Medium`].
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 2.0 / 3.0;

/// Default weight of heading alignment against distance.
pub const DEFAULT_HEADING_WEIGHT: f64 = 1.0;

/// Largest selection radius, in tiles.
pub const DEFAULT_MAX_RADIUS_TILES: u32 = 64;

/// Selector tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    /// Fixed tile width in meters. `None` derives it from the viewpoint's
    /// latitude.
    pub meters_per_tile: Option<f64>,
    pub fine_threshold: f64,
    pub medium_threshold: f64,
    pub heading_weight: f64,
    pub max_radius_tiles: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            meters_per_tile: None,
            fine_threshold: DEFAULT_FINE_THRESHOLD,
            medium_threshold: DEFAULT_MEDIUM_THRESHOLD,
            heading_weight: DEFAULT_HEADING_WEIGHT,
            max_radius_tiles: DEFAULT_MAX_RADIUS_TILES,
        }
    }
}

/// Chooses which tiles a viewpoint needs, at which LOD, in which order.
#[derive(Debug, Clone, Default)]
pub struct ViewportTileSelector {
    config: SelectorConfig,
}

impl ViewportTileSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Selection radius in whole tiles for a viewpoint at `zoom`.
    pub fn radius_tiles(&self, viewpoint: &Viewpoint, zoom: u8) -> u32 {
        let meters_per_tile = self
            .config
            .meters_per_tile
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or_else(|| tile_width_meters(viewpoint.lat, zoom));

        let radius = (viewpoint.view_distance_m() / meters_per_tile).ceil();
        if !radius.is_finite() || radius <= 0.0 {
            return 0;
        }
        (radius as u32).min(self.config.max_radius_tiles)
    }

    /// LOD for a normalised distance in `[0, 1]`.
    pub fn lod_for(&self, normalized_distance: f64) -> Lod {
        if normalized_distance <= self.config.fine_threshold {
            Lod::Fine
        } else if normalized_distance <= self.config.medium_threshold {
            Lod::Medium
        } else {
            Lod::Coarse
        }
    }

    /// Every in-range tile within the view radius of the viewpoint's tile,
    /// nearest first.
    ///
    /// Tiles that would fall outside `[0, 2^zoom)` are dropped rather than
    /// wrapped, so each returned id is unique.
    pub fn compute_required_tiles(
        &self,
        viewpoint: &Viewpoint,
        zoom: u8,
    ) -> Result<Vec<TileRequest>, CoordError> {
        let center = TileId::from_lat_lon(viewpoint.lat, viewpoint.lon, zoom)?;
        let radius = self.radius_tiles(viewpoint, zoom) as i64;
        let radius_f = radius as f64;

        let mut tiles = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let distance = ((dx * dx + dy * dy) as f64).sqrt();
                if distance > radius_f {
                    continue;
                }
                let Some(id) = center.neighbor(dx, dy) else {
                    continue;
                };

                let normalized = if radius == 0 { 0.0 } else { distance / radius_f };
                tiles.push(TileRequest {
                    id,
                    lod: self.lod_for(normalized),
                    priority: 0,
                    distance_tiles: distance,
                    normalized_distance: normalized,
                    offset: (dx, dy),
                });
            }
        }

        tiles.sort_by(|a, b| {
            a.distance_tiles
                .total_cmp(&b.distance_tiles)
                .then_with(|| a.id.cmp(&b.id))
        });
        assign_priorities(&mut tiles);
        Ok(tiles)
    }

    /// Reorders `tiles` so those ahead of `heading_deg` come first.
    ///
    /// Score is `normalized_distance - heading_weight * alignment`,
    /// ascending. The set of tiles and their LODs are unchanged.
    pub fn prioritize_by_heading(&self, tiles: &[TileRequest], heading_deg: f64) -> Vec<TileRequest> {
        let heading = heading_vector(heading_deg);
        let weight = self.config.heading_weight;

        let mut scored: Vec<(f64, TileRequest)> = tiles
            .iter()
            .map(|t| (t.normalized_distance - weight * t.heading_alignment(heading), *t))
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sa.total_cmp(sb)
                .then_with(|| a.distance_tiles.total_cmp(&b.distance_tiles))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut ordered: Vec<TileRequest> = scored.into_iter().map(|(_, t)| t).collect();
        assign_priorities(&mut ordered);
        ordered
    }
}

fn assign_priorities(tiles: &mut [TileRequest]) {
    for (rank, tile) in tiles.iter_mut().enumerate() {
        tile.priority = rank as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{lat_lon_to_tile_x, lat_lon_to_tile_y, tiles_per_side};
    use std::collections::HashSet;

    const FUJI: (f64, f64) = (35.360556, 138.727778);

    fn fuji() -> Viewpoint {
        Viewpoint::new(FUJI.0, FUJI.1).with_view_distance_km(10.0)
    }

    fn fixed_width(meters: f64) -> ViewportTileSelector {
        ViewportTileSelector::new(SelectorConfig {
            meters_per_tile: Some(meters),
            ..Default::default()
        })
    }

    #[test]
    fn test_fuji_ten_km_at_zoom_14() {
        let selector = ViewportTileSelector::default();
        let tiles = selector.compute_required_tiles(&fuji(), 14).unwrap();

        let cx = lat_lon_to_tile_x(FUJI.1, 14).floor() as u32;
        let cy = lat_lon_to_tile_y(FUJI.0, 14).floor() as u32;
        assert_eq!((cx, cy), (14505, 6469));

        assert!(tiles.iter().any(|t| t.id.x == cx && t.id.y == cy));
        assert_eq!(tiles[0].id, TileId::new(14, cx, cy).unwrap());
        assert_eq!(tiles[0].lod, Lod::Fine);

        let n = tiles_per_side(14);
        for t in &tiles {
            assert!(t.lod.index() <= 2);
            assert!(t.id.x < n && t.id.y < n);
            assert_eq!(t.id.zoom, 14);
        }

        // ~1995 m tiles: 10 km needs a radius of 6.
        assert_eq!(selector.radius_tiles(&fuji(), 14), 6);
        assert!(tiles.iter().all(|t| t.distance_tiles <= 6.0));
    }

    #[test]
    fn test_no_duplicates_and_ordered_by_distance() {
        let tiles = ViewportTileSelector::default()
            .compute_required_tiles(&fuji(), 14)
            .unwrap();

        let unique: HashSet<TileId> = tiles.iter().map(|t| t.id).collect();
        assert_eq!(unique.len(), tiles.len());

        for pair in tiles.windows(2) {
            assert!(pair[0].distance_tiles <= pair[1].distance_tiles);
            assert_eq!(pair[0].priority + 1, pair[1].priority);
        }
    }

    #[test]
    fn test_lod_buckets_by_normalized_distance() {
        // 9 km over 1 km tiles: radius 9, buckets at 3 and 6 tiles.
        let vp = Viewpoint::new(0.0, 0.0).with_view_distance_km(9.0);
        let tiles = fixed_width(1000.0).compute_required_tiles(&vp, 10).unwrap();

        let lod_at = |dx: i64, dy: i64| tiles.iter().find(|t| t.offset == (dx, dy)).unwrap().lod;
        assert_eq!(lod_at(0, 0), Lod::Fine);
        assert_eq!(lod_at(3, 0), Lod::Fine);
        assert_eq!(lod_at(4, 0), Lod::Medium);
        assert_eq!(lod_at(0, -6), Lod::Medium);
        assert_eq!(lod_at(7, 0), Lod::Coarse);
        assert_eq!(lod_at(-9, 0), Lod::Coarse);
        assert!(tiles.iter().all(|t| t.offset != (7, 7)));
    }

    #[test]
    fn test_edge_of_world_discards_out_of_range() {
        let vp = Viewpoint::new(85.0, -180.0).with_view_distance_km(3.0);
        let tiles = fixed_width(1000.0).compute_required_tiles(&vp, 4).unwrap();

        assert_eq!(tiles[0].id, TileId::new(4, 0, 0).unwrap());
        for t in &tiles {
            assert!(t.offset.0 >= 0 && t.offset.1 >= 0);
        }
        // Quarter disc of radius 3: 11 tiles.
        assert_eq!(tiles.len(), 11);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        let tiles = ViewportTileSelector::default()
            .compute_required_tiles(&fuji(), 0)
            .unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].id, TileId::new(0, 0, 0).unwrap());
    }

    #[test]
    fn test_zero_distance_only_center() {
        let vp = fuji().with_view_distance_km(0.0);
        let tiles = ViewportTileSelector::default()
            .compute_required_tiles(&vp, 14)
            .unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].lod, Lod::Fine);
    }

    #[test]
    fn test_radius_capped() {
        let vp = Viewpoint::new(0.0, 0.0).with_view_distance_km(10_000.0);
        let selector = ViewportTileSelector::default();
        assert_eq!(selector.radius_tiles(&vp, 14), DEFAULT_MAX_RADIUS_TILES);
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let result = ViewportTileSelector::default().compute_required_tiles(&fuji(), 30);
        assert!(result.is_err());
    }

    #[test]
    fn test_heading_puts_tiles_ahead_first() {
        let selector = ViewportTileSelector::default();
        let tiles = selector.compute_required_tiles(&fuji(), 14).unwrap();

        let east = selector.prioritize_by_heading(&tiles, 90.0);
        assert_eq!(east[0].offset, (0, 0));
        assert_eq!(east[1].offset, (1, 0));
        assert!(east[..8].iter().skip(1).all(|t| t.offset.0 > 0));

        let north = selector.prioritize_by_heading(&tiles, 0.0);
        assert_eq!(north[1].offset, (0, -1));
    }

    #[test]
    fn test_heading_keeps_set_and_lods() {
        let selector = ViewportTileSelector::default();
        let tiles = selector.compute_required_tiles(&fuji(), 14).unwrap();
        let reordered = selector.prioritize_by_heading(&tiles, 217.0);

        assert_eq!(reordered.len(), tiles.len());
        let before: HashSet<(TileId, Lod)> = tiles.iter().map(|t| (t.id, t.lod)).collect();
        let after: HashSet<(TileId, Lod)> = reordered.iter().map(|t| (t.id, t.lod)).collect();
        assert_eq!(before, after);

        let mut sorted = reordered.clone();
        sorted.sort_by_key(|t| t.priority);
        assert_eq!(sorted, reordered);
    }
}
