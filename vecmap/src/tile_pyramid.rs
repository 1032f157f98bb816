//! [`TilePyramid`] converts between map coordinates and the tile grids of a zoom level pyramid.

use serde::{Deserialize, Serialize};
use vecmap_types::{Point, Rectangle};

use crate::error::VecmapError;

/// Maximum zoom level a pyramid can have. Tile indices of this level still fit into `i32`.
pub const MAX_ZOOM: u32 = 30;

const WEB_MERCATOR_HALF_WIDTH: f64 = 20037508.342789244;

/// Direction of the Y index of tiles.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum VerticalDirection {
    /// Tiles with `Y == 0` are at the top of the map (slippy maps, Google, Bing).
    #[default]
    TopToBottom,
    /// Tiles with `Y == 0` are at the bottom of the map (TMS).
    BottomToTop,
}

/// Tile index.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Inclusive rectangular range of tile indices of one zoom level.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct TileRange {
    /// Zoom level of the tiles.
    pub z: u32,
    /// Minimum X index.
    pub x_min: i32,
    /// Minimum Y index.
    pub y_min: i32,
    /// Maximum X index.
    pub x_max: i32,
    /// Maximum Y index.
    pub y_max: i32,
}

impl TileRange {
    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        let columns = (self.x_max - self.x_min + 1) as usize;
        let rows = (self.y_max - self.y_min + 1) as usize;
        columns * rows
    }

    /// Always false, a range contains at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the tile belongs to the range.
    pub fn contains(&self, index: &TileIndex) -> bool {
        index.z == self.z
            && (self.x_min..=self.x_max).contains(&index.x)
            && (self.y_min..=self.y_max).contains(&index.y)
    }

    /// Iterates over the tiles of the range row by row.
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> {
        let TileRange {
            z,
            x_min,
            y_min,
            x_max,
            y_max,
        } = *self;
        (y_min..=y_max).flat_map(move |y| (x_min..=x_max).map(move |x| TileIndex { x, y, z }))
    }
}

/// Map extent of a tile together with the size of its canvas.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileExtent {
    /// Map area drawn on the tile, including the bleed margin.
    pub map_rect: Rectangle,
    /// Width of the tile canvas in pixels, including the bleed margin.
    pub pixel_width: u32,
    /// Height of the tile canvas in pixels, including the bleed margin.
    pub pixel_height: u32,
    /// Width of the margin on each side of the tile in pixels.
    pub bleed: u32,
}

/// Parameters of a [`TilePyramid`].
///
/// All fields except `world_extent` have default values, so a configuration can be as short as:
///
/// ```json
/// { "world_extent": { "min": { "x": 0, "y": 0 }, "max": { "x": 1024, "y": 1024 } }, "max_zoom": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePyramidConfig {
    /// Map area covered by the single tile of zoom level 0.
    pub world_extent: Rectangle,
    /// Size of the (square) tiles in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Minimum zoom level.
    #[serde(default)]
    pub min_zoom: u32,
    /// Maximum zoom level.
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u32,
    /// Direction of the Y index.
    #[serde(default)]
    pub y_direction: VerticalDirection,
    /// Number of extra pixels drawn around each side of a tile.
    #[serde(default)]
    pub bleed: u32,
}

fn default_tile_size() -> u32 {
    256
}

fn default_max_zoom() -> u32 {
    18
}

impl TilePyramidConfig {
    /// Creates a configuration with default parameters for the given world extent.
    pub fn new(world_extent: Rectangle) -> Self {
        Self {
            world_extent,
            tile_size: default_tile_size(),
            min_zoom: 0,
            max_zoom: default_max_zoom(),
            y_direction: VerticalDirection::default(),
            bleed: 0,
        }
    }

    fn validate(&self) -> Result<(), VecmapError> {
        if self.tile_size == 0 {
            return Err(VecmapError::InvalidConfig(
                "tile size must be positive".into(),
            ));
        }

        if self.min_zoom > self.max_zoom {
            return Err(VecmapError::InvalidConfig(format!(
                "min zoom {} is greater than max zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }

        if self.max_zoom > MAX_ZOOM {
            return Err(VecmapError::InvalidConfig(format!(
                "max zoom {} is greater than {MAX_ZOOM}",
                self.max_zoom
            )));
        }

        let extent = &self.world_extent;
        let is_finite = extent.min.is_finite() && extent.max.is_finite();
        if !is_finite || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(VecmapError::InvalidConfig(format!(
                "world extent {extent:?} is empty"
            )));
        }

        canvas_size(self.tile_size, self.bleed)?;

        Ok(())
    }
}

/// Size of a tile canvas with the bleed margin on both sides.
fn canvas_size(tile_size: u32, bleed: u32) -> Result<u32, VecmapError> {
    bleed
        .checked_mul(2)
        .and_then(|margins| margins.checked_add(tile_size))
        .ok_or_else(|| {
            VecmapError::InvalidConfig(format!(
                "bleed {bleed} is too large for tile size {tile_size}"
            ))
        })
}

impl From<TilePyramid> for TilePyramidConfig {
    fn from(value: TilePyramid) -> Self {
        Self {
            world_extent: value.world_extent,
            tile_size: value.tile_size,
            min_zoom: value.min_zoom,
            max_zoom: value.max_zoom,
            y_direction: value.y_direction,
            bleed: value.bleed,
        }
    }
}

/// Square tile grids of zoom levels `min_zoom..=max_zoom`.
///
/// Zoom level `z` splits the world extent into `2^z x 2^z` tiles of `tile_size` pixels. Operations that receive a
/// zoom level outside of the pyramid range fail with [`VecmapError::ZoomOutOfRange`]; zoom levels are never
/// clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TilePyramidConfig", into = "TilePyramidConfig")]
pub struct TilePyramid {
    world_extent: Rectangle,
    tile_size: u32,
    min_zoom: u32,
    max_zoom: u32,
    y_direction: VerticalDirection,
    bleed: u32,
}

impl TryFrom<TilePyramidConfig> for TilePyramid {
    type Error = VecmapError;

    fn try_from(value: TilePyramidConfig) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TilePyramid {
    /// Creates a pyramid, checking that the configuration is consistent.
    pub fn new(config: TilePyramidConfig) -> Result<Self, VecmapError> {
        config.validate()?;

        Ok(Self {
            world_extent: config.world_extent,
            tile_size: config.tile_size,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            y_direction: config.y_direction,
            bleed: config.bleed,
        })
    }

    /// Standard Web Mercator pyramid (used, for example, by OSM and Google maps) with zoom levels
    /// `0..=max_zoom`. `max_zoom` is limited to [`MAX_ZOOM`].
    pub fn web(max_zoom: u32) -> Self {
        Self {
            world_extent: Rectangle::from_coords(
                -WEB_MERCATOR_HALF_WIDTH,
                -WEB_MERCATOR_HALF_WIDTH,
                WEB_MERCATOR_HALF_WIDTH,
                WEB_MERCATOR_HALF_WIDTH,
            ),
            tile_size: default_tile_size(),
            min_zoom: 0,
            max_zoom: max_zoom.min(MAX_ZOOM),
            y_direction: VerticalDirection::TopToBottom,
            bleed: 0,
        }
    }

    /// Returns a copy of the pyramid with the given bleed margin.
    pub fn with_bleed(mut self, bleed: u32) -> Result<Self, VecmapError> {
        canvas_size(self.tile_size, bleed)?;
        self.bleed = bleed;
        Ok(self)
    }

    /// Map area covered by the pyramid.
    pub fn world_extent(&self) -> Rectangle {
        self.world_extent
    }

    /// Size of a tile in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Minimum zoom level.
    pub fn min_zoom(&self) -> u32 {
        self.min_zoom
    }

    /// Maximum zoom level.
    pub fn max_zoom(&self) -> u32 {
        self.max_zoom
    }

    /// Direction of the Y index.
    pub fn y_direction(&self) -> VerticalDirection {
        self.y_direction
    }

    /// Margin around tiles in pixels.
    pub fn bleed(&self) -> u32 {
        self.bleed
    }

    fn check_zoom(&self, zoom: u32) -> Result<(), VecmapError> {
        if zoom < self.min_zoom || zoom > self.max_zoom {
            return Err(VecmapError::ZoomOutOfRange {
                zoom,
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }

        Ok(())
    }

    fn check_index(&self, index: TileIndex) -> Result<i32, VecmapError> {
        let tiles_across = self.tiles_across(index.z)?;
        if !(0..tiles_across).contains(&index.x) || !(0..tiles_across).contains(&index.y) {
            return Err(VecmapError::TileOutOfRange);
        }

        Ok(tiles_across)
    }

    /// Number of tiles along each axis at the zoom level.
    pub fn tiles_across(&self, zoom: u32) -> Result<i32, VecmapError> {
        self.check_zoom(zoom)?;
        Ok(1 << zoom)
    }

    /// Size of one pixel in map units at the zoom level.
    pub fn map_units_per_pixel(&self, zoom: u32) -> Result<f64, VecmapError> {
        let tiles_across = self.tiles_across(zoom)?;
        Ok(self.world_extent.width() / self.tile_size as f64 / tiles_across as f64)
    }

    /// Range of tiles at the zoom level that overlap the query rectangle.
    ///
    /// The query is cut to the world extent first. Returns `None` if nothing is left after that.
    pub fn tile_range_for_query(
        &self,
        query: &Rectangle,
        zoom: u32,
    ) -> Result<Option<TileRange>, VecmapError> {
        let tiles_across = self.tiles_across(zoom)?;
        let units_per_pixel = self.map_units_per_pixel(zoom)?;

        let query = query.intersect(&self.world_extent);
        if query.is_empty() {
            return Ok(None);
        }

        let tile_size = self.tile_size as f64;
        let max_index = (tiles_across - 1) as f64;
        let to_tile = |pixels: f64| (pixels / tile_size).floor().clamp(0.0, max_index) as i32;
        let tile_x = |x: f64| to_tile((x - self.world_extent.x_min()) / units_per_pixel);
        let tile_y = |y: f64| {
            let pixels = (y - self.world_extent.y_min()) / units_per_pixel;
            match self.y_direction {
                VerticalDirection::TopToBottom => to_tile(tiles_across as f64 * tile_size - pixels),
                VerticalDirection::BottomToTop => to_tile(pixels),
            }
        };

        let (x1, x2) = (tile_x(query.x_min()), tile_x(query.x_max()));
        let (y1, y2) = (tile_y(query.y_min()), tile_y(query.y_max()));

        Ok(Some(TileRange {
            z: zoom,
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }))
    }

    /// Iterates over all tiles at the zoom level that overlap the query rectangle, row by row.
    pub fn iter_tiles(
        &self,
        query: &Rectangle,
        zoom: u32,
    ) -> Result<impl Iterator<Item = TileIndex>, VecmapError> {
        let range = self.tile_range_for_query(query, zoom)?;
        Ok(range.into_iter().flat_map(|range| range.iter()))
    }

    /// Map area of the tile, extended by the bleed margin, and the size of the tile canvas.
    pub fn tile_to_map_rect(&self, index: TileIndex) -> Result<TileExtent, VecmapError> {
        let tiles_across = self.check_index(index)?;
        let units_per_pixel = self.map_units_per_pixel(index.z)?;

        let y = match self.y_direction {
            VerticalDirection::TopToBottom => tiles_across - index.y - 1,
            VerticalDirection::BottomToTop => index.y,
        };

        let tile_units = self.tile_size as f64 * units_per_pixel;
        let min = Point::new(
            self.world_extent.x_min() + index.x as f64 * tile_units,
            self.world_extent.y_min() + y as f64 * tile_units,
        );
        let map_rect = Rectangle::new(min, Point::new(min.x + tile_units, min.y + tile_units))
            .buffer(self.bleed as f64 * units_per_pixel);

        let pixel_size = canvas_size(self.tile_size, self.bleed)?;
        Ok(TileExtent {
            map_rect,
            pixel_width: pixel_size,
            pixel_height: pixel_size,
            bleed: self.bleed,
        })
    }

    /// Bing Maps quad key of the tile. The key of the zoom level 0 tile is an empty string.
    ///
    /// The key always has one digit per zoom level from the tile's level down to 1, whatever the minimum zoom of the
    /// pyramid is, so keys are the same for all pyramids.
    pub fn quad_key(&self, index: TileIndex) -> Result<String, VecmapError> {
        self.check_index(index)?;

        Ok((1..=index.z)
            .rev()
            .map(|level| {
                let mask = 1 << (level - 1);
                let mut digit = b'0';
                if index.x & mask != 0 {
                    digit += 1;
                }
                if index.y & mask != 0 {
                    digit += 2;
                }
                digit as char
            })
            .collect())
    }

    /// Tile index encoded by a quad key.
    pub fn tile_from_quad_key(&self, quad_key: &str) -> Result<TileIndex, VecmapError> {
        if quad_key.len() > MAX_ZOOM as usize {
            return Err(VecmapError::InvalidQuadKey(quad_key.to_string()));
        }

        let mut index = TileIndex::new(0, 0, quad_key.len() as u32);
        for digit in quad_key.bytes() {
            let value = match digit {
                b'0'..=b'3' => (digit - b'0') as i32,
                _ => return Err(VecmapError::InvalidQuadKey(quad_key.to_string())),
            };

            index.x = (index.x << 1) | (value & 1);
            index.y = (index.y << 1) | (value >> 1);
        }

        self.check_zoom(index.z)?;
        Ok(index)
    }
}
