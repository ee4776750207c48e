//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//!Tile grids

use std::f64::consts;
use std::fmt;

/// Earth radius used by Spherical Mercator (EPSG:3857)
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half of the Web Mercator world width in meters
pub const MERC_HALF_WIDTH: f64 = 20037508.3427892480;

/// Latitude limit of the square Web Mercator world
pub const MERC_MAX_LAT: f64 = 85.0511287798066;

/// Deepest zoom level of the predefined Web Mercator grid
pub const MAX_ZOOM: u8 = 24;

/// Geographic extent
#[derive(PartialEq, Clone, Debug)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    /// True if both extents share an area. Touching edges don't count.
    pub fn intersects(&self, other: &Extent) -> bool {
        self.minx < other.maxx
            && other.minx < self.maxx
            && self.miny < other.maxy
            && other.miny < self.maxy
    }
}

/// Min and max grid cell numbers. `max` values are exclusive.
#[derive(PartialEq, Clone, Debug)]
pub struct ExtentInt {
    pub minx: u32,
    pub miny: u32,
    pub maxx: u32,
    pub maxy: u32,
}

impl ExtentInt {
    pub fn is_empty(&self) -> bool {
        self.minx >= self.maxx || self.miny >= self.maxy
    }
    /// Number of cells within limits
    pub fn count(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.maxx - self.minx) as u64 * (self.maxy - self.miny) as u64
        }
    }
}

/// Address of a single tile in XYZ scheme
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct TileAddress {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    pub fn new(zoom: u8, x: u32, y: u32) -> TileAddress {
        TileAddress { zoom, x, y }
    }
    /// Relative path `z/x/y.{suffix}`
    pub fn path(&self, suffix: &str) -> String {
        format!("{}/{}/{}.{}", self.zoom, self.x, self.y, suffix)
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

// Max grid cell numbers
type CellIndex = (u32, u32);

/// Tile grid with origin at the top left corner (XYZ row numbering)
#[derive(Clone, Debug)]
pub struct Grid {
    /// The width and height of an individual tile, in pixels.
    tile_size: u32,
    /// The geographical extent covered by the grid, in ground units.
    /// The (minx,maxy) point defines the origin of the grid, i.e. the pixel at the top left of the
    /// top-left most tile is always placed on the (minx,maxy) geographical point.
    /// The (maxx,miny) point is used to determine how many tiles there are for each zoom level.
    pub extent: Extent,
    /// Spatial reference system (EPSG code).
    pub srid: i32,
    /// Resolutions in units per pixel for each zoom level, ordered from largest to smallest.
    resolutions: Vec<f64>,
    /// maxx/maxy for each resolution
    level_max: Vec<CellIndex>,
}

impl Grid {
    /// Web Mercator grid (Google maps compatible) with square tiles of `tile_size` pixels
    pub fn web_mercator(tile_size: u32) -> Grid {
        let res0 = 2.0 * MERC_HALF_WIDTH / tile_size as f64;
        let resolutions = (0..=MAX_ZOOM)
            .map(|zoom| res0 / 2f64.powi(zoom as i32))
            .collect();
        Grid::new(
            tile_size,
            Extent {
                minx: -MERC_HALF_WIDTH,
                miny: -MERC_HALF_WIDTH,
                maxx: MERC_HALF_WIDTH,
                maxy: MERC_HALF_WIDTH,
            },
            3857,
            resolutions,
        )
    }

    pub fn new(tile_size: u32, extent: Extent, srid: i32, resolutions: Vec<f64>) -> Grid {
        let mut grid = Grid {
            tile_size,
            extent,
            srid,
            resolutions,
            level_max: Vec::new(),
        };
        grid.level_max = grid.level_max();
        grid
    }
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
    pub fn nlevels(&self) -> u8 {
        self.resolutions.len() as u8
    }
    pub fn maxzoom(&self) -> u8 {
        self.nlevels() - 1
    }
    /// Ground units per pixel
    pub fn resolution(&self, zoom: u8) -> f64 {
        self.resolutions[zoom as usize]
    }
    /// Extent of a given tile in the grid given its x, y, and z
    pub fn tile_extent(&self, xtile: u32, ytile: u32, zoom: u8) -> Extent {
        let span = self.resolutions[zoom as usize] * self.tile_size as f64;
        Extent {
            minx: self.extent.minx + span * xtile as f64,
            miny: self.extent.maxy - span * (ytile + 1) as f64,
            maxx: self.extent.minx + span * (xtile + 1) as f64,
            maxy: self.extent.maxy - span * ytile as f64,
        }
    }
    /// (maxx, maxy) of grid level
    pub fn level_limit(&self, zoom: u8) -> CellIndex {
        self.level_max[zoom as usize]
    }
    fn compute_level_limit(&self, zoom: u8) -> CellIndex {
        let span = self.resolutions[zoom as usize] * self.tile_size as f64;
        let maxy = ((self.extent.maxy - self.extent.miny - 0.01 * span) / span).ceil() as u32;
        let maxx = ((self.extent.maxx - self.extent.minx - 0.01 * span) / span).ceil() as u32;
        (maxx, maxy)
    }
    /// (maxx, maxy) of all grid levels
    fn level_max(&self) -> Vec<CellIndex> {
        (0..self.nlevels())
            .map(|zoom| self.compute_level_limit(zoom))
            .collect()
    }
    /// Tile index limits covering extent, one entry per zoom level.
    /// Levels not covered by the extent get an empty range.
    pub fn tile_limits(&self, extent: Extent, tolerance: i64) -> Vec<ExtentInt> {
        // Based on mapcache_grid_compute_limits
        const EPSILON: f64 = 0.0000001;
        (0..self.nlevels())
            .map(|zoom| {
                let span = self.resolutions[zoom as usize] * self.tile_size as f64;
                let (level_maxx, level_maxy) = self.level_max[zoom as usize];

                let minx = ((extent.minx - self.extent.minx) / span + EPSILON).floor() as i64
                    - tolerance;
                let maxx =
                    ((extent.maxx - self.extent.minx) / span - EPSILON).ceil() as i64 + tolerance;
                let miny = ((self.extent.maxy - extent.maxy) / span + EPSILON).floor() as i64
                    - tolerance;
                let maxy =
                    ((self.extent.maxy - extent.miny) / span - EPSILON).ceil() as i64 + tolerance;

                // to avoid requesting out-of-range tiles
                let clamp = |v: i64, max: u32| v.max(0).min(max as i64) as u32;
                let maxx = clamp(maxx, level_maxx);
                let maxy = clamp(maxy, level_maxy);
                ExtentInt {
                    minx: clamp(minx, level_maxx).min(maxx),
                    miny: clamp(miny, level_maxy).min(maxy),
                    maxx,
                    maxy,
                }
            })
            .collect()
    }
}

/// Returns the Spherical Mercator (x, y) in meters
pub fn lonlat_to_merc(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.max(-MERC_MAX_LAT).min(MERC_MAX_LAT);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * ((consts::PI * 0.25) + (0.5 * lat.to_radians())).tan().ln();
    (x, y)
}

/// Returns (lon, lat) in degrees of a Spherical Mercator point
pub fn merc_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// Projected extent
pub fn extent_wgs84_to_merc(extent: &Extent) -> Extent {
    let (minx, miny) = lonlat_to_merc(extent.minx, extent.miny);
    let (maxx, maxy) = lonlat_to_merc(extent.maxx, extent.maxy);
    Extent {
        minx,
        miny,
        maxx,
        maxy,
    }
}

/// (lon, lat) of the north-west corner of an XYZ tile
pub fn tile_lonlat(xtile: u32, ytile: u32, zoom: u8) -> (f64, f64) {
    let n = 2f64.powi(zoom as i32);
    let lon = xtile as f64 / n * 360.0 - 180.0;
    let lat = (consts::PI * (1.0 - 2.0 * ytile as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    (lon, lat)
}
