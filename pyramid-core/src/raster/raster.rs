//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use std::io;
use thiserror::Error;
use tile_grid::{extent_wgs84_to_merc, merc_to_lonlat, Extent, Grid, TileAddress};

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("tile {0} is outside of raster bounds")]
    OutOfBounds(TileAddress),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("georeference error: {0}")]
    Georeference(String),
    #[error("no transformation from SRID {from} to SRID {to}")]
    UnsupportedSrid { from: i32, to: i32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RasterError {
    /// Tiles outside the raster are expected while walking a pyramid
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, RasterError::OutOfBounds(_))
    }
}

/// Read-only georeferenced image which renders map tiles
pub trait RasterSource: Send + Sync {
    fn info(&self) -> String;
    /// Raster bounds in units of `srid()`
    fn bounds(&self) -> Extent;
    /// Spatial reference system of the bounds (EPSG code)
    fn srid(&self) -> i32;
    /// Render a PNG encoded tile of `grid.tile_size()` pixels
    fn render_tile(&self, grid: &Grid, tile: &TileAddress) -> Result<Vec<u8>, RasterError>;
}

/// Coordinate transformation between a raster SRS and a grid SRS
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Reprojection {
    Identity,
    Wgs84ToMercator,
}

impl Reprojection {
    pub fn new(from_srid: i32, to_srid: i32) -> Result<Reprojection, RasterError> {
        match (from_srid, to_srid) {
            (from, to) if from == to => Ok(Reprojection::Identity),
            (4326, 3857) => Ok(Reprojection::Wgs84ToMercator),
            (from, to) => Err(RasterError::UnsupportedSrid { from, to }),
        }
    }
    /// Extent in target SRS
    pub fn extent(&self, extent: &Extent) -> Extent {
        match self {
            Reprojection::Identity => extent.clone(),
            Reprojection::Wgs84ToMercator => extent_wgs84_to_merc(extent),
        }
    }
    /// Point from target SRS back into source SRS
    pub fn inverse_point(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Reprojection::Identity => (x, y),
            Reprojection::Wgs84ToMercator => merc_to_lonlat(x, y),
        }
    }
}

/// Raster bounds projected into the grid SRS
pub fn grid_bounds<R: RasterSource + ?Sized>(raster: &R, grid: &Grid) -> Result<Extent, RasterError> {
    let reprojection = Reprojection::new(raster.srid(), grid.srid)?;
    Ok(reprojection.extent(&raster.bounds()))
}
