//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use pyramid_core::raster::RasterError;
use std::io;
use thiserror::Error;

/// Fatal errors. Raised before the first tile is rendered.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot open raster {path}: {source}")]
    OpenRaster { path: String, source: RasterError },
    #[error("cannot create output ({target}): {source}")]
    CreateOutput { target: String, source: io::Error },
    #[error("raster SRID {raster} cannot be projected to grid SRID {grid}")]
    UnsupportedSrid { raster: i32, grid: i32 },
    #[error("invalid zoom range {minzoom}..{maxzoom}")]
    InvalidZoomRange { minzoom: u8, maxzoom: u8 },
    #[error("tile size must be a positive number of pixels")]
    InvalidTileSize,
    #[error("cannot start worker threads: {0}")]
    Runtime(io::Error),
    #[error("{0}")]
    Config(String),
}

/// Failure of a single tile. Recorded in the summary, never aborts the walk.
#[derive(Debug, Error)]
pub enum TileError {
    #[error(transparent)]
    Render(#[from] RasterError),
    #[error("write error: {0}")]
    Write(io::Error),
}

impl TileError {
    /// Tile doesn't overlap the raster, an expected outcome at the pyramid borders
    pub fn is_out_of_bounds(&self) -> bool {
        match self {
            TileError::Render(e) => e.is_out_of_bounds(),
            TileError::Write(_) => false,
        }
    }
}
