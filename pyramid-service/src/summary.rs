//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::error::TileError;
use pyramid_core::core::stats::Statistics;
use std::fmt;
use tile_grid::TileAddress;

/// Result of rendering and storing one tile
pub struct TileOutcome {
    pub tile: TileAddress,
    /// Number of bytes written
    pub result: Result<usize, TileError>,
    pub elapsed_ms: u64,
}

/// Counts and per-level statistics of a pyramid build
pub struct GenerateSummary {
    /// Tiles rendered or tried to render
    pub attempted: u64,
    pub written: u64,
    /// Tiles kept from a previous run
    pub existing: u64,
    /// Tiles without raster overlap
    pub outside: u64,
    /// Skipped tiles with cause, ordered by address
    pub failed: Vec<(TileAddress, String)>,
    pub cancelled: bool,
    /// `render_ms.{z}` and `tile_bytes.{z}` of written tiles
    pub stats: Statistics,
}

impl GenerateSummary {
    pub fn new() -> GenerateSummary {
        GenerateSummary {
            attempted: 0,
            written: 0,
            existing: 0,
            outside: 0,
            failed: Vec::new(),
            cancelled: false,
            stats: Statistics::new(),
        }
    }
    pub fn add(&mut self, outcome: TileOutcome) {
        self.attempted += 1;
        let zoom = outcome.tile.zoom;
        match outcome.result {
            Ok(bytes) => {
                self.written += 1;
                self.stats
                    .add(format!("render_ms.{}", zoom), outcome.elapsed_ms);
                self.stats.add(format!("tile_bytes.{}", zoom), bytes as u64);
            }
            Err(ref e) if e.is_out_of_bounds() => self.outside += 1,
            Err(e) => self.failed.push((outcome.tile, e.to_string())),
        }
    }
    /// Attempted tiles which were not written
    pub fn skipped(&self) -> u64 {
        self.outside + self.failed.len() as u64
    }
    /// Order failures independently of worker scheduling
    pub(crate) fn finish(mut self) -> GenerateSummary {
        self.failed.sort_by_key(|(tile, _)| *tile);
        self
    }
}

impl fmt::Display for GenerateSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} tiles attempted, {} written, {} skipped ({} outside of raster, {} failed), {} existing",
            self.attempted,
            self.written,
            self.skipped(),
            self.outside,
            self.failed.len(),
            self.existing
        )?;
        if self.cancelled {
            writeln!(f, "Generation cancelled")?;
        }
        for (tile, cause) in &self.failed {
            writeln!(f, "  {}: {}", tile, cause)?;
        }
        write!(f, "{}", self.stats)
    }
}
