//! A library for map tile grid calculations
//!
//! ## Web Mercator grid
//!
//! ```rust
//! use tile_grid::Grid;
//!
//! let grid = Grid::web_mercator(256);
//! assert_eq!(grid.level_limit(2), (4, 4));
//! ```
//!
//! ## Grid iterators
//!
//! ```rust
//! use tile_grid::{extent_wgs84_to_merc, Extent, Grid, GridIterator};
//!
//! let grid = Grid::web_mercator(512);
//! let extent = extent_wgs84_to_merc(&Extent {
//!     minx: -10.0,
//!     miny: -10.0,
//!     maxx: 10.0,
//!     maxy: 10.0,
//! });
//! let tile_limits = grid.tile_limits(extent, 0);
//! for tile in GridIterator::new(0, 2, tile_limits) {
//!     println!("Tile {}", tile);
//! }
//! ```

mod grid;
mod grid_iterator;

pub use grid::{
    extent_wgs84_to_merc, lonlat_to_merc, merc_to_lonlat, tile_lonlat, Extent, ExtentInt, Grid,
    TileAddress, MAX_ZOOM, MERC_HALF_WIDTH,
};
pub use grid_iterator::GridIterator;
