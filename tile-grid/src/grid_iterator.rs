//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Grid iterators

use crate::grid::{ExtentInt, TileAddress};

/// Level-by-level iterator.
///
/// Yields tiles ordered by zoom, then x, then y. Levels with empty limits are skipped.
pub struct GridIterator {
    z: u8,
    x: u32,
    y: u32,
    maxz: u8,
    limits: Vec<ExtentInt>,
    finished: bool,
}

impl GridIterator {
    pub fn new(minz: u8, maxz: u8, limits: Vec<ExtentInt>) -> GridIterator {
        if minz <= maxz && limits.len() > minz as usize {
            let maxz = std::cmp::min(maxz as usize, limits.len() - 1) as u8;
            let mut iter = GridIterator {
                z: minz,
                x: 0,
                y: 0,
                maxz,
                limits,
                finished: false,
            };
            iter.start_level(minz);
            iter
        } else {
            // Return "empty" iterator for invalid parameters
            GridIterator {
                z: 0,
                x: 0,
                y: 0,
                maxz: 0,
                limits: Vec::new(),
                finished: true,
            }
        }
    }

    /// Position on first cell of the first non-empty level >= `zoom`
    fn start_level(&mut self, zoom: u8) {
        let mut z = zoom as usize;
        while z <= self.maxz as usize {
            let limit = &self.limits[z];
            if !limit.is_empty() {
                self.z = z as u8;
                self.x = limit.minx;
                self.y = limit.miny;
                return;
            }
            z += 1;
        }
        self.finished = true;
    }
}

impl Iterator for GridIterator {
    type Item = TileAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let current = TileAddress::new(self.z, self.x, self.y);
        let limit = &self.limits[self.z as usize];
        if self.y + 1 < limit.maxy {
            self.y += 1;
        } else if self.x + 1 < limit.maxx {
            self.x += 1;
            self.y = limit.miny;
        } else if self.z < self.maxz {
            self.start_level(self.z + 1);
        } else {
            self.finished = true;
        }
        Some(current)
    }
}

#[cfg(test)]
fn cells(iter: GridIterator) -> Vec<(u8, u32, u32)> {
    iter.map(|t| (t.zoom, t.x, t.y)).collect()
}

#[test]
fn test_mercator_iter() {
    use crate::grid::Grid;
    let grid = Grid::web_mercator(256);
    let tile_limits = grid.tile_limits(grid.extent.clone(), 0);
    let griditer = GridIterator::new(0, 2, tile_limits);
    let tiles = cells(griditer);
    assert_eq!(tiles.len(), 1 + 4 + 16);
    assert_eq!(
        &tiles[..8],
        &[
            (0, 0, 0),
            (1, 0, 0),
            (1, 0, 1),
            (1, 1, 0),
            (1, 1, 1),
            (2, 0, 0),
            (2, 0, 1),
            (2, 0, 2),
        ]
    );
    assert_eq!(tiles.last(), Some(&(2, 3, 3)));

    let tile_limits = grid.tile_limits(grid.extent.clone(), 0);
    let griditer = GridIterator::new(1, 1, tile_limits);
    assert_eq!(
        cells(griditer),
        vec![(1, 0, 0), (1, 0, 1), (1, 1, 0), (1, 1, 1)]
    );
}

#[test]
fn test_sorted_output() {
    use crate::grid::{Extent, Grid};
    let grid = Grid::web_mercator(512);
    let extent = Extent {
        minx: -1000000.0,
        miny: -3000000.0,
        maxx: 4000000.0,
        maxy: 500000.0,
    };
    let tiles: Vec<_> = GridIterator::new(3, 6, grid.tile_limits(extent, 0)).collect();
    let mut sorted = tiles.clone();
    sorted.sort();
    assert_eq!(tiles, sorted);
}

#[test]
fn test_empty_levels() {
    let limits = vec![
        ExtentInt {
            minx: 0,
            miny: 0,
            maxx: 1,
            maxy: 1,
        },
        ExtentInt {
            minx: 1,
            miny: 0,
            maxx: 1,
            maxy: 2,
        },
        ExtentInt {
            minx: 2,
            miny: 3,
            maxx: 3,
            maxy: 4,
        },
    ];
    let griditer = GridIterator::new(0, 2, limits.clone());
    assert_eq!(cells(griditer), vec![(0, 0, 0), (2, 2, 3)]);

    // empty last level
    let griditer = GridIterator::new(0, 1, limits.clone());
    assert_eq!(cells(griditer), vec![(0, 0, 0)]);

    // empty first level
    let griditer = GridIterator::new(1, 2, limits);
    assert_eq!(cells(griditer), vec![(2, 2, 3)]);
}

#[test]
fn test_bad_params() {
    use crate::grid::Grid;
    let grid = Grid::web_mercator(256);

    // missing tile_limits
    let griditer = GridIterator::new(0, 10, Vec::new());
    assert_eq!(cells(griditer), vec![]);

    // minz > maxz
    let tile_limits = grid.tile_limits(grid.extent.clone(), 0);
    let griditer = GridIterator::new(3, 2, tile_limits);
    assert_eq!(cells(griditer), vec![]);

    // maxz >= tile_limits.len()
    let griditer = GridIterator::new(
        0,
        2,
        vec![
            ExtentInt {
                minx: 0,
                miny: 0,
                maxx: 1,
                maxy: 1,
            },
            ExtentInt {
                minx: 0,
                miny: 0,
                maxx: 2,
                maxy: 2,
            },
        ],
    );
    assert_eq!(
        cells(griditer),
        vec![(0, 0, 0), (1, 0, 0), (1, 0, 1), (1, 1, 0), (1, 1, 1)]
    );

    // minz >= tile_limits.len()
    let griditer = GridIterator::new(
        1,
        2,
        vec![ExtentInt {
            minx: 0,
            miny: 0,
            maxx: 1,
            maxy: 1,
        }],
    );
    assert_eq!(cells(griditer), vec![]);
}
