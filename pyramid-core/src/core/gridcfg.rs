//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{GridCfg, DEFAULT_TILE_SIZE};
use crate::core::Config;
use tile_grid::{Extent, Grid};

#[derive(Deserialize, Clone, Debug)]
pub struct ExtentCfg {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl From<&ExtentCfg> for Extent {
    fn from(cfg: &ExtentCfg) -> Extent {
        Extent {
            minx: cfg.minx,
            miny: cfg.miny,
            maxx: cfg.maxx,
            maxy: cfg.maxy,
        }
    }
}

impl<'a> Config<'a, GridCfg> for Grid {
    fn from_config(grid_cfg: &GridCfg) -> Result<Self, String> {
        let tile_size = grid_cfg.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
        if tile_size == 0 {
            return Err("Grid tile_size must be a positive number of pixels".to_string());
        }
        match grid_cfg.predefined.as_ref().map(|s| s.as_str()) {
            None | Some("web_mercator") => Ok(Grid::web_mercator(tile_size)),
            Some(gridname) => Err(format!("Unkown grid '{}'", gridname)),
        }
    }
    fn gen_config() -> String {
        let toml = r#"
[grid]
predefined = "web_mercator"
# Tile width and height in pixels
tile_size = 512
"#;
        toml.to_string()
    }
}
