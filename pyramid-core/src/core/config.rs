//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::gridcfg::ExtentCfg;
use regex::Regex;
use serde::Deserialize;
use std;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::prelude::*;
use tera::{Context, Tera};
use toml::Value;

pub trait Config<'a, C: Deserialize<'a>>
where
    Self: std::marker::Sized,
{
    /// Read configuration
    fn from_config(config: &C) -> Result<Self, String>;
    /// Generate configuration template
    fn gen_config() -> String;
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationCfg {
    pub raster: RasterCfg,
    #[serde(default)]
    pub grid: GridCfg,
    pub output: OutputCfg,
    #[serde(default)]
    pub generate: GenerateCfg,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RasterCfg {
    /// Georeferenced image (PNG, JPEG, TIFF, ...)
    pub path: String,
    /// Image bounds ordered as minx, miny, maxx, maxy.
    /// Read from a world file next to the image when missing.
    pub bounds: Option<ExtentCfg>,
    /// Spatial reference system of the bounds (EPSG code)
    #[serde(default = "default_srid")]
    pub srid: i32,
}

pub fn default_srid() -> i32 {
    4326
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct GridCfg {
    pub predefined: Option<String>,
    /// Width and height of a tile in pixels (Default: 512)
    pub tile_size: Option<u32>,
}

pub const DEFAULT_TILE_SIZE: u32 = 512;

#[derive(Deserialize, Clone, Debug)]
pub struct OutputCfg {
    /// Root directory of the `{z}/{x}/{y}.png` tree
    pub base: String,
    /// Write TileJSON `metadata.json` into the root directory
    #[serde(default = "default_metadata")]
    pub metadata: bool,
}

pub fn default_metadata() -> bool {
    true
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct GenerateCfg {
    pub minzoom: Option<u8>,
    pub maxzoom: Option<u8>,
    /// Number of rendering threads (Default: 1)
    pub threads: Option<usize>,
    /// Number of generator nodes
    pub nodes: Option<u8>,
    /// Number of this node (0 <= n < nodes)
    pub nodeno: Option<u8>,
    /// Re-render tiles which already exist
    #[serde(default)]
    pub overwrite: bool,
    pub progress: Option<bool>,
}

pub const DEFAULT_MINZOOM: u8 = 13;
pub const DEFAULT_MAXZOOM: u8 = 17;

pub const DEFAULT_CONFIG: &'static str = r#"
[raster]
path = ""
srid = 4326

[grid]
predefined = "web_mercator"
tile_size = 512

[output]
base = ""

[generate]
minzoom = 13
maxzoom = 17
"#;

/// Load and parse the config file into an config struct.
pub fn read_config<'a, T: Deserialize<'a>>(path: &str) -> Result<T, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            return Err("Could not find config file!".to_string());
        }
    };
    let mut config_toml = String::new();
    if let Err(err) = file.read_to_string(&mut config_toml) {
        return Err(format!("Error while reading config: [{}]", err));
    };

    parse_config(config_toml, path)
}

/// Parse the configuration into an config struct.
pub fn parse_config<'a, T: Deserialize<'a>>(config_toml: String, path: &str) -> Result<T, String> {
    // Check for old ${var} expressions
    let re = Regex::new(r"\$\{([[:alnum:]]+)\}").map_err(|e| e.to_string())?;
    if re.is_match(&config_toml) {
        return Err(
            "Replace old environment variable syntax ${VARNAME} with `{{env.VARNAME}}`".to_string(),
        );
    }

    // Parse template
    let mut tera = Tera::default();
    tera.add_raw_template(path, &config_toml)
        .map_err(|e| format!("Template error: {}", e))?;
    let mut context = Context::new();
    let mut env = HashMap::new();
    for (key, value) in env::vars() {
        env.insert(key, value);
    }
    context.insert("env", &env);
    let toml = tera.render(path, &context).map_err(|e| match e.source() {
        Some(cause) => format!("Template error: {}", cause),
        None => format!("Template error: {}", e),
    })?;

    toml.parse::<Value>()
        .and_then(|cfg| cfg.try_into::<T>())
        .map_err(|err| format!("{} - {}", path, err))
}
