//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use clap::ArgMatches;
use pyramid_core::core::config::DEFAULT_CONFIG;
use pyramid_core::core::gridcfg::ExtentCfg;
use pyramid_core::core::{parse_config, read_config, ApplicationCfg};
use std::process;
use std::str::FromStr;
use tile_grid::{lonlat_to_merc, TileAddress, MAX_ZOOM};

/// Configuration file or defaults, overridden by command line arguments
pub fn config_from_args(args: &ArgMatches) -> ApplicationCfg {
    let mut config: ApplicationCfg = if let Some(cfgpath) = args.value_of("config") {
        info!("Reading configuration from '{}'", cfgpath);
        read_config(cfgpath).unwrap_or_else(|err| {
            println!("Error reading configuration - {} ", err);
            process::exit(1)
        })
    } else {
        parse_config(DEFAULT_CONFIG.to_string(), "").unwrap_or_else(|err| {
            println!("Error reading configuration - {} ", err);
            process::exit(1)
        })
    };
    if let Err(err) = apply_args(&mut config, args) {
        println!("{}", err);
        process::exit(1)
    }
    config
}

fn apply_args(config: &mut ApplicationCfg, args: &ArgMatches) -> Result<(), String> {
    if let Some(path) = args.value_of("raster") {
        config.raster.path = path.to_string();
    }
    if let Some(numlist) = args.value_of("bounds") {
        let (bounds, srid) = parse_bounds(numlist)?;
        config.raster.bounds = Some(bounds);
        if let Some(srid) = srid {
            config.raster.srid = srid;
        }
    }
    if let Some(dir) = args.value_of("output") {
        config.output.base = dir.to_string();
    }
    if let Some(tile_size) = parse_arg(args, "tilesize")? {
        config.grid.tile_size = Some(tile_size);
    }
    let generate = &mut config.generate;
    if let Some(minzoom) = parse_arg(args, "minzoom")? {
        generate.minzoom = Some(minzoom);
    }
    if let Some(maxzoom) = parse_arg(args, "maxzoom")? {
        generate.maxzoom = Some(maxzoom);
    }
    if let Some(threads) = parse_arg(args, "threads")? {
        generate.threads = Some(threads);
    }
    if let Some(nodes) = parse_arg(args, "nodes")? {
        generate.nodes = Some(nodes);
    }
    if let Some(nodeno) = parse_arg(args, "nodeno")? {
        generate.nodeno = Some(nodeno);
    }
    if let Some(progress) = parse_arg(args, "progress")? {
        generate.progress = Some(progress);
    }
    if let Some(overwrite) = parse_arg(args, "overwrite")? {
        generate.overwrite = overwrite;
    }
    if config.raster.path.is_empty() {
        return Err("Either 'config' or 'raster' is required".to_string());
    }
    if config.output.base.is_empty() {
        return Err("Either 'config' or 'output' is required".to_string());
    }
    Ok(())
}

fn parse_arg<T: FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, String> {
    args.value_of(name)
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| format!("Error parsing '{}' value `{}`", name, s))
        })
        .transpose()
}

fn parse_numbers(numlist: &str, name: &str) -> Result<Vec<f64>, String> {
    numlist
        .split(',')
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| format!("Error parsing '{}' as list of float values", name))
        })
        .collect()
}

/// `minx,miny,maxx,maxy[,srid]`
pub fn parse_bounds(numlist: &str) -> Result<(ExtentCfg, Option<i32>), String> {
    let arr: Vec<&str> = numlist.split(',').collect();
    let srid = match arr.len() {
        4 => None,
        5 => Some(
            arr[4]
                .trim()
                .parse::<i32>()
                .map_err(|_| "Error parsing 'srid' in 'bounds' as integer".to_string())?,
        ),
        _ => return Err("Expected 'bounds' as minx,miny,maxx,maxy[,srid]".to_string()),
    };
    let v = parse_numbers(&arr[0..4].join(","), "bounds")?;
    let bounds = ExtentCfg {
        minx: v[0],
        miny: v[1],
        maxx: v[2],
        maxy: v[3],
    };
    Ok((bounds, srid))
}

/// `z/x/y`
pub fn parse_tile_address(path: &str) -> Result<TileAddress, String> {
    let err = || format!("Expected tile address as z/x/y, got `{}`", path);
    let parts: Vec<&str> = path.trim_end_matches(".png").split('/').collect();
    if parts.len() != 3 {
        return Err(err());
    }
    let tile = TileAddress::new(
        parts[0].parse().map_err(|_| err())?,
        parts[1].parse().map_err(|_| err())?,
        parts[2].parse().map_err(|_| err())?,
    );
    if tile.zoom > MAX_ZOOM {
        return Err(format!("Zoom level {} exceeds {}", tile.zoom, MAX_ZOOM));
    }
    let size = 1u32 << tile.zoom;
    if tile.x >= size || tile.y >= size {
        return Err(format!(
            "Tile {} outside of the {}x{} tiles of level {}",
            tile, size, size, tile.zoom
        ));
    }
    Ok(tile)
}

/// Web Mercator (xmin, xmax, ymin, ymax) of `lon,lat,lon,lat,...`
pub fn merc_range(numlist: &str) -> Result<(f64, f64, f64, f64), String> {
    let v = parse_numbers(numlist, "points")?;
    if v.is_empty() || v.len() % 2 != 0 {
        return Err("Expected 'points' as pairs of lon,lat".to_string());
    }
    let init = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    Ok(v.chunks(2).fold(init, |(xmin, xmax, ymin, ymax), lonlat| {
        let (x, y) = lonlat_to_merc(lonlat[0], lonlat[1]);
        (xmin.min(x), xmax.max(x), ymin.min(y), ymax.max(y))
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        let (bounds, srid) = parse_bounds("-76.24,43.05,-76.19,43.09").unwrap();
        assert_eq!((bounds.minx, bounds.maxy), (-76.24, 43.09));
        assert_eq!(srid, None);
        let (bounds, srid) = parse_bounds("2600000,1200000,2601000,1201000,3857").unwrap();
        assert_eq!(bounds.maxx, 2601000.0);
        assert_eq!(srid, Some(3857));
        assert!(parse_bounds("1,2,3").is_err());
        assert!(parse_bounds("1,2,3,x").is_err());
        assert!(parse_bounds("1,2,3,4,epsg").is_err());
    }

    #[test]
    fn test_parse_tile_address() {
        assert_eq!(
            parse_tile_address("16/18889/24059").unwrap(),
            TileAddress::new(16, 18889, 24059)
        );
        assert_eq!(
            parse_tile_address("16/18889/24059.png").unwrap(),
            TileAddress::new(16, 18889, 24059)
        );
        assert_eq!(
            parse_tile_address("1/1/1").unwrap(),
            TileAddress::new(1, 1, 1)
        );
        assert_eq!(
            parse_tile_address("1/2/0").err(),
            Some("Tile 1/2/0 outside of the 2x2 tiles of level 1".to_string())
        );
        assert!(parse_tile_address("0/0/1").is_err());
        assert!(parse_tile_address("16/18889/65536").is_err());
        assert!(parse_tile_address("25/0/0").is_err());
        assert!(parse_tile_address("16/18889").is_err());
        assert!(parse_tile_address("a/b/c").is_err());
    }

    #[test]
    fn test_merc_range() {
        let (xmin, xmax, ymin, ymax) =
            merc_range("-76.215325,43.055330,-76.237537,43.071149,-76.220370,43.085023,-76.197577,43.069828")
                .unwrap();
        let (x, y) = lonlat_to_merc(-76.237537, 43.055330);
        assert_eq!(xmin, x);
        assert_eq!(ymin, y);
        assert!(xmin < xmax && ymin < ymax);
        assert!(merc_range("1,2,3").is_err());
        assert!(merc_range("").is_err());
    }
}
