//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! TileJSON descriptor of a generated pyramid

use tile_grid::{merc_to_lonlat, Extent};

pub const METADATA_PATH: &str = "metadata.json";

/// Bounds in WGS84 of an extent in grid (Web Mercator) coordinates
pub fn wgs84_bounds(extent: &Extent) -> Extent {
    let (minx, miny) = merc_to_lonlat(extent.minx, extent.miny);
    let (maxx, maxy) = merc_to_lonlat(extent.maxx, extent.maxy);
    Extent {
        minx,
        miny,
        maxx,
        maxy,
    }
}

/// TileJSON 2.2 with tile URLs relative to the output root
pub fn tilejson(
    description: &str,
    bounds: &Extent,
    minzoom: u8,
    maxzoom: u8,
    tile_size: u32,
) -> serde_json::Value {
    let center = (
        (bounds.minx + bounds.maxx) / 2.0,
        (bounds.miny + bounds.maxy) / 2.0,
    );
    json!({
        "tilejson": "2.2.0",
        "description": description,
        "version": "1.0.0",
        "scheme": "xyz",
        "format": "png",
        "tiles": ["{z}/{x}/{y}.png"],
        "tile_size": tile_size,
        "bounds": [bounds.minx,
                   bounds.miny,
                   bounds.maxx,
                   bounds.maxy],
        "minzoom": minzoom,
        "maxzoom": maxzoom,
        "center": [center.0, center.1, minzoom]
    })
}

#[test]
fn test_tilejson() {
    use tile_grid::extent_wgs84_to_merc;

    let wgs84 = Extent {
        minx: -10.0,
        miny: -10.0,
        maxx: 10.0,
        maxy: 20.0,
    };
    let bounds = wgs84_bounds(&extent_wgs84_to_merc(&wgs84));
    assert!((bounds.minx - -10.0).abs() < 0.000001);
    assert!((bounds.maxy - 20.0).abs() < 0.000001);

    let json = tilejson("Raster overlay.png", &wgs84, 13, 17, 512);
    assert_eq!(json["tiles"][0], "{z}/{x}/{y}.png");
    assert_eq!(json["minzoom"], 13);
    assert_eq!(json["maxzoom"], 17);
    assert_eq!(json["bounds"][3], 20.0);
    assert_eq!(json["center"], json!([0.0, 5.0, 13]));
}
