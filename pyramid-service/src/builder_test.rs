//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::builder::{build_pyramid, GenerateOptions, TilePyramidBuilder};
use crate::error::SetupError;
use image::{Rgba, RgbaImage};
use pyramid_core::core::{parse_config, ApplicationCfg, Config};
use pyramid_core::raster::{ImageRaster, RasterError, RasterSource};
use pyramid_core::store::{Filestore, Tilestore};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tile_grid::{extent_wgs84_to_merc, Extent, Grid, TileAddress};

fn test_dir(name: &str) -> PathBuf {
    let mut dir = env::temp_dir();
    dir.push("pyramid_service_test");
    dir.push(name);
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn raster_bounds() -> Extent {
    Extent {
        minx: -10.0,
        miny: -10.0,
        maxx: 10.0,
        maxy: 10.0,
    }
}

fn synthetic_raster() -> ImageRaster {
    let image = RgbaImage::from_fn(1024, 1024, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    ImageRaster::from_image("synthetic", image, raster_bounds(), 4326).unwrap()
}

fn options(minzoom: u8, maxzoom: u8) -> GenerateOptions {
    GenerateOptions {
        minzoom,
        maxzoom,
        ..Default::default()
    }
}

fn builder(dir: &Path, options: GenerateOptions) -> TilePyramidBuilder<Filestore> {
    TilePyramidBuilder::new(Grid::web_mercator(256), Filestore::new(dir), options)
}

/// Relative paths and contents of all files below `dir`
fn read_tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, files);
            } else {
                let relpath = path.strip_prefix(base).unwrap();
                let key = relpath
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join("/");
                files.insert(key, fs::read(&path).unwrap());
            }
        }
    }
    let mut files = BTreeMap::new();
    if dir.exists() {
        walk(dir, dir, &mut files);
    }
    files
}

fn png_paths(dir: &Path) -> Vec<String> {
    read_tree(dir)
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| path.ends_with(".png"))
        .collect()
}

fn parse_tile_path(path: &str) -> TileAddress {
    let parts: Vec<&str> = path.trim_end_matches(".png").split('/').collect();
    TileAddress::new(
        parts[0].parse().unwrap(),
        parts[1].parse().unwrap(),
        parts[2].parse().unwrap(),
    )
}

/// Raster failing to decode a single tile
struct CorruptRaster {
    inner: ImageRaster,
    corrupt: TileAddress,
}

impl RasterSource for CorruptRaster {
    fn info(&self) -> String {
        self.inner.info()
    }
    fn bounds(&self) -> Extent {
        self.inner.bounds()
    }
    fn srid(&self) -> i32 {
        self.inner.srid()
    }
    fn render_tile(&self, grid: &Grid, tile: &TileAddress) -> Result<Vec<u8>, RasterError> {
        if *tile == self.corrupt {
            return Err(RasterError::Decode("corrupt strip".to_string()));
        }
        self.inner.render_tile(grid, tile)
    }
}

/// Store refusing to write a single path
#[derive(Clone)]
struct ReadonlyPathStore {
    inner: Filestore,
    readonly: String,
}

impl Tilestore for ReadonlyPathStore {
    fn info(&self) -> String {
        self.inner.info()
    }
    fn init(&self) -> Result<(), io::Error> {
        self.inner.init()
    }
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error> {
        if path == self.readonly {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only",
            ));
        }
        self.inner.write(path, obj)
    }
    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }
}

#[test]
fn test_generate_pyramid() {
    let dir = test_dir("generate");
    let summary = builder(&dir, options(0, 1))
        .build(synthetic_raster())
        .unwrap();

    let expected = vec!["0/0/0.png", "1/0/0.png", "1/0/1.png", "1/1/0.png", "1/1/1.png"];
    assert_eq!(png_paths(&dir), expected);
    assert_eq!(summary.attempted, 5);
    assert_eq!(summary.written, 5);
    assert_eq!(summary.skipped(), 0);
    assert!(summary.failed.is_empty());
    assert!(!summary.cancelled);
    assert_eq!(summary.stats.results("tile_bytes.1").len, 4);

    for (path, png) in read_tree(&dir) {
        let tile = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(tile.dimensions(), (256, 256), "{}", path);
    }
    // no leftovers of atomic writes
    assert!(read_tree(&dir).keys().all(|path| path.ends_with(".png")));
}

#[test]
fn test_build_pyramid() {
    let dir = test_dir("build_pyramid");
    let written = build_pyramid(synthetic_raster(), 0, 1, 256, &dir).unwrap();
    assert_eq!(written, 5);
    assert_eq!(png_paths(&dir).len() as u64, written);
}

#[test]
fn test_tiles_intersect_raster() {
    let dir = test_dir("intersect");
    let summary = builder(&dir, options(0, 4))
        .build(synthetic_raster())
        .unwrap();
    let grid = Grid::web_mercator(256);
    let raster_extent = extent_wgs84_to_merc(&raster_bounds());
    let paths = png_paths(&dir);
    assert_eq!(paths.len() as u64, summary.written);
    for path in paths {
        let tile = parse_tile_path(&path);
        assert!(tile.zoom <= 4);
        assert!(tile.x < 1 << tile.zoom && tile.y < 1 << tile.zoom);
        assert!(grid
            .tile_extent(tile.x, tile.y, tile.zoom)
            .intersects(&raster_extent));
    }
}

#[test]
fn test_idempotent() {
    let dir = test_dir("idempotent");
    builder(&dir, options(0, 2))
        .build(synthetic_raster())
        .unwrap();
    let first = read_tree(&dir);

    let fresh = test_dir("idempotent_fresh");
    builder(&fresh, options(0, 2))
        .build(synthetic_raster())
        .unwrap();
    assert_eq!(read_tree(&fresh), first);

    // rerun into the same root
    let summary = builder(&dir, options(0, 2))
        .build(synthetic_raster())
        .unwrap();
    assert_eq!(summary.written, first.len() as u64);
    assert_eq!(read_tree(&dir), first);
}

#[test]
fn test_keep_existing() {
    let dir = test_dir("existing");
    builder(&dir, options(0, 1))
        .build(synthetic_raster())
        .unwrap();
    let opts = GenerateOptions {
        overwrite: false,
        ..options(0, 2)
    };
    let summary = builder(&dir, opts).build(synthetic_raster()).unwrap();
    assert_eq!(summary.existing, 5);
    // level 2 is new
    assert_eq!(summary.written, 4);
    assert_eq!(summary.attempted, 4);
    assert_eq!(png_paths(&dir).len(), 9);
}

#[test]
fn test_decode_error_skips_tile() {
    let dir = test_dir("decode_error");
    let raster = CorruptRaster {
        inner: synthetic_raster(),
        corrupt: TileAddress::new(1, 1, 0),
    };
    let summary = builder(&dir, options(0, 1)).build(raster).unwrap();
    assert_eq!(summary.attempted, 5);
    assert_eq!(summary.written, 4);
    assert_eq!(
        summary.failed,
        vec![(
            TileAddress::new(1, 1, 0),
            "decode error: corrupt strip".to_string()
        )]
    );
    assert_eq!(
        png_paths(&dir),
        vec!["0/0/0.png", "1/0/0.png", "1/0/1.png", "1/1/1.png"]
    );
    assert!(format!("{}", summary).contains("1/1/0: decode error: corrupt strip"));
}

#[test]
fn test_write_error_skips_tile() {
    let dir = test_dir("write_error");
    let store = ReadonlyPathStore {
        inner: Filestore::new(&dir),
        readonly: "1/0/1.png".to_string(),
    };
    let builder = TilePyramidBuilder::new(Grid::web_mercator(256), store, options(0, 1));
    let summary = builder.build(synthetic_raster()).unwrap();
    assert_eq!(summary.written, 4);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, TileAddress::new(1, 0, 1));
    assert_eq!(summary.failed[0].1, "write error: read-only");
    assert!(!dir.join("1/0/1.png").exists());
    assert!(dir.join("1/1/1.png").exists());
}

#[test]
fn test_raster_outside_world() {
    let dir = test_dir("outside");
    let bounds = Extent {
        minx: 30000000.0,
        miny: 30000000.0,
        maxx: 31000000.0,
        maxy: 31000000.0,
    };
    let raster = ImageRaster::from_image("outside", RgbaImage::new(16, 16), bounds, 3857).unwrap();
    let summary = builder(&dir, options(0, 3)).build(raster).unwrap();
    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.written, 0);
    assert!(png_paths(&dir).is_empty());
}

#[test]
fn test_node_partitioning() {
    let full = test_dir("nodes_full");
    builder(&full, options(0, 3))
        .build(synthetic_raster())
        .unwrap();

    let mut union = Vec::new();
    let mut written = 0;
    for nodeno in 0..2 {
        let dir = test_dir(&format!("nodes_{}", nodeno));
        let opts = GenerateOptions {
            nodes: 2,
            nodeno,
            ..options(0, 3)
        };
        written += builder(&dir, opts)
            .build(synthetic_raster())
            .unwrap()
            .written;
        union.extend(png_paths(&dir));
    }
    union.sort();
    let expected = png_paths(&full);
    assert_eq!(written as usize, expected.len());
    // disjoint partitions covering all tiles
    assert_eq!(union, expected);
}

#[test]
fn test_parallel_equals_sequential() {
    let sequential = test_dir("sequential");
    let summary = builder(&sequential, options(0, 3))
        .build(synthetic_raster())
        .unwrap();
    assert_eq!(summary.written, 13);

    let parallel = test_dir("parallel");
    let opts = GenerateOptions {
        threads: 4,
        ..options(0, 3)
    };
    let raster = CorruptRaster {
        inner: synthetic_raster(),
        corrupt: TileAddress::new(2, 1, 1),
    };
    let summary = builder(&parallel, opts).build(raster).unwrap();
    assert_eq!(summary.attempted, 13);
    assert_eq!(summary.written, 12);
    assert_eq!(summary.failed[0].0, TileAddress::new(2, 1, 1));

    let mut expected = read_tree(&sequential);
    expected.remove("2/1/1.png");
    assert_eq!(read_tree(&parallel), expected);
}

#[test]
fn test_cancel() {
    let dir = test_dir("cancel");
    let builder = builder(&dir, options(0, 1));
    builder.cancel_flag().store(true, Ordering::SeqCst);
    let summary = builder.build(synthetic_raster()).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.attempted, 0);
    assert!(png_paths(&dir).is_empty());
}

#[test]
fn test_metadata() {
    let dir = test_dir("metadata");
    let opts = GenerateOptions {
        metadata: true,
        ..options(0, 1)
    };
    builder(&dir, opts).build(synthetic_raster()).unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(json["format"], "png");
    assert_eq!(json["minzoom"], 0);
    assert_eq!(json["maxzoom"], 1);
    let minx = json["bounds"][0].as_f64().unwrap();
    assert!((minx - -10.0).abs() < 0.000001);
}

#[test]
fn test_setup_errors() {
    let dir = test_dir("setup_errors");

    match builder(&dir, options(3, 2)).build(synthetic_raster()) {
        Err(SetupError::InvalidZoomRange { minzoom, maxzoom }) => {
            assert_eq!((minzoom, maxzoom), (3, 2))
        }
        _ => panic!("InvalidZoomRange expected"),
    }
    match builder(&dir, options(25, 26)).build(synthetic_raster()) {
        Err(SetupError::InvalidZoomRange { .. }) => {}
        _ => panic!("InvalidZoomRange expected"),
    }
    match build_pyramid(synthetic_raster(), 0, 1, 0, &dir) {
        Err(SetupError::InvalidTileSize) => {}
        _ => panic!("InvalidTileSize expected"),
    }

    let lv95 = Extent {
        minx: 2600000.0,
        miny: 1200000.0,
        maxx: 2601000.0,
        maxy: 1201000.0,
    };
    let raster = ImageRaster::from_image("lv95", RgbaImage::new(8, 8), lv95, 2056).unwrap();
    match builder(&dir, options(0, 1)).build(raster) {
        Err(SetupError::UnsupportedSrid { raster, grid }) => assert_eq!((raster, grid), (2056, 3857)),
        _ => panic!("UnsupportedSrid expected"),
    }
    // nothing created before failing
    assert!(!dir.exists());

    fs::create_dir_all(dir.parent().unwrap()).unwrap();
    fs::write(&dir, "not a directory").unwrap();
    let output = dir.join("tiles");
    match builder(&output, options(0, 1)).build(synthetic_raster()) {
        Err(SetupError::CreateOutput { .. }) => {}
        _ => panic!("CreateOutput expected"),
    }
    fs::remove_file(&dir).unwrap();
}

#[test]
fn test_from_config() {
    let config: ApplicationCfg =
        parse_config(TilePyramidBuilder::<Filestore>::gen_config(), "gen_config").unwrap();
    let builder: TilePyramidBuilder<Filestore> = TilePyramidBuilder::from_config(&config).unwrap();
    assert_eq!(builder.grid.tile_size(), 512);
    assert_eq!(builder.store.basepath, PathBuf::from("output"));
    assert_eq!(builder.options.minzoom, 13);
    assert_eq!(builder.options.maxzoom, 17);
    assert_eq!(builder.options.threads, 1);
    assert!(!builder.options.overwrite);
    assert!(builder.options.metadata);

    let toml = r#"
        [raster]
        path = "overlay.png"
        [output]
        base = "tiles"
        [generate]
        threads = 0
        nodes = 2
        nodeno = 1
        "#;
    let config: ApplicationCfg = parse_config(toml.to_string(), "test.toml").unwrap();
    let options = GenerateOptions::from_config(&config).unwrap();
    assert!(options.threads >= 1);
    assert_eq!((options.nodes, options.nodeno), (2, 1));

    let toml = r#"
        [raster]
        path = "overlay.png"
        [output]
        base = "tiles"
        [generate]
        nodes = 2
        nodeno = 2
        "#;
    let config: ApplicationCfg = parse_config(toml.to_string(), "test.toml").unwrap();
    assert_eq!(
        GenerateOptions::from_config(&config).err(),
        Some("Node number 2 out of range for 2 nodes".to_string())
    );
}
