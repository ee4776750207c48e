//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! ESRI world files (`.pgw`, `.jgw`, `.tfw`, `.wld`, ...)

use crate::raster::RasterError;
use std::fs;
use std::path::{Path, PathBuf};
use tile_grid::Extent;

/// Affine pixel to map transformation
#[derive(PartialEq, Clone, Debug)]
pub struct WorldFile {
    /// Pixel size in x direction
    pub pixel_width: f64,
    pub rotation_y: f64,
    pub rotation_x: f64,
    /// Pixel size in y direction, negative for north-up images
    pub pixel_height: f64,
    /// Map x of the center of the upper-left pixel
    pub x: f64,
    /// Map y of the center of the upper-left pixel
    pub y: f64,
}

impl WorldFile {
    pub fn parse(content: &str) -> Result<WorldFile, String> {
        let values = content
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| format!("Invalid number `{}` in world file", v))
            })
            .collect::<Result<Vec<f64>, String>>()?;
        if values.len() != 6 {
            return Err(format!(
                "World file requires 6 values, found {}",
                values.len()
            ));
        }
        Ok(WorldFile {
            pixel_width: values[0],
            rotation_y: values[1],
            rotation_x: values[2],
            pixel_height: values[3],
            x: values[4],
            y: values[5],
        })
    }

    /// Read the first existing world file next to `image_path`
    pub fn read_for_image(image_path: &Path) -> Result<WorldFile, RasterError> {
        let path = sidecar_paths(image_path)
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| {
                RasterError::Georeference(format!(
                    "No bounds configured and no world file found for {}",
                    image_path.display()
                ))
            })?;
        debug!("Reading world file {}", path.display());
        let content = fs::read_to_string(&path)?;
        WorldFile::parse(&content)
            .map_err(|e| RasterError::Georeference(format!("{}: {}", path.display(), e)))
    }

    /// Outer bounds of an image with `width` x `height` pixels
    pub fn extent(&self, width: u32, height: u32) -> Result<Extent, String> {
        if self.rotation_x != 0.0 || self.rotation_y != 0.0 {
            return Err("Rotated world files are not supported".to_string());
        }
        if self.pixel_width <= 0.0 || self.pixel_height == 0.0 {
            return Err("Invalid pixel size in world file".to_string());
        }
        // Image rows are sampled from the north edge downwards
        if self.pixel_height > 0.0 {
            return Err("South-up world files are not supported".to_string());
        }
        let minx = self.x - self.pixel_width / 2.0;
        let maxx = minx + self.pixel_width * width as f64;
        let maxy = self.y - self.pixel_height / 2.0;
        let miny = maxy + self.pixel_height * height as f64;
        Ok(Extent {
            minx,
            miny,
            maxx,
            maxy,
        })
    }
}

/// World file candidates: `overlay.tif` -> `overlay.tfw`, `overlay.tifw`, `overlay.wld`
pub fn sidecar_paths(image_path: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(ext) = image_path.extension().and_then(|e| e.to_str()) {
        let chars: Vec<char> = ext.chars().collect();
        if chars.len() >= 2 {
            let short = format!("{}{}w", chars[0], chars[chars.len() - 1]);
            paths.push(image_path.with_extension(short));
        }
        paths.push(image_path.with_extension(format!("{}w", ext)));
    }
    paths.push(image_path.with_extension("wld"));
    paths
}

#[test]
fn test_parse() {
    let wf = WorldFile::parse("0.5\n0.0\n0.0\n-0.5\n100.25\n199.75\n").unwrap();
    assert_eq!(wf.pixel_width, 0.5);
    assert_eq!(wf.pixel_height, -0.5);
    assert_eq!(
        wf.extent(200, 100).unwrap(),
        Extent {
            minx: 100.0,
            miny: 150.0,
            maxx: 200.0,
            maxy: 200.0,
        }
    );

    assert_eq!(
        WorldFile::parse("1 0 0 -1 5").err(),
        Some("World file requires 6 values, found 5".to_string())
    );
    assert_eq!(
        WorldFile::parse("1 0 0 -1 5 x").err(),
        Some("Invalid number `x` in world file".to_string())
    );

    let rotated = WorldFile::parse("1 0.1 0 -1 5 5").unwrap();
    assert!(rotated.extent(10, 10).is_err());

    let south_up = WorldFile::parse("0.2 0 0 0.2 -9.9 -9.9").unwrap();
    assert_eq!(
        south_up.extent(100, 100).err(),
        Some("South-up world files are not supported".to_string())
    );
}

#[test]
fn test_sidecar_paths() {
    assert_eq!(
        sidecar_paths(Path::new("input/overlay.tif")),
        vec![
            PathBuf::from("input/overlay.tfw"),
            PathBuf::from("input/overlay.tifw"),
            PathBuf::from("input/overlay.wld"),
        ]
    );
    assert_eq!(
        sidecar_paths(Path::new("overlay.jpeg"))[0],
        PathBuf::from("overlay.jgw")
    );
    assert_eq!(sidecar_paths(Path::new("overlay")), vec![PathBuf::from("overlay.wld")]);
}
