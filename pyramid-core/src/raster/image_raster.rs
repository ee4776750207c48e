//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::RasterCfg;
use crate::raster::worldfile::WorldFile;
use crate::raster::{RasterError, RasterSource, Reprojection};
use image::{ImageError, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tile_grid::{Extent, Grid, TileAddress};

/// Decoded image with its georeference, kept in memory for the whole walk
pub struct ImageRaster {
    name: String,
    image: RgbaImage,
    bounds: Extent,
    srid: i32,
}

impl ImageRaster {
    /// Decode image file. Without `bounds`, the georeference is read from a world file.
    pub fn open(path: &str, bounds: Option<Extent>, srid: i32) -> Result<ImageRaster, RasterError> {
        info!("Reading raster {}", path);
        let image = image::open(path)
            .map_err(|e| match e {
                ImageError::IoError(ioerr) => RasterError::Io(ioerr),
                e => RasterError::Decode(e.to_string()),
            })?
            .to_rgba8();
        let bounds = match bounds {
            Some(bounds) => bounds,
            None => {
                let worldfile = WorldFile::read_for_image(Path::new(path))?;
                worldfile
                    .extent(image.width(), image.height())
                    .map_err(RasterError::Georeference)?
            }
        };
        ImageRaster::from_image(path, image, bounds, srid)
    }

    pub fn from_config(cfg: &RasterCfg) -> Result<ImageRaster, RasterError> {
        if cfg.path.is_empty() {
            return Err(RasterError::Georeference(
                "Missing raster path".to_string(),
            ));
        }
        ImageRaster::open(&cfg.path, cfg.bounds.as_ref().map(Extent::from), cfg.srid)
    }

    pub fn from_image(
        name: &str,
        image: RgbaImage,
        bounds: Extent,
        srid: i32,
    ) -> Result<ImageRaster, RasterError> {
        if !(bounds.minx < bounds.maxx && bounds.miny < bounds.maxy) {
            return Err(RasterError::Georeference(format!(
                "Invalid raster bounds {:?}",
                bounds
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(RasterError::Decode("Empty image".to_string()));
        }
        debug!(
            "{}: {}x{} pixels, bounds {:?} (EPSG:{})",
            name,
            image.width(),
            image.height(),
            bounds,
            srid
        );
        Ok(ImageRaster {
            name: name.to_string(),
            image,
            bounds,
            srid,
        })
    }

    pub fn gen_config() -> String {
        let toml = r#"
[raster]
path = "input/georeferenced-overlay.png"
# Bounds as [minx, miny, maxx, maxy]. Read from world file (.pgw, .jgw, .tfw, .wld) when omitted
#bounds = [-180.0, -85.0511, 180.0, 85.0511]
srid = 4326
"#;
        toml.to_string()
    }
}

impl RasterSource for ImageRaster {
    fn info(&self) -> String {
        format!(
            "Raster {} ({}x{} pixels)",
            self.name,
            self.image.width(),
            self.image.height()
        )
    }
    fn bounds(&self) -> Extent {
        self.bounds.clone()
    }
    fn srid(&self) -> i32 {
        self.srid
    }
    fn render_tile(&self, grid: &Grid, tile: &TileAddress) -> Result<Vec<u8>, RasterError> {
        let reprojection = Reprojection::new(self.srid, grid.srid)?;
        let extent = grid.tile_extent(tile.x, tile.y, tile.zoom);
        if !reprojection.extent(&self.bounds).intersects(&extent) {
            return Err(RasterError::OutOfBounds(*tile));
        }

        let size = grid.tile_size();
        let pixel_size = (extent.maxx - extent.minx) / size as f64;
        let (width, height) = self.image.dimensions();
        let src_width = (self.bounds.maxx - self.bounds.minx) / width as f64;
        let src_height = (self.bounds.maxy - self.bounds.miny) / height as f64;

        // Nearest neighbour sampling at pixel centers, transparent outside of the raster
        let mut tile_img = RgbaImage::new(size, size);
        for row in 0..size {
            let y = extent.maxy - (row as f64 + 0.5) * pixel_size;
            for col in 0..size {
                let x = extent.minx + (col as f64 + 0.5) * pixel_size;
                let (srcx, srcy) = reprojection.inverse_point(x, y);
                let px = ((srcx - self.bounds.minx) / src_width).floor();
                let py = ((self.bounds.maxy - srcy) / src_height).floor();
                if px >= 0.0 && py >= 0.0 && px < width as f64 && py < height as f64 {
                    tile_img.put_pixel(col, row, *self.image.get_pixel(px as u32, py as u32));
                }
            }
        }

        let mut png = Vec::new();
        tile_img
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| RasterError::Encode(e.to_string()))?;
        Ok(png)
    }
}
