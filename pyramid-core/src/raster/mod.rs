//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod image_raster;
pub mod raster;
pub mod worldfile;


pub use self::image_raster::ImageRaster;
pub use self::raster::{grid_bounds, RasterError, RasterSource, Reprojection};
pub use self::worldfile::WorldFile;
