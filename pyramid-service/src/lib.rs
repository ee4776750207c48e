//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_json;

pub mod builder;
#[cfg(test)]
mod builder_test;
pub mod error;
pub mod metadata;
pub mod summary;

pub use builder::{build_pyramid, GenerateOptions, TilePyramidBuilder};
pub use error::{SetupError, TileError};
pub use summary::{GenerateSummary, TileOutcome};
