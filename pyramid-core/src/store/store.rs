//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use std::io;

/// Destination of rendered tiles, addressed by relative paths like `z/x/y.png`
pub trait Tilestore {
    fn info(&self) -> String;
    /// Prepare store for writing
    fn init(&self) -> Result<(), io::Error>;
    /// Store `obj` at `path`. Readers never see partially written objects.
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error>;
    fn exists(&self, path: &str) -> bool;
}
