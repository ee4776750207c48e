//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::OutputCfg;
use crate::core::Config;
use crate::store::store::Tilestore;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

/// Tile directory tree
#[derive(Clone, Debug)]
pub struct Filestore {
    pub basepath: PathBuf,
}

impl Filestore {
    pub fn new<P: Into<PathBuf>>(basepath: P) -> Filestore {
        Filestore {
            basepath: basepath.into(),
        }
    }
    pub fn fullpath(&self, path: &str) -> PathBuf {
        self.basepath.join(path)
    }
}

impl Tilestore for Filestore {
    fn info(&self) -> String {
        format!("Tile directory: {}", self.basepath.display())
    }
    fn init(&self) -> Result<(), io::Error> {
        fs::create_dir_all(&self.basepath)
    }
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error> {
        let fullpath = self.fullpath(path);
        debug!("Filestore.write {}", fullpath.display());
        if let Some(dir) = fullpath.parent() {
            fs::create_dir_all(dir)?;
        }
        // Write next to the target and move into place
        let mut tmpname = OsString::from(fullpath.as_os_str());
        tmpname.push(".tmp");
        let tmppath = PathBuf::from(tmpname);
        let result = File::create(&tmppath)
            .and_then(|mut f| f.write_all(obj))
            .and_then(|_| fs::rename(&tmppath, &fullpath));
        if result.is_err() {
            let _ = fs::remove_file(&tmppath);
        }
        result
    }
    fn exists(&self, path: &str) -> bool {
        self.fullpath(path).exists()
    }
}

impl<'a> Config<'a, OutputCfg> for Filestore {
    fn from_config(config: &OutputCfg) -> Result<Self, String> {
        if config.base.is_empty() {
            return Err("Missing output directory".to_string());
        }
        Ok(Filestore::new(&config.base))
    }
    fn gen_config() -> String {
        let toml = r#"
[output]
# Tiles are written to <base>/{z}/{x}/{y}.png
base = "output"
# TileJSON descriptor <base>/metadata.json
metadata = true
"#;
        toml.to_string()
    }
}
