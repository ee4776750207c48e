//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::error::{SetupError, TileError};
use crate::metadata::{tilejson, wgs84_bounds, METADATA_PATH};
use crate::summary::{GenerateSummary, TileOutcome};
use pbr::ProgressBar;
use pyramid_core::core::config::{DEFAULT_MAXZOOM, DEFAULT_MINZOOM};
use pyramid_core::core::{ApplicationCfg, Config};
use pyramid_core::raster::{grid_bounds, ImageRaster, RasterSource};
use pyramid_core::store::{Filestore, Tilestore};
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tile_grid::{ExtentInt, Grid, GridIterator, TileAddress};
use tokio::task::{self, JoinError, JoinHandle};

pub const TILE_FORMAT: &str = "png";

#[derive(Clone, PartialEq, Debug)]
pub struct GenerateOptions {
    pub minzoom: u8,
    pub maxzoom: u8,
    /// Number of rendering threads. 1 renders on the calling thread.
    pub threads: usize,
    /// Number of generator nodes sharing the pyramid
    pub nodes: u64,
    /// Number of this node (0 <= nodeno < nodes)
    pub nodeno: u64,
    pub progress: bool,
    /// Re-render tiles which already exist
    pub overwrite: bool,
    /// Write TileJSON metadata into the output root
    pub metadata: bool,
}

impl Default for GenerateOptions {
    fn default() -> GenerateOptions {
        GenerateOptions {
            minzoom: DEFAULT_MINZOOM,
            maxzoom: DEFAULT_MAXZOOM,
            threads: 1,
            nodes: 1,
            nodeno: 0,
            progress: false,
            overwrite: true,
            metadata: false,
        }
    }
}

impl<'a> Config<'a, ApplicationCfg> for GenerateOptions {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        let cfg = &config.generate;
        let threads = match cfg.threads {
            Some(0) => num_cpus::get(),
            Some(n) => n,
            None => 1,
        };
        let nodes = cfg.nodes.unwrap_or(1) as u64;
        let nodeno = cfg.nodeno.unwrap_or(0) as u64;
        if nodeno >= nodes {
            return Err(format!(
                "Node number {} out of range for {} nodes",
                nodeno, nodes
            ));
        }
        Ok(GenerateOptions {
            minzoom: cfg.minzoom.unwrap_or(DEFAULT_MINZOOM),
            maxzoom: cfg.maxzoom.unwrap_or(DEFAULT_MAXZOOM),
            threads,
            nodes,
            nodeno,
            progress: cfg.progress.unwrap_or(true),
            overwrite: cfg.overwrite,
            metadata: config.output.metadata,
        })
    }
    fn gen_config() -> String {
        let toml = r#"
[generate]
minzoom = 13
maxzoom = 17
# Number of rendering threads (0: number of CPU cores)
threads = 1
# Distribute tiles over multiple generator nodes
#nodes = 2
#nodeno = 0
# Re-render tiles which already exist
overwrite = false
progress = true
"#;
        toml.to_string()
    }
}

/// Renders all tiles of a raster into a tile store
pub struct TilePyramidBuilder<S: Tilestore = Filestore> {
    pub grid: Grid,
    pub store: S,
    pub options: GenerateOptions,
    cancel: Arc<AtomicBool>,
}

impl<S> TilePyramidBuilder<S>
where
    S: Tilestore + Clone + Send + Sync + 'static,
{
    pub fn new(grid: Grid, store: S, options: GenerateOptions) -> TilePyramidBuilder<S> {
        TilePyramidBuilder {
            grid,
            store,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag stopping the walk before the next tile when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Zoom levels to generate, clipped to the grid
    fn zoom_range(&self) -> Result<(u8, u8), SetupError> {
        let (minzoom, maxzoom) = (self.options.minzoom, self.options.maxzoom);
        if minzoom > maxzoom || minzoom > self.grid.maxzoom() {
            return Err(SetupError::InvalidZoomRange { minzoom, maxzoom });
        }
        if maxzoom > self.grid.maxzoom() {
            warn!("Skipping zoom levels >{}", self.grid.maxzoom());
            return Ok((minzoom, self.grid.maxzoom()));
        }
        Ok((minzoom, maxzoom))
    }

    /// Generate all tiles of `minzoom..=maxzoom` intersecting the raster.
    ///
    /// Setup errors abort before the first tile. Failures of single tiles
    /// are logged, reported in the summary and don't stop the walk.
    pub fn build<R: RasterSource + 'static>(
        &self,
        raster: R,
    ) -> Result<GenerateSummary, SetupError> {
        if self.grid.tile_size() == 0 {
            return Err(SetupError::InvalidTileSize);
        }
        let (minzoom, maxzoom) = self.zoom_range()?;
        if self.options.nodes == 0 || self.options.nodeno >= self.options.nodes {
            return Err(SetupError::Config(format!(
                "Node number {} out of range for {} nodes",
                self.options.nodeno, self.options.nodes
            )));
        }
        let extent =
            grid_bounds(&raster, &self.grid).map_err(|_| SetupError::UnsupportedSrid {
                raster: raster.srid(),
                grid: self.grid.srid,
            })?;
        debug!("raster extent: {:?}", extent);

        info!("{}", self.store.info());
        self.store
            .init()
            .map_err(|source| SetupError::CreateOutput {
                target: self.store.info(),
                source,
            })?;
        if self.options.metadata {
            let json = tilejson(
                &raster.info(),
                &wgs84_bounds(&extent),
                minzoom,
                maxzoom,
                self.grid.tile_size(),
            );
            match serde_json::to_vec_pretty(&json) {
                Ok(bytes) => {
                    if let Err(e) = self.store.write(METADATA_PATH, &bytes) {
                        warn!("Error writing {}: {}", METADATA_PATH, e);
                    }
                }
                Err(e) => warn!("Error encoding {}: {}", METADATA_PATH, e),
            }
        }

        let tolerance = 0;
        let limits = self.grid.tile_limits(extent, tolerance);
        debug!("tile limits: {:?}", &limits[minzoom as usize..=maxzoom as usize]);

        let mut rt_builder = if self.options.threads > 1 {
            let mut rt_builder = tokio::runtime::Builder::new_multi_thread();
            rt_builder.max_blocking_threads(self.options.threads);
            rt_builder
        } else {
            tokio::runtime::Builder::new_current_thread()
        };
        let rt = rt_builder.enable_all().build().map_err(SetupError::Runtime)?;
        let summary = rt.block_on(self.generate_tiles(Arc::new(raster), limits, minzoom, maxzoom));
        if self.options.progress {
            println!("");
        }
        info!(
            "{} tiles attempted, {} written, {} skipped",
            summary.attempted,
            summary.written,
            summary.skipped()
        );
        Ok(summary)
    }

    fn progress_bar(&self, msg: &str, limits: &ExtentInt) -> ProgressBar<Stdout> {
        let mut pb = ProgressBar::new(limits.count());
        pb.message(msg);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.show_time_left = false;
        pb
    }

    async fn generate_tiles<R: RasterSource + 'static>(
        &self,
        raster: Arc<R>,
        limits: Vec<ExtentInt>,
        minzoom: u8,
        maxzoom: u8,
    ) -> GenerateSummary {
        // Bounded queue of rendering tasks, awaited in completion order
        let parallel = self.options.threads > 1;
        let task_queue_size = self.options.threads * 2;
        let mut tasks = Vec::with_capacity(task_queue_size);
        let mut summary = GenerateSummary::new();
        let griditer = GridIterator::new(minzoom, maxzoom, limits.clone());
        let mut pb: Option<ProgressBar<Stdout>> = None;
        let mut pb_z = None;
        for (tileno, tile) in griditer.enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("Tile generation cancelled before {}", tile);
                summary.cancelled = true;
                break;
            }
            if self.options.progress && pb_z != Some(tile.zoom) {
                pb_z = Some(tile.zoom);
                let limit = &limits[tile.zoom as usize];
                debug!("level {}: {:?}", tile.zoom, limit);
                let mut bar = self.progress_bar(&format!("Level {}: ", tile.zoom), limit);
                bar.tick();
                pb = Some(bar);
            }

            let skip = tileno as u64 % self.options.nodes != self.options.nodeno;
            if !skip {
                let path = tile.path(TILE_FORMAT);
                if !self.options.overwrite && self.store.exists(&path) {
                    debug!("{} exists", path);
                    summary.existing += 1;
                } else if parallel {
                    let grid = self.grid.clone();
                    let store = self.store.clone();
                    let raster = raster.clone();
                    tasks.push(task::spawn_blocking(move || {
                        generate_tile(&grid, &store, &*raster, tile)
                    }));
                    if tasks.len() >= task_queue_size {
                        let (result, remaining) = await_one_task(tasks).await;
                        tasks = remaining;
                        record(&mut summary, result);
                    }
                } else {
                    let outcome = generate_tile(&self.grid, &self.store, &*raster, tile);
                    record(&mut summary, Ok(outcome));
                }
            }

            if let Some(ref mut pb) = pb {
                pb.inc();
            }
        }
        // Finish remaining tasks
        for result in futures_util::future::join_all(tasks).await {
            record(&mut summary, result);
        }
        summary.finish()
    }
}

impl<'a> Config<'a, ApplicationCfg> for TilePyramidBuilder<Filestore> {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        let grid = Grid::from_config(&config.grid)?;
        let store = Filestore::from_config(&config.output)?;
        let options = GenerateOptions::from_config(config)?;
        Ok(TilePyramidBuilder::new(grid, store, options))
    }
    fn gen_config() -> String {
        let mut config = String::new();
        config.push_str(&ImageRaster::gen_config());
        config.push_str(&Grid::gen_config());
        config.push_str(&Filestore::gen_config());
        config.push_str(&GenerateOptions::gen_config());
        config
    }
}

/// Render a single tile and store it at `z/x/y.png`
pub fn generate_tile<R, S>(grid: &Grid, store: &S, raster: &R, tile: TileAddress) -> TileOutcome
where
    R: RasterSource + ?Sized,
    S: Tilestore,
{
    let now = Instant::now();
    let result = raster
        .render_tile(grid, &tile)
        .map_err(TileError::Render)
        .and_then(|png| {
            store
                .write(&tile.path(TILE_FORMAT), &png)
                .map(|_| png.len())
                .map_err(TileError::Write)
        });
    TileOutcome {
        tile,
        result,
        elapsed_ms: now.elapsed().as_millis() as u64,
    }
}

fn record(summary: &mut GenerateSummary, result: Result<TileOutcome, JoinError>) {
    match result {
        Ok(outcome) => {
            match &outcome.result {
                Ok(bytes) => debug!(
                    "{} written ({} bytes, {}ms)",
                    outcome.tile, bytes, outcome.elapsed_ms
                ),
                Err(e) if e.is_out_of_bounds() => debug!("{} skipped - {}", outcome.tile, e),
                Err(e) => warn!("Skipping tile {} - {}", outcome.tile, e),
            }
            summary.add(outcome);
        }
        Err(e) => error!("Tile task failed: {}", e),
    }
}

async fn await_one_task<T>(tasks: Vec<JoinHandle<T>>) -> (Result<T, JoinError>, Vec<JoinHandle<T>>) {
    // Wait for any future to complete
    let (result, _index, remaining) = futures_util::future::select_all(tasks).await;
    (result, remaining)
}

/// Build a Web Mercator pyramid of `minzoom..=maxzoom` into `output_root`.
///
/// Returns the number of tiles written.
pub fn build_pyramid<R, P>(
    raster: R,
    minzoom: u8,
    maxzoom: u8,
    tile_size: u32,
    output_root: P,
) -> Result<u64, SetupError>
where
    R: RasterSource + 'static,
    P: Into<PathBuf>,
{
    if tile_size == 0 {
        return Err(SetupError::InvalidTileSize);
    }
    let options = GenerateOptions {
        minzoom,
        maxzoom,
        ..Default::default()
    };
    let builder = TilePyramidBuilder::new(
        Grid::web_mercator(tile_size),
        Filestore::new(output_root),
        options,
    );
    let summary = builder.build(raster)?;
    Ok(summary.written)
}
