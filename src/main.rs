//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

mod runtime_config;

use clap::{App, AppSettings, ArgMatches, SubCommand};
use dotenv::dotenv;
use env_logger::Builder;
use log::Record;
use pyramid_core::core::Config;
use pyramid_core::raster::ImageRaster;
use pyramid_core::store::Filestore;
use pyramid_service::{SetupError, TilePyramidBuilder};
use runtime_config::{config_from_args, merc_range, parse_tile_address};
use std::env;
use std::io::Write;
use std::process;
use tile_grid::tile_lonlat;
use time;

fn init_logger(args: &ArgMatches<'_>) {
    let mut builder = Builder::new();
    builder.format(|buf, record: &Record<'_>| {
        let t = time::now();
        writeln!(
            buf,
            "{}.{:03} {} {}",
            time::strftime("%Y-%m-%d %H:%M:%S", &t).unwrap_or_default(),
            t.tm_nsec / 1000_000,
            record.level(),
            record.args()
        )
    });

    let rust_log_env = env::var("RUST_LOG");
    let rust_log = match (args.value_of("loglevel"), rust_log_env.as_ref()) {
        (None, Ok(rust_log)) => rust_log.as_str(),
        (loglevel, _) => match loglevel.unwrap_or("info") {
            "debug" => "debug,tokio=info",
            loglevel => loglevel,
        },
    };
    builder.parse_filters(rust_log);

    builder.init();
}

fn generate(args: &ArgMatches<'_>) {
    let config = config_from_args(&args);
    let builder: TilePyramidBuilder<Filestore> = TilePyramidBuilder::from_config(&config)
        .unwrap_or_else(|err| {
            println!("Error reading configuration - {} ", err);
            process::exit(1)
        });
    if builder.options.progress {
        println!("Generating tiles into {}...", config.output.base);
    }
    let result = ImageRaster::from_config(&config.raster)
        .map_err(|source| SetupError::OpenRaster {
            path: config.raster.path.clone(),
            source,
        })
        .and_then(|raster| builder.build(raster));
    match result {
        Ok(summary) => print!("{}", summary),
        Err(e) => {
            error!("{}", e);
            process::exit(1)
        }
    }
}

fn tilecoord(args: &ArgMatches<'_>) {
    let tile = parse_tile_address(args.value_of("TILE").unwrap_or_default()).unwrap_or_else(|err| {
        println!("{}", err);
        process::exit(1)
    });
    let (lon, lat) = tile_lonlat(tile.x, tile.y, tile.zoom);
    println!("{}: lat {} lon {}", tile, lat, lon);
}

fn reproject(args: &ArgMatches<'_>) {
    let (xmin, xmax, ymin, ymax) = merc_range(args.value_of("POINTS").unwrap_or_default())
        .unwrap_or_else(|err| {
            println!("{}", err);
            process::exit(1)
        });
    println!("Xmin: {}", xmin);
    println!("Xmax: {}", xmax);
    println!("Ymin: {}", ymin);
    println!("Ymax: {}", ymax);
}

fn main() {
    dotenv().ok();
    // http://kbknapp.github.io/clap-rs/clap/
    let mut app = App::new("tile_pyramid")
        .version(crate_version!())
        .author("Pirmin Kalberer <pka@sourcepole.ch>")
        .about("Web Mercator PNG tile pyramid generator for georeferenced raster images")
        .subcommand(SubCommand::with_name("generate")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=[FILE] 'Load from custom config file'
                                              --raster=[FILE] 'Georeferenced raster image'
                                              --bounds=[minx,miny,maxx,maxy[,srid]] 'Raster bounds (Default: world file)'
                                              --output=[DIR] 'Output directory'
                                              --tilesize=[PIXELS] 'Tile width and height (Default: 512)'
                                              --minzoom=[LEVEL] 'Minimum zoom level (Default: 13)'
                                              --maxzoom=[LEVEL] 'Maximum zoom level (Default: 17)'
                                              --threads=[NUM] 'Number of rendering threads (0: number of cores)'
                                              --nodes=[NUM] 'Number of generator nodes'
                                              --nodeno=[NUM] 'Number of this nodes (0 <= n < nodes)'
                                              --progress=[true|false] 'Show progress bar'
                                              --overwrite=[false|true] 'Overwrite previously generated tiles'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Generate tile pyramid"))
        .subcommand(SubCommand::with_name("genconfig")
                        .args_from_usage("--loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Generate configuration template"))
        .subcommand(SubCommand::with_name("tilecoord")
                        .args_from_usage("<TILE> 'Tile address z/x/y'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Latitude and longitude of the north-west tile corner"))
        .subcommand(SubCommand::with_name("reproject")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("<POINTS> 'WGS84 points lon,lat,lon,lat,..'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Web Mercator range of WGS84 points"));

    match app.get_matches_from_safe_borrow(env::args()) {
        //app.get_matches() prohibits later call of app.print_help()
        Result::Err(e) => {
            println!("{}", e);
        }
        Result::Ok(matches) => match matches.subcommand() {
            ("generate", Some(sub_m)) => {
                init_logger(sub_m);
                generate(sub_m);
            }
            ("genconfig", Some(sub_m)) => {
                init_logger(sub_m);
                println!("{}", TilePyramidBuilder::<Filestore>::gen_config());
            }
            ("tilecoord", Some(sub_m)) => {
                init_logger(sub_m);
                tilecoord(sub_m);
            }
            ("reproject", Some(sub_m)) => {
                init_logger(sub_m);
                reproject(sub_m);
            }
            _ => {
                let _ = app.print_help();
                println!("");
            }
        },
    }
}
