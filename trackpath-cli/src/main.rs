use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use trackpath_engine::destination::Destination;
use trackpath_engine::query::{choose_next_track, VehicleQuery};
use trackpath_graph::owner::Owner;
use trackpath_graph::segment::SegmentCache;
use trackpath_graph::tile::{RailData, RailType, Tile, TileGrid, TileType, Transport, TypeMask};
use trackpath_graph::trackdir::{Track, Trackdir};
use trackpath_graph::Settings;

#[derive(Parser, Debug)]
#[command(name = "trackpath-cli", author, version, about, long_about = None)]
struct Cli {
    /// log_2 of the synthetic map's width and height
    #[arg(long, default_value_t = 6)]
    map_log_size: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay a straight NE-SW rail line and ask for the next trackdir from one
    /// end towards the other.
    StraightRail {
        /// Tile x of the line's southwest end
        #[arg(long, default_value_t = 4)]
        start_x: u32,
        /// Tile y of the line's southwest end
        #[arg(long, default_value_t = 20)]
        start_y: u32,
        /// Number of tiles in the line
        #[arg(long, default_value_t = 10)]
        length: u32,
        /// Also run the PBS reservation pass against the found path
        #[arg(long)]
        reserve: bool,
    },
}

fn build_straight_rail_line(grid: &mut TileGrid, start_x: u32, start_y: u32, length: u32) -> Vec<(u32, u32)> {
    let mut coords = Vec::new();
    for i in 0..length {
        let (x, y) = (start_x + i, start_y.wrapping_sub(i));
        let idx = grid.index_of(x, y);
        *grid.get_mut(idx) = Tile {
            tile_type: TileType::Rail(RailData::new(Track::X.into(), RailType(0))),
            owner: Owner::Company(0),
            slope_up: None,
        };
        coords.push((x, y));
    }
    coords
}

fn run_straight_rail(map_log_size: u8, start_x: u32, start_y: u32, length: u32, reserve: bool) -> anyhow::Result<()> {
    let mut grid = TileGrid::new(map_log_size, map_log_size);
    let coords = build_straight_rail_line(&mut grid, start_x, start_y, length);
    let &(end_x, end_y) = coords.last().ok_or_else(|| anyhow!("length must be at least 1"))?;

    info!(start_x, start_y, end_x, end_y, length, "laid straight rail line");

    let settings = Settings::default();
    let destination = Destination::TileOrStation {
        tile: Some(grid.index_of(end_x, end_y)),
        accepted_trackdirs: None,
        station_index: None,
        requires_drive_through_if_articulated: false,
        is_articulated: false,
    };
    let query = VehicleQuery {
        transport: Transport::Rail,
        owner: Owner::Company(0),
        compatible_rail_types: Some(TypeMask::single(0)),
        compatible_road_types: None,
        forbid_90_deg: false,
        allow_public_road: false,
        destination,
    };

    let origin = grid.index_of(start_x, start_y);
    let segment_cache = SegmentCache::new();
    let result = choose_next_track(&mut grid, &query, &settings, origin, Trackdir::SwNe, reserve, &segment_cache);

    if !result.path_found {
        println!("no path found");
        return Ok(());
    }

    println!("path found, chosen trackdir: {:?}", result.chosen_trackdir);
    if let Some((tile, trackdir)) = result.target {
        let (tx, ty) = grid.coords(tile);
        println!("target reached at ({tx}, {ty}) via {trackdir:?}");
    }
    if let Some(reservation) = result.reservation {
        match reservation {
            Ok(n) => println!("reserved {n} tiles"),
            Err(e) => println!("reservation failed: {e}"),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::StraightRail { start_x, start_y, length, reserve } => {
            run_straight_rail(cli.map_log_size, start_x, start_y, length, reserve)
        }
    }
}
