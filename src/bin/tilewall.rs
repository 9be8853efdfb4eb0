use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use tilewall::TileHook as _;

#[derive(Parser, Debug)]
#[command(name = "tilewall", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wall geometry and tile routing.
    Routes(RoutesArgs),
    /// Run the wall master with in-process display nodes.
    Wall(WallArgs),
    /// Run a synthetic render farm that streams gradient tiles to a wall.
    Farm(FarmArgs),
}

#[derive(Parser, Debug)]
struct RoutesArgs {
    /// Wall configuration file (defaults to $DW_CONFIG_FILE or `default.conf`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show the recipients of the tile at this pixel coordinate (`X,Y`).
    #[arg(long, value_parser = parse_vec2i)]
    tile: Option<tilewall::Vec2i>,
}

#[derive(Parser, Debug)]
struct WallArgs {
    /// Wall configuration file (defaults to $DW_CONFIG_FILE or `default.conf`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to accept the farm on (defaults to $DW_HOSTPORT or 4444).
    #[arg(long)]
    port: Option<u16>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Master preview size (`WxH`); defaults to the complete screen.
    #[arg(long, value_parser = parse_vec2i)]
    preview: Option<tilewall::Vec2i>,

    /// zstd-compress frames on the farm link.
    #[arg(long)]
    compress: bool,
}

#[derive(Parser, Debug)]
struct FarmArgs {
    /// Wall master host (defaults to $DW_HOSTNAME or `localhost`).
    #[arg(long)]
    host: Option<String>,

    /// Wall master port (defaults to $DW_HOSTPORT or 4444).
    #[arg(long)]
    port: Option<u16>,

    /// zstd-compress frames on the farm link.
    #[arg(long)]
    compress: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Routes(args) => cmd_routes(args),
        Command::Wall(args) => cmd_wall(args),
        Command::Farm(args) => cmd_farm(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_vec2i(s: &str) -> Result<tilewall::Vec2i, String> {
    let (a, b) = s
        .split_once([',', 'x'])
        .ok_or_else(|| format!("expected `X,Y` or `WxH`, got '{s}'"))?;
    let x = a.trim().parse().map_err(|_| format!("invalid number '{a}'"))?;
    let y = b.trim().parse().map_err(|_| format!("invalid number '{b}'"))?;
    Ok(tilewall::Vec2i::new(x, y))
}

fn opts_for(compress: bool) -> tilewall::FabricOpts {
    if compress {
        tilewall::FabricOpts::compressed()
    } else {
        tilewall::FabricOpts::raw()
    }
}

fn load_wall(
    config: Option<PathBuf>,
    settings: &tilewall::LinkSettings,
) -> anyhow::Result<tilewall::WallGeometry> {
    let path = config.unwrap_or_else(|| settings.config_file.clone());
    let cfg = tilewall::WallConfig::load(&path)?;
    Ok(tilewall::WallGeometry::new(cfg)?)
}

fn cmd_routes(args: RoutesArgs) -> anyhow::Result<()> {
    let settings = tilewall::LinkSettings::from_env()?;
    let geom = load_wall(args.config, &settings)?;
    println!(
        "complete screen {}, {} tiles, {} screens",
        geom.complete_screen(),
        geom.max_tiles(),
        geom.worker_count()
    );

    match args.tile {
        Some(coord) => {
            if geom.tile_id(coord).is_none() {
                anyhow::bail!("{coord} is not a tile origin on this wall");
            }
            println!("tile {coord} -> ranks {:?}", geom.ranks_for_tile(coord));
        }
        None => {
            for rank in 0..geom.worker_count() as tilewall::Rank {
                let vp = geom.node_viewport(rank)?;
                println!(
                    "rank {rank}: position {} size {} tiles {}",
                    vp.position,
                    vp.size,
                    geom.tiles_for_rank(rank).len()
                );
            }
        }
    }
    Ok(())
}

fn cmd_wall(args: WallArgs) -> anyhow::Result<()> {
    let settings = tilewall::LinkSettings::from_env()?;
    let geom = load_wall(args.config, &settings)?;
    let port = args.port.unwrap_or(settings.port);

    let (cluster, endpoints) = tilewall::LocalCluster::new(geom.worker_count());
    let world = cluster.world();
    let mut displays = Vec::with_capacity(endpoints.len());
    let mut workers = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let display = tilewall::DoubleBufferedDisplay::new().with_fullscreen(settings.fullscreen);
        displays.push(display.clone());
        workers.push(tilewall::WorkerNode::spawn(endpoint, Box::new(display))?);
    }

    let farm = tilewall::StreamFabric::listen_tcp(port, opts_for(args.compress))
        .with_context(|| format!("accept farm on port {port}"))?;
    let messenger: Arc<dyn tilewall::Messenger> = Arc::new(cluster);
    let balancer = tilewall::SetLoadBalancer::from_settings(&settings);
    let mut master =
        tilewall::MasterNode::new(*geom.config(), balancer, messenger, world, Box::new(farm))?;

    let preview = args.preview.unwrap_or(geom.complete_screen());
    let handle = master.create_framebuffer(
        preview,
        tilewall::PixelFormat::Rgba8,
        tilewall::work::create_fb::CHANNEL_COLOR,
    )?;
    for frame in 0..args.frames {
        master.render_frame(handle, tilewall::work::create_fb::CHANNEL_COLOR)?;
        let presented = displays.iter().filter(|d| d.frames() > u64::from(frame)).count();
        println!("frame {frame}: presented on {presented}/{} screens", displays.len());
    }
    master.release_framebuffer(handle)?;
    master.shutdown()?;

    for worker in workers {
        let rank = worker.rank();
        let tiles = worker.join()?;
        println!("rank {rank}: {tiles} tiles accepted");
    }
    Ok(())
}

fn cmd_farm(args: FarmArgs) -> anyhow::Result<()> {
    let settings = tilewall::LinkSettings::from_env()?;
    let host = args.host.unwrap_or(settings.host);
    let port = args.port.unwrap_or(settings.port);
    let mut link = tilewall::FarmLink::connect_tcp(&host, port, opts_for(args.compress))
        .with_context(|| format!("connect to wall at {host}:{port}"))?;

    let mut buffers: HashMap<tilewall::FbHandle, (tilewall::Vec2i, tilewall::PixelFormat)> =
        HashMap::new();
    let mut frame = 0u32;
    loop {
        match link.next_command()? {
            tilewall::FarmCommand::CreateFrameBuffer(c) => {
                buffers.insert(c.handle, (c.size, c.format));
            }
            tilewall::FarmCommand::RenderFrame(r) => {
                let &(size, format) = buffers
                    .get(&r.handle)
                    .with_context(|| format!("render of unknown framebuffer {}", r.handle))?;
                let bridge = tilewall::FarmBridge::new(r.handle, link.sender());
                render_gradient(&bridge, size, format, frame)?;
                bridge.flush()?;
                tracing::info!(frame, handle = %r.handle, "frame streamed");
                frame += 1;
            }
            tilewall::FarmCommand::ReleaseFrameBuffer(r) => {
                buffers.remove(&r.handle);
            }
            tilewall::FarmCommand::SetLoadBalancer(lb) => {
                tracing::info!(
                    dynamic = lb.dynamic,
                    preallocated = lb.preallocated_tiles,
                    "load balancer configured"
                );
            }
            tilewall::FarmCommand::Finalize => break,
        }
    }
    link.flush()?;
    println!("farm finished after {frame} frames");
    Ok(())
}

/// Render every tile of a `size` screen in parallel and hand each to the bridge as the
/// farm's compositor would.
fn render_gradient(
    bridge: &tilewall::FarmBridge,
    size: tilewall::Vec2i,
    format: tilewall::PixelFormat,
    frame: u32,
) -> tilewall::WallResult<()> {
    let t = tilewall::TILE_SIZE;
    let max = size.div_round_up(tilewall::Vec2i::splat(t));
    let coords: Vec<tilewall::Vec2i> = (0..max.y)
        .flat_map(|ty| (0..max.x).map(move |tx| tilewall::Vec2i::new(tx * t, ty * t)))
        .collect();
    let blue = (frame.wrapping_mul(16) % 256) as u8;

    coords.par_iter().try_for_each(|&coord| {
        let mut tile = tilewall::Tile::blank(format, coord);
        let bpp = format.bytes_per_pixel();
        for (i, px) in tile.pixels.chunks_exact_mut(bpp.max(1)).enumerate() {
            let x = coord.x + (i as i32 % t);
            let y = coord.y + (i as i32 / t);
            let rgba = [
                (x * 255 / size.x.max(1)).clamp(0, 255) as u8,
                (y * 255 / size.y.max(1)).clamp(0, 255) as u8,
                blue,
                255,
            ];
            match format {
                tilewall::PixelFormat::Rgba8 => px.copy_from_slice(&rgba),
                tilewall::PixelFormat::Rgba32F => {
                    for (dst, c) in px.chunks_exact_mut(4).zip(rgba) {
                        dst.copy_from_slice(&(f32::from(c) / 255.0).to_le_bytes());
                    }
                }
                tilewall::PixelFormat::None => {}
            }
        }
        bridge.tile_finished(&tile.encode())
    })
}
