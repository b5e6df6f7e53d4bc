//! Brick assembly driver - builds a test shape and runs the full pipeline.
//!
//! Usage: cargo run --release --bin brickify -- [OPTIONS]
//!
//! Options:
//!   --shape <NAME>      block or sphere (default: block)
//!   --width <N>         Block width in studs (default: 8)
//!   --height <N>        Block height in levels (default: 6)
//!   --depth <N>         Block depth in studs (default: 8)
//!   --size <N>          Sphere diameter (default: 16)
//!   --seed <SEED>       Random seed, 0 = from the clock (default: config)
//!   --shell <N>         Pre-hollow, keeping a shell N voxels thick
//!   --post-hollow       Remove inner bricks after optimizing
//!   --limit <WxL=N>     Quota for one footprint, repeatable
//!   --color <R,G,B>     Brick colour, snapped to the closest palette entry
//!   --config <FILE>     JSON assembly config
//!   --json              Print statistics as JSON

use std::process::ExitCode;
use std::time::Instant;

use brickify::assembly::{AssemblyConfig, BrickModel, VoxelShape};
use brickify::brick::BrickSize;
use brickify::core::{Error, Result, Vec3};

fn main() -> ExitCode {
    brickify::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let mut config = match parse_str_arg(args, "--config") {
        Some(path) => AssemblyConfig::load(path)?,
        None => AssemblyConfig::default(),
    };
    if let Some(seed) = parse_u64_arg(args, "--seed") {
        config.seed = seed;
    }
    for limit in parse_all_str_args(args, "--limit") {
        let (size, max) = parse_limit(&limit)?;
        config = config.with_limit(size, max);
    }
    if let Some(rgb) = parse_str_arg(args, "--color") {
        let rgb = parse_rgb(&rgb)?;
        if let Some(color) = config.palette.closest(rgb) {
            config.default_color = color;
        }
    }

    let shape_name = parse_str_arg(args, "--shape").unwrap_or_else(|| "block".to_string());
    let shape = match shape_name.as_str() {
        "block" => VoxelShape::block(
            parse_i32_arg(args, "--height").unwrap_or(6),
            parse_i32_arg(args, "--width").unwrap_or(8),
            parse_i32_arg(args, "--depth").unwrap_or(8),
        ),
        "sphere" => VoxelShape::sphere(parse_i32_arg(args, "--size").unwrap_or(16)),
        other => return Err(Error::Config(format!("unknown shape '{}'", other))),
    };
    let shell = parse_i32_arg(args, "--shell");
    let post_hollow = args.iter().any(|a| a == "--post-hollow");
    let json = args.iter().any(|a| a == "--json");

    println!("=== Brickify ===");
    println!("Shape:  {} ({}x{}x{}, {} voxels)", shape_name, shape.height, shape.width, shape.depth, shape.len());
    println!("Seed:   {}", config.seed);
    for limit in &config.brick_limits {
        println!("Limit:  {} <= {}", limit.size, limit.max);
    }
    println!();

    let start = Instant::now();
    let mut model = BrickModel::from_shape(config, &shape)?;

    if let Some(shell) = shell {
        let report = model.pre_hollow(shell)?;
        println!("Pre-hollow:  -{} voxels", report.removed);
    }

    let report = model.auto_optimize();
    println!(
        "Optimize:    {} bricks in {:.1?} ({} + {} rounds)",
        report.brick_count, report.elapsed, report.con_comp_iterations, report.art_point_iterations
    );

    if !model.config().brick_limits.is_empty() {
        let report = model.solve_brick_number_limitation();
        println!("Limits:      {} cuts", report.cuts_applied);
        for shortfall in &report.shortfalls {
            println!(
                "  {} still {} (limit {})",
                shortfall.size, shortfall.count, shortfall.limit
            );
        }
    }

    if post_hollow {
        let report = model.post_hollow();
        println!("Post-hollow: -{} bricks", report.removed);
    }

    println!("Total time:  {:.1?}", start.elapsed());
    println!();

    let stats = model.stats();
    if json {
        println!("{}", stats.to_json()?);
    } else {
        print!("{}", stats);
    }
    Ok(())
}

fn parse_limit(s: &str) -> Result<(BrickSize, usize)> {
    let (size, max) = s
        .split_once('=')
        .ok_or_else(|| Error::Config(format!("expected WxL=N, got '{}'", s)))?;
    let size: BrickSize = size.parse().map_err(Error::Config)?;
    let max = max
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("bad limit in '{}'", s)))?;
    Ok((size, max))
}

fn parse_rgb(s: &str) -> Result<Vec3> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::Config(format!("bad colour '{}'", s)))?;
    match parts.as_slice() {
        [r, g, b] => Ok(Vec3::new(*r, *g, *b)),
        _ => Err(Error::Config(format!("expected R,G,B, got '{}'", s))),
    }
}

fn parse_i32_arg(args: &[String], flag: &str) -> Option<i32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_all_str_args(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}
