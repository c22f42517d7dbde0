//! Prints how a selection would be clustered and tiled into generation windows.
//!
//! Usage: cargo run --bin voxfill-plan -- --box x0,y0,z0,x1,y1,z1 [OPTIONS]
//!
//! Options:
//!   --box <BOX>              Selection box, min and max corners (repeatable)
//!   --context <X,Y,Z>        Boundary context offset (default: -context size)
//!   --size <X,Y,Z>           Generation window size (default: 16,16,16)
//!   --context-size <X,Y,Z>   Steady-state context length (default: 8,8,8)

use serde_json::json;

use voxfill::core::{logging, IVec3};
use voxfill::generation::config::{GENERATION_CONTEXT_SIZE, GENERATION_SIZE};
use voxfill::math::Aabb;
use voxfill::selection::{contiguous_selections, SelectionGroup};
use voxfill::tiling::WindowTiler;

fn print_help() {
    eprintln!("voxfill-plan - Show generation windows for a selection");
    eprintln!();
    eprintln!("Usage: voxfill-plan --box x0,y0,z0,x1,y1,z1 [--box ...] [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    --context <X,Y,Z>        Boundary context offset (default: -context size)");
    eprintln!("    --size <X,Y,Z>           Generation window size (default: 16,16,16)");
    eprintln!("    --context-size <X,Y,Z>   Steady-state context length (default: 8,8,8)");
    eprintln!("    -h, --help               Show this help message");
}

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        print_help();
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let boxes = parse_box_args(args)?;
    if boxes.is_empty() {
        return Err("at least one --box is required".to_string());
    }
    let size = parse_ivec3_arg(args, "--size")?.unwrap_or(GENERATION_SIZE);
    let context_size = parse_ivec3_arg(args, "--context-size")?.unwrap_or(GENERATION_CONTEXT_SIZE);
    let context = parse_ivec3_arg(args, "--context")?.unwrap_or(-context_size);

    let selection = SelectionGroup::new(boxes);
    let tiler = WindowTiler::new(size, context_size)
        .map_err(|e| e.to_string())?
        .with_context_offset(context);

    let clusters = contiguous_selections(&selection);
    let windows = tiler.plan(&selection);

    let output = json!({
        "volume": selection.volume(),
        "clusters": clusters,
        "windows": windows,
    });
    let text = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn parse_ints(value: &str, count: usize, flag: &str) -> Result<Vec<i32>, String> {
    let values: Vec<i32> = value
        .split(',')
        .map(|s| s.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("{} expects {} comma-separated integers, got {:?}", flag, count, value))?;
    if values.len() != count {
        return Err(format!("{} expects {} comma-separated integers, got {:?}", flag, count, value));
    }
    Ok(values)
}

fn parse_box_args(args: &[String]) -> Result<Vec<Aabb>, String> {
    args.iter()
        .enumerate()
        .filter(|(_, a)| *a == "--box")
        .map(|(i, _)| -> Result<Aabb, String> {
            let value = args.get(i + 1).ok_or("--box needs a value")?;
            let v = parse_ints(value, 6, "--box")?;
            Ok(Aabb::from_corners([v[0], v[1], v[2]], [v[3], v[4], v[5]]))
        })
        .collect()
}

fn parse_ivec3_arg(args: &[String], flag: &str) -> Result<Option<IVec3>, String> {
    let Some(value) = args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)) else {
        return Ok(None);
    };
    let v = parse_ints(value, 3, flag)?;
    Ok(Some(IVec3::new(v[0], v[1], v[2])))
}
