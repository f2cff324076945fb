//! Sample tileset generator
//!
//! Usage: cargo run --release --bin generate_samples -- [OPTIONS]
//!
//! Options:
//!   --output <DIR>       Output root (default: "output")
//!   --data <DIR>         Directory holding the source .glb meshes (default: "data")
//!   --glb                Write tile content as .glb instead of .gltf
//!   --pretty             Indent JSON output
//!   --gzip               Gzip every written file
//!   --separate-buffers   Write .gltf buffers as sidecar .bin files
//!   --count <N>          Instances per model in instanced samples (default: 25)
//!   --verbose            Log per-operation detail
//!   --sample <NAME>      Only generate this sample (repeatable); one of
//!                        TilesetWithDiscreteLOD, TilesetWithTreeBillboards
//!
//! Output structure:
//!   <output>/Samples/
//!     TilesetWithDiscreteLOD/
//!       tileset.json
//!       dragon_low.gltf, dragon_medium.gltf, dragon_high.gltf
//!     TilesetWithTreeBillboards/
//!       tileset.json
//!       tree.gltf, tree_billboard.gltf

use std::path::PathBuf;
use std::process::ExitCode;

use tilesynth::core::logging;
use tilesynth::io;
use tilesynth::samples::{ContentFormat, OutputOptions, SampleConfig, SampleKind};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--verbose") {
        logging::init_with_filter(logging::VERBOSE_FILTER);
    } else {
        logging::init();
    }
    let defaults = SampleConfig::default();

    let mut kinds = Vec::new();
    for name in parse_all_str_args(&args, "--sample") {
        match SampleKind::from_name(&name) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => {}
            None => {
                eprintln!("Unknown sample: {}", name);
                return ExitCode::FAILURE;
            }
        }
    }
    if kinds.is_empty() {
        kinds.extend(SampleKind::ALL);
    }

    let instance_count = match parse_str_arg(&args, "--count").map(|s| s.parse::<i64>()) {
        None => defaults.instance_count,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("Invalid --count: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = SampleConfig {
        instance_count,
        format: if has_flag(&args, "--glb") { ContentFormat::Glb } else { ContentFormat::Gltf },
        data_dir: parse_str_arg(&args, "--data").map(PathBuf::from).unwrap_or(defaults.data_dir.clone()),
        output_dir: parse_str_arg(&args, "--output").map(PathBuf::from).unwrap_or(defaults.output_dir.clone()),
        output: OutputOptions {
            pretty_print: has_flag(&args, "--pretty"),
            compress: has_flag(&args, "--gzip"),
            embed_binary_inline: !has_flag(&args, "--separate-buffers"),
        },
        ..defaults
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    println!("=== Tileset Sample Generator ===");
    println!("Samples: {}", kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", "));
    println!("Data:    {}", config.data_dir.display());
    println!("Output:  {}", config.output_dir.display());
    println!("Format:  {}", config.format.extension());
    println!();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let summary = runtime.block_on(io::run(&config, &kinds));

    println!();
    for (kind, paths) in &summary.written {
        println!("  {:<28} {} files", kind.name(), paths.len());
    }
    for (kind, err) in &summary.failed {
        println!("  {:<28} FAILED: {}", kind.name(), err);
    }

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
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
