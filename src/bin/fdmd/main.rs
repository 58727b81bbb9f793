//! FDMD CLI - Tool for inspecting FDMD models and their animations.

use std::env;
use std::path::Path;

use fdmd::anim::SampleMode;
use fdmd::mesh::VertexAttribute;
use fdmd::{Model, PlaybackConfig, PoseOrder};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Options shared by every command.
#[derive(Default)]
struct Options {
    json: bool,
    time: f64,
    config: PlaybackConfig,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut opts = Options::default();
    let mut config_path: Option<String> = None;
    let mut overrides: Vec<Box<dyn Fn(&mut PlaybackConfig)>> = Vec::new();
    let mut filtered_args: Vec<&str> = Vec::new();

    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "warn",
            "--json" => opts.json = true,
            "--linear" => {
                overrides.push(Box::new(|c: &mut PlaybackConfig| c.sample_mode = SampleMode::Linear))
            }
            "--legacy-order" => {
                overrides.push(Box::new(|c: &mut PlaybackConfig| c.pose_order = PoseOrder::SampleThenReset))
            }
            "--config" => match iter.next() {
                Some(path) => config_path = Some(path.clone()),
                None => fail("--config expects a file path"),
            },
            "-t" | "--time" => {
                opts.time = match iter.next().map(|s| s.parse()) {
                    Some(Ok(t)) => t,
                    _ => fail("--time expects a number of seconds"),
                };
            }
            "-a" | "--anim" => {
                let id: u8 = match iter.next().map(|s| s.parse()) {
                    Some(Ok(id)) => id,
                    _ => fail("--anim expects an animation id (0-255)"),
                };
                overrides.push(Box::new(move |c: &mut PlaybackConfig| c.active_animation = id));
            }
            _ => filtered_args.push(arg),
        }
    }

    init_logging(level);

    if let Some(path) = config_path {
        opts.config = match PlaybackConfig::load(&path) {
            Ok(c) => c,
            Err(e) => fail(&format!("Failed to load config {}: {}", path, e)),
        };
    }
    for apply in &overrides {
        apply(&mut opts.config);
    }

    if filtered_args.is_empty() {
        print_usage(&args[0]);
        return;
    }

    match filtered_args[0] {
        "info" | "i" => cmd_info(file_arg(&filtered_args, &args[0], "info"), &opts),
        "tree" | "t" => cmd_tree(file_arg(&filtered_args, &args[0], "tree"), &opts),
        "sample" | "s" => cmd_sample(file_arg(&filtered_args, &args[0], "sample"), &opts),
        "help" | "h" | "-h" | "--help" => print_usage(&args[0]),
        other => {
            // Assume it's a file path
            if Path::new(other).exists() {
                cmd_info(other, &opts);
            } else {
                eprintln!("Unknown command: {}", other);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File operand of a command, or exit with usage.
fn file_arg<'a>(args: &[&'a str], prog: &str, cmd: &str) -> &'a str {
    match args.get(1) {
        Some(path) => *path,
        None => fail(&format!("Usage: {} {} <file.fdmd>", prog, cmd)),
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("{}", msg);
    std::process::exit(1);
}

fn print_usage(prog: &str) {
    println!("FDMD CLI - Inspect FDMD models");
    println!();
    println!("Usage: {} [options] <command> <file.fdmd>", prog);
    println!();
    println!("Commands:");
    println!("  i, info    Show mesh, skeleton and animation summary");
    println!("  t, tree    Show the bone hierarchy");
    println!("  s, sample  Print joint matrices at a point in time");
    println!("  h, help    Show this help");
    println!();
    println!("Options:");
    println!("  -t, --time <s>     Sample time in seconds (default 0)");
    println!("  -a, --anim <id>    Animation to play (default 0)");
    println!("  --linear           Interpolate between keys instead of stepping");
    println!("  --legacy-order     Reset the pose after sampling");
    println!("  --config <file>    Load playback settings from JSON");
    println!("  --json             Machine-readable output");
    println!("  -v, --verbose      Debug output");
    println!("  -vv, --trace       Trace output (very verbose)");
    println!("  -q, --quiet        Warnings only");
}

fn open_model(path: &str, opts: &Options) -> Model {
    info!("Opening model: {}", path);
    match Model::open(path) {
        Ok(m) => {
            debug!("Model decoded successfully");
            m.with_config(opts.config.clone())
        }
        Err(e) => fail(&format!("Failed to open {}: {}", path, e)),
    }
}

fn attribute_name(attr: &VertexAttribute) -> &'static str {
    match attr {
        VertexAttribute::Position(_) => "position",
        VertexAttribute::Normal(_) => "normal",
        VertexAttribute::TexCoord2 { .. } => "texcoord2",
        VertexAttribute::TexCoord3 { .. } => "texcoord3",
        VertexAttribute::Color(_) => "color",
        VertexAttribute::BoneIds { .. } => "bone_ids",
        VertexAttribute::BoneWeights { .. } => "bone_weights",
    }
}

fn cmd_info(path: &str, opts: &Options) {
    let model = open_model(path, opts);

    if opts.json {
        let meshes: Vec<_> = model
            .meshes()
            .iter()
            .map(|m| {
                json!({
                    "id": m.mesh_id,
                    "vertices": m.vertex_count,
                    "attributes": m.attributes.iter().map(attribute_name).collect::<Vec<_>>(),
                })
            })
            .collect();
        let animations: Vec<_> = model
            .animations()
            .map(|a| json!({ "id": a.id(), "duration": a.duration(), "channels": a.channels().len() }))
            .collect();
        let skeleton = model.skeleton().map(|s| {
            json!({ "bones": s.bone_count(), "nodes": s.node_count(), "root": s.root_id() })
        });
        let out = json!({
            "file": path,
            "meshes": meshes,
            "skeleton": skeleton,
            "animation_slots": model.animation_count(),
            "animations": animations,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        return;
    }

    println!("Model: {}", path);
    println!();
    println!("Meshes ({}):", model.meshes().len());
    for mesh in model.meshes() {
        let attrs: Vec<_> = mesh.attributes.iter().map(attribute_name).collect();
        println!("  [{}] {} vertices - {}", mesh.mesh_id, mesh.vertex_count, attrs.join(", "));
    }
    println!();
    match model.skeleton() {
        Some(s) => println!("Skeleton: {} bones, {} nodes (root {})", s.bone_count(), s.node_count(), s.root_id()),
        None => println!("Skeleton: none"),
    }
    println!();
    println!("Animations ({} slots):", model.animation_count());
    for anim in model.animations() {
        println!("  [{}] {:.3}s - {} channels", anim.id(), anim.duration(), anim.channels().len());
    }
}

fn cmd_tree(path: &str, opts: &Options) {
    let model = open_model(path, opts);
    let Some(skeleton) = model.skeleton() else {
        println!("{}: no skeleton", path);
        return;
    };

    if opts.json {
        let nodes: Vec<_> = skeleton
            .depth_first()
            .map(|(depth, b)| {
                json!({
                    "id": b.id(),
                    "depth": depth,
                    "bone": b.is_bone(),
                    "parent": b.parent(),
                    "children": b.children(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&nodes).unwrap_or_default());
        return;
    }

    println!("Model: {}", path);
    println!();
    for (depth, bone) in skeleton.depth_first() {
        let indent = "  ".repeat(depth);
        let kind = if bone.is_bone() { "bone" } else { "pivot" };
        let t = bone.bind_pose().w_axis;
        println!("{}#{} [{}] at ({:.3}, {:.3}, {:.3})", indent, bone.id(), kind, t.x, t.y, t.z);
    }
}

fn cmd_sample(path: &str, opts: &Options) {
    let mut model = open_model(path, opts);
    let active = model.config().active_animation;
    if model.animation(active).is_none() {
        fail(&format!("{}: no animation with id {}", path, active));
    }
    model.seek(opts.time);

    if opts.json {
        let joints: Vec<_> = model.joints().iter().map(|m| m.to_cols_array()).collect();
        let out = json!({ "time": opts.time, "animation": active, "joints": joints });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        return;
    }

    println!("Model: {} (animation {}, t = {:.3}s)", path, active, opts.time);
    for (id, joint) in model.joints().iter().enumerate() {
        let c = joint.to_cols_array_2d();
        println!("  joint {}:", id);
        for row in 0..4 {
            println!(
                "    [{:9.4} {:9.4} {:9.4} {:9.4}]",
                c[0][row], c[1][row], c[2][row], c[3][row]
            );
        }
    }
}
