use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use image::ImageReader;
use indicatif::{ProgressBar, ProgressStyle};
use psd_mosaic_core::config::{ImportConfig, ImportMode, PackHeuristic};
use psd_mosaic_core::document::{BlendMode, Document, LayerNode};
use psd_mosaic_core::import;
use psd_mosaic_core::reconcile::ImportState;
use serde::Deserialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "psd-mosaic",
    about = "Import a layered-document manifest into a sprite mosaic",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a manifest and write the texture, sprite records, and placement tree
    Import(ImportArgs),
}

#[derive(Parser, Debug, Clone)]
struct ImportArgs {
    // Input/Output
    /// Manifest file: a JSON layer tree with per-layer PNG sources
    #[arg(help_heading = "Input/Output")]
    manifest: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Document base name (files will be name.png/.sprites.json/.prefab.json)
    #[arg(short, long, default_value = "document", help_heading = "Input/Output")]
    name: String,
    /// State file carrying identity between imports (default: <out_dir>/<name>.state.json)
    #[arg(long, help_heading = "Input/Output")]
    state: Option<PathBuf>,

    // Import
    /// Composite everything into one flat image instead of packing a mosaic
    #[arg(long, default_value_t = false, help_heading = "Import")]
    flatten: bool,
    /// Extract hidden layers too
    #[arg(long, default_value_t = false, help_heading = "Import")]
    include_hidden: bool,
    /// Padding between packed sprites (px)
    #[arg(long, default_value_t = 4, help_heading = "Import")]
    padding: u32,
    /// Upper bound on page width/height
    #[arg(long, default_value_t = 4096, help_heading = "Import")]
    max_atlas_size: u32,
    /// Packing heuristic: baf|bssf|blsf|bl
    #[arg(long, default_value = "baf", help_heading = "Import")]
    heuristic: String,
    /// Emit duplicate sprite names verbatim instead of suffixing
    #[arg(long, default_value_t = false, help_heading = "Import")]
    keep_duplicate_names: bool,
    /// Discard record customizations and rebuild sprites from the layers
    #[arg(long, default_value_t = false, help_heading = "Import")]
    reslice: bool,
    /// Emit a flat placement list instead of the full group tree
    #[arg(long, default_value_t = false, help_heading = "Import")]
    no_hierarchy: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Import(args) => run_import(args, cli.progress && !cli.quiet),
    }
}

fn run_import(a: &ImportArgs, show_progress: bool) -> anyhow::Result<()> {
    let text = fs::read_to_string(&a.manifest)
        .with_context(|| format!("read {}", a.manifest.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("parse {}", a.manifest.display()))?;
    let base = a
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&a.out_dir)
        .with_context(|| format!("create out_dir {}", a.out_dir.display()))?;

    let heuristic = match a.heuristic.parse::<PackHeuristic>() {
        Ok(h) => h,
        Err(()) => anyhow::bail!("unknown heuristic: {}", a.heuristic),
    };
    let cfg = ImportConfig {
        mode: if a.flatten {
            ImportMode::Flatten
        } else {
            ImportMode::Mosaic
        },
        include_hidden: a.include_hidden,
        padding: a.padding,
        max_atlas_size: a.max_atlas_size,
        heuristic,
        keep_duplicate_names: a.keep_duplicate_names,
        reslice: a.reslice,
        generate_hierarchy: !a.no_hierarchy,
        ..Default::default()
    };

    let bar = if show_progress {
        let b = ProgressBar::new(count_sources(&manifest.layers));
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
            )
            .unwrap(),
        );
        Some(b)
    } else {
        None
    };
    let layers = build_layers(manifest.layers, &base, bar.as_ref())?;
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    let doc = Document::new(manifest.width, manifest.height, layers);
    info!(
        layers = doc.layer_count(),
        width = manifest.width,
        height = manifest.height,
        "loaded document"
    );

    let state_path = a
        .state
        .clone()
        .unwrap_or_else(|| a.out_dir.join(format!("{}.state.json", a.name)));
    let prev: ImportState = if state_path.exists() {
        let s = fs::read_to_string(&state_path)
            .with_context(|| format!("read {}", state_path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", state_path.display()))?
    } else {
        ImportState::default()
    };

    let out = import(doc, &a.name, &prev, &cfg)?;
    info!("{}", out.stats.summary());

    let png_path = a.out_dir.join(format!("{}.png", a.name));
    out.texture
        .save(&png_path)
        .with_context(|| format!("write {}", png_path.display()))?;
    info!(?png_path, "texture written");

    let sprites_path = a.out_dir.join(format!("{}.sprites.json", a.name));
    fs::write(&sprites_path, serde_json::to_string_pretty(&out.sprites)?)
        .with_context(|| format!("write {}", sprites_path.display()))?;

    let prefab_path = a.out_dir.join(format!("{}.prefab.json", a.name));
    fs::write(&prefab_path, serde_json::to_string_pretty(&out.hierarchy)?)
        .with_context(|| format!("write {}", prefab_path.display()))?;

    fs::write(&state_path, serde_json::to_string_pretty(&out.state)?)
        .with_context(|| format!("write {}", state_path.display()))?;
    info!(
        ?sprites_path,
        ?prefab_path,
        ?state_path,
        sprites = out.sprites.len(),
        "import complete"
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Manifest {
    width: u32,
    height: u32,
    layers: Vec<ManifestLayer>,
}

#[derive(Debug, Deserialize)]
struct ManifestLayer {
    id: i64,
    name: String,
    #[serde(default)]
    blend: Option<String>,
    #[serde(default = "default_opacity")]
    opacity: u8,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    group: bool,
    #[serde(default)]
    children: Vec<ManifestLayer>,
    /// Path of a canvas-sized RGBA image, relative to the manifest.
    #[serde(default)]
    source: Option<PathBuf>,
}

fn default_opacity() -> u8 {
    255
}

fn default_visible() -> bool {
    true
}

fn count_sources(layers: &[ManifestLayer]) -> u64 {
    let mut n = 0;
    for l in layers {
        if l.source.is_some() {
            n += 1;
        }
        n += count_sources(&l.children);
    }
    n
}

fn build_layers(
    nodes: Vec<ManifestLayer>,
    base: &Path,
    bar: Option<&ProgressBar>,
) -> anyhow::Result<Vec<LayerNode>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let blend_mode = match &node.blend {
            Some(s) => match s.parse::<BlendMode>() {
                Ok(m) => m,
                Err(()) => anyhow::bail!("layer {:?}: unknown blend mode {:?}", node.name, s),
            },
            None => BlendMode::Normal,
        };
        let pixels = match &node.source {
            Some(rel) => {
                let path = base.join(rel);
                if let Some(b) = bar {
                    let msg = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
                    b.set_message(msg.to_string());
                }
                let img = ImageReader::open(&path)
                    .with_context(|| format!("open {}", path.display()))?
                    .with_guessed_format()?
                    .decode()
                    .with_context(|| format!("decode {}", path.display()))?;
                if let Some(b) = bar {
                    b.inc(1);
                }
                Some(img.to_rgba8())
            }
            None => None,
        };
        let children = build_layers(node.children, base, bar)?;
        out.push(LayerNode {
            id: node.id,
            name: node.name,
            blend_mode,
            opacity: node.opacity,
            visible: node.visible,
            is_group: node.group,
            pixels,
            children,
        });
    }
    Ok(out)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
