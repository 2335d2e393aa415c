use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use texatlas_core::config::{
    ExportConfig, ExporterKind, FilterKind, Heuristic, PackerKind, ScaleMethod, SortOrder,
    TextureFormat, TransparentPolicy, TrimMode,
};
use texatlas_core::{EncodedImage, PackerConfig, frame_name, layout_files, pack_files, render_files};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "texatlas",
    about = "Pack images into texture atlases",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, global = true, help_heading = "Logging")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into atlas pages plus metadata
    Pack(PackArgs),
    /// Layout-only: compute placements and write the atlas record as JSON (no textures)
    Layout(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name of the output files
    #[arg(short, long, default_value = "pack-result", help_heading = "Input/Output")]
    name: String,
    /// YAML config file with `packer:` and `export:` sections (replaces the options below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Bin width
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    width: u32,
    /// Bin height
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    height: u32,
    /// Keep pages at exactly width x height
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    fixed_size: bool,
    /// Round page dimensions up to powers of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Pixels between frames
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    padding: u32,
    /// Edge pixels replicated around each frame
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    extrude: u32,
    /// Allow 90° rotation
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Layout")]
    allow_rotation: bool,
    /// Sort order: area_desc|max_side_desc|height_desc|width_desc|name_asc|none
    #[arg(long, default_value = "area_desc", help_heading = "Layout")]
    sort_order: SortOrder,

    // Image Processing
    /// Merge identical images into one placement
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Image Processing")]
    detect_identical: bool,
    /// Trim transparent borders
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Image Processing")]
    trim: bool,
    /// Trim mode: trim | crop
    #[arg(long, default_value = "trim", help_heading = "Image Processing")]
    trim_mode: TrimMode,
    /// Alpha at or below this counts as transparent (0..=255)
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    alpha_threshold: u8,
    /// Fully transparent images: one_by_one | keep
    #[arg(long, default_value = "one_by_one", help_heading = "Image Processing")]
    transparent_policy: TransparentPolicy,
    /// Page filter: none | grayscale | mask
    #[arg(long, default_value = "none", help_heading = "Image Processing")]
    filter: FilterKind,
    /// Page scale factor
    #[arg(long, default_value_t = 1.0, help_heading = "Image Processing")]
    scale: f32,
    /// Scale method: nearest | bilinear | bicubic | lanczos
    #[arg(long, default_value = "bilinear", help_heading = "Image Processing")]
    scale_method: ScaleMethod,

    // Algorithms
    /// Packer: maxrects | optimal
    #[arg(long, default_value = "maxrects", help_heading = "Algorithms")]
    packer: PackerKind,
    /// Heuristic: bssf|blsf|baf|bl|cp|smart|smart-area|square|square-area|smart-square|smart-square-area
    #[arg(long, default_value = "bssf", help_heading = "Algorithms")]
    heuristic: Heuristic,
    /// Decode, pack candidates and composite in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Algorithms")]
    parallel: bool,

    // Export
    /// Metadata exporter: json-hash | json-array
    #[arg(long, default_value = "json-hash", help_heading = "Export")]
    exporter: ExporterKind,
    /// Texture format: png | jpg
    #[arg(long, default_value = "png", help_heading = "Export")]
    texture_format: TextureFormat,
    /// Embed textures as base64 data URIs inside the metadata
    #[arg(long, default_value_t = false, help_heading = "Export")]
    base64: bool,
    /// Page suffix separator used when there is more than one page
    #[arg(long, default_value = "-", help_heading = "Export")]
    suffix: String,
    /// First page number
    #[arg(long, default_value_t = 0, help_heading = "Export")]
    suffix_initial_value: u32,
    /// Strip file extensions from frame names
    #[arg(long, default_value_t = false, help_heading = "Export")]
    remove_file_extension: bool,
    /// Keep folder names (relative to the input) in frame names
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Export")]
    prepend_folder_name: bool,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and log stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

/// On-disk configuration; missing keys take library defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    packer: PackerConfig,
    export: ExportConfig,
}

impl PackArgs {
    fn to_config(&self) -> anyhow::Result<FileConfig> {
        if let Some(path) = &self.config {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            let cfg: FileConfig = serde_yaml::from_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?;
            return Ok(cfg);
        }
        let packer = PackerConfig {
            max_width: self.width,
            max_height: self.height,
            fixed_size: self.fixed_size,
            power_of_two: self.pow2,
            padding: self.padding,
            extrude: self.extrude,
            allow_rotation: self.allow_rotation,
            detect_identical: self.detect_identical,
            trim: self.trim,
            trim_mode: self.trim_mode,
            alpha_threshold: self.alpha_threshold,
            transparent_policy: self.transparent_policy,
            packer: self.packer,
            heuristic: self.heuristic,
            sort_order: self.sort_order,
            filter: self.filter,
            scale: self.scale,
            scale_method: self.scale_method,
            parallel: self.parallel,
        };
        let export = ExportConfig {
            texture_name: self.name.clone(),
            texture_format: self.texture_format,
            base64_export: self.base64,
            exporter: self.exporter,
            suffix: self.suffix.clone(),
            suffix_initial_value: self.suffix_initial_value,
            remove_file_extension: self.remove_file_extension,
            prepend_folder_name: self.prepend_folder_name,
        };
        Ok(FileConfig { packer, export })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Layout(args) => run_layout(args),
    }
}

fn run_pack(args: &PackArgs) -> anyhow::Result<()> {
    let cfg = args.to_config()?;
    cfg.packer.validate()?;
    if args.print_config {
        return print_config(&cfg, &args.print_config_format);
    }

    let files = read_inputs(&args.input, &cfg.export)?;
    info!(count = files.len(), "read input files");
    let out = pack_files(files, cfg.packer.clone())?;
    for failure in &out.failures {
        warn!(key = %failure.key, error = %failure.error, "image skipped");
    }

    let stats = out.stats();
    info!(
        pages = stats.num_pages,
        frames = stats.num_frames,
        aliases = stats.num_aliases,
        used_area = stats.used_frame_area,
        total_area = stats.total_page_area,
        occupancy = %format!("{:.2}%", stats.occupancy * 100.0),
        heuristic = %out.atlas.meta.heuristic,
        "stats"
    );

    if !args.dry_run {
        fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
        for file in render_files(&out, &cfg.export)? {
            let path = args.out_dir.join(&file.name);
            fs::write(&path, &file.bytes).with_context(|| format!("write {}", path.display()))?;
            info!(?path, "wrote");
        }
    }

    if let Some(stats_path) = &args.export_stats {
        fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
        info!(?stats_path, "stats exported");
    }
    Ok(())
}

/// Placement-only run: decodes, trims and deduplicates like `pack`, never composites.
fn run_layout(args: &PackArgs) -> anyhow::Result<()> {
    let cfg = args.to_config()?;
    cfg.packer.validate()?;
    if args.print_config {
        return print_config(&cfg, &args.print_config_format);
    }

    let files = read_inputs(&args.input, &cfg.export)?;
    info!(count = files.len(), "read input files");
    let out = layout_files(files, cfg.packer.clone())?;
    for failure in &out.failures {
        warn!(key = %failure.key, error = %failure.error, "image skipped");
    }

    let atlas = &out.atlas;
    if !args.dry_run {
        fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
        let json_path = args.out_dir.join(format!("{}.json", cfg.export.texture_name));
        fs::write(&json_path, serde_json::to_string_pretty(atlas)?)
            .with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, pages = atlas.pages.len(), "layout written");
    }
    info!(summary = %atlas.stats().summary(), "stats");
    Ok(())
}

fn print_config(cfg: &FileConfig, format: &str) -> anyhow::Result<()> {
    let text = match format {
        "yaml" => serde_yaml::to_string(cfg)?,
        _ => serde_json::to_string_pretty(cfg)?,
    };
    println!("{text}");
    Ok(())
}

/// Reads every image file under `input`; keys are paths relative to `input`
/// passed through the export naming options.
fn read_inputs(input: &Path, export: &ExportConfig) -> anyhow::Result<Vec<EncodedImage>> {
    let root = if input.is_file() {
        input.parent().unwrap_or(Path::new("")).to_path_buf()
    } else {
        input.to_path_buf()
    };
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(input).follow_links(true) {
        let entry = entry.with_context(|| format!("scan {}", input.display()))?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for p in paths {
        let rel = p.strip_prefix(&root).unwrap_or(&p);
        let key = frame_name(&rel.to_string_lossy(), export);
        let bytes = fs::read(&p).with_context(|| format!("read {}", p.display()))?;
        files.push(EncodedImage { key, bytes });
    }
    Ok(files)
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
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
