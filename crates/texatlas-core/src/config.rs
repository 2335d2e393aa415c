use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AtlasError;

/// Lowercases and drops `-`, `_` and spaces so `best-short-side-fit`, `BestShortSideFit`
/// and `best_short_side_fit` all resolve to the same registry entry.
fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn lookup<T: Copy>(kind: &str, s: &str, table: &[(&str, T)]) -> Result<T, AtlasError> {
    let key = normalize_name(s);
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| {
            let known: Vec<&str> = table.iter().map(|(n, _)| *n).collect();
            AtlasError::unknown(kind, s, &known)
        })
}

/// Packer kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackerKind {
    /// Single MaxRects run with the configured heuristic.
    MaxRects,
    /// Run every heuristic and keep the best result (pages, then total area).
    Optimal,
}

impl PackerKind {
    pub const NAMES: &'static [(&'static str, PackerKind)] = &[
        ("maxrects", PackerKind::MaxRects),
        ("maxrectsbin", PackerKind::MaxRects),
        ("maxrectspacker", PackerKind::MaxRects),
        ("optimal", PackerKind::Optimal),
        ("optimalpacker", PackerKind::Optimal),
        ("auto", PackerKind::Optimal),
    ];

    pub fn name(self) -> &'static str {
        match self {
            PackerKind::MaxRects => "maxrects",
            PackerKind::Optimal => "optimal",
        }
    }
}

impl FromStr for PackerKind {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("packer", s, Self::NAMES)
    }
}

/// MaxRects placement heuristics.
///
/// The first five are the classic free-rectangle scores. The compound variants add a
/// bin-growth term computed from the bounding box of everything already placed:
/// `Smart*` minimise its area, `Square*` minimise its longer side. The plain name
/// uses short-side leftover as the fit term ("edge"), the `*Area` name uses area leftover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
    ContactPoint,
    Smart,
    SmartArea,
    Square,
    SquareArea,
    SmartSquare,
    SmartSquareArea,
}

impl Heuristic {
    /// Registration order; also the tie-break order of the optimal packer.
    pub const ALL: &'static [Heuristic] = &[
        Heuristic::BestShortSideFit,
        Heuristic::BestLongSideFit,
        Heuristic::BestAreaFit,
        Heuristic::BottomLeft,
        Heuristic::ContactPoint,
        Heuristic::Smart,
        Heuristic::SmartArea,
        Heuristic::Square,
        Heuristic::SquareArea,
        Heuristic::SmartSquare,
        Heuristic::SmartSquareArea,
    ];

    pub const NAMES: &'static [(&'static str, Heuristic)] = &[
        ("bssf", Heuristic::BestShortSideFit),
        ("bestshortsidefit", Heuristic::BestShortSideFit),
        ("blsf", Heuristic::BestLongSideFit),
        ("bestlongsidefit", Heuristic::BestLongSideFit),
        ("baf", Heuristic::BestAreaFit),
        ("bestareafit", Heuristic::BestAreaFit),
        ("bl", Heuristic::BottomLeft),
        ("bottomleft", Heuristic::BottomLeft),
        ("bottomleftrule", Heuristic::BottomLeft),
        ("cp", Heuristic::ContactPoint),
        ("contactpoint", Heuristic::ContactPoint),
        ("contactpointrule", Heuristic::ContactPoint),
        ("smart", Heuristic::Smart),
        ("smartarea", Heuristic::SmartArea),
        ("square", Heuristic::Square),
        ("squarearea", Heuristic::SquareArea),
        ("smartsquare", Heuristic::SmartSquare),
        ("smartsquarearea", Heuristic::SmartSquareArea),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Heuristic::BestShortSideFit => "bssf",
            Heuristic::BestLongSideFit => "blsf",
            Heuristic::BestAreaFit => "baf",
            Heuristic::BottomLeft => "bl",
            Heuristic::ContactPoint => "cp",
            Heuristic::Smart => "smart",
            Heuristic::SmartArea => "smart-area",
            Heuristic::Square => "square",
            Heuristic::SquareArea => "square-area",
            Heuristic::SmartSquare => "smart-square",
            Heuristic::SmartSquareArea => "smart-square-area",
        }
    }
}

impl FromStr for Heuristic {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("heuristic", s, Self::NAMES)
    }
}

/// Sorting orders for deterministic packing. Ties always fall back to key ascending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    MaxSideDesc,
    HeightDesc,
    WidthDesc,
    NameAsc,
    None,
}

impl SortOrder {
    pub const NAMES: &'static [(&'static str, SortOrder)] = &[
        ("areadesc", SortOrder::AreaDesc),
        ("maxsidedesc", SortOrder::MaxSideDesc),
        ("heightdesc", SortOrder::HeightDesc),
        ("widthdesc", SortOrder::WidthDesc),
        ("nameasc", SortOrder::NameAsc),
        ("none", SortOrder::None),
    ];
}

impl FromStr for SortOrder {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("sort order", s, Self::NAMES)
    }
}

/// How trimming reports the sprite's logical size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrimMode {
    /// Keep the original size as `source_size`; only the sprite source rect shrinks.
    Trim,
    /// Redefine `source_size` as the trimmed size.
    Crop,
}

impl TrimMode {
    pub fn name(self) -> &'static str {
        match self {
            TrimMode::Trim => "trim",
            TrimMode::Crop => "crop",
        }
    }
}

impl FromStr for TrimMode {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(
            "trim mode",
            s,
            &[("trim", TrimMode::Trim), ("crop", TrimMode::Crop)],
        )
    }
}

/// What trimming does with an image whose every pixel is at or below the alpha threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransparentPolicy {
    /// Collapse to a 1x1 region at the origin.
    OneByOne,
    /// Keep the full, untrimmed bounds.
    Keep,
}

impl FromStr for TransparentPolicy {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(
            "transparent policy",
            s,
            &[
                ("onebyone", TransparentPolicy::OneByOne),
                ("keep", TransparentPolicy::Keep),
            ],
        )
    }
}

/// Page-wide bitmap filter, applied after compositing and before scaling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    None,
    Grayscale,
    Mask,
}

impl FilterKind {
    pub const NAMES: &'static [(&'static str, FilterKind)] = &[
        ("none", FilterKind::None),
        ("grayscale", FilterKind::Grayscale),
        ("greyscale", FilterKind::Grayscale),
        ("mask", FilterKind::Mask),
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Mask => "mask",
        }
    }
}

impl FromStr for FilterKind {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("filter", s, Self::NAMES)
    }
}

/// Interpolation used when the page is scaled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMethod {
    NearestNeighbor,
    Bilinear,
    Bicubic,
    Lanczos,
}

impl ScaleMethod {
    pub const NAMES: &'static [(&'static str, ScaleMethod)] = &[
        ("nearest", ScaleMethod::NearestNeighbor),
        ("nearestneighbor", ScaleMethod::NearestNeighbor),
        ("bilinear", ScaleMethod::Bilinear),
        ("bicubic", ScaleMethod::Bicubic),
        ("hermite", ScaleMethod::Bicubic),
        ("lanczos", ScaleMethod::Lanczos),
        ("bezier", ScaleMethod::Lanczos),
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScaleMethod::NearestNeighbor => "nearest",
            ScaleMethod::Bilinear => "bilinear",
            ScaleMethod::Bicubic => "bicubic",
            ScaleMethod::Lanczos => "lanczos",
        }
    }
}

impl FromStr for ScaleMethod {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("scale method", s, Self::NAMES)
    }
}

/// Encoded texture format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    Png,
    Jpg,
}

impl TextureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TextureFormat::Png => "png",
            TextureFormat::Jpg => "jpg",
        }
    }

    /// Pixel format string written into metadata.
    pub fn pixel_format(self) -> &'static str {
        match self {
            TextureFormat::Png => "RGBA8888",
            TextureFormat::Jpg => "RGB888",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            TextureFormat::Png => "image/png",
            TextureFormat::Jpg => "image/jpeg",
        }
    }
}

impl FromStr for TextureFormat {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(
            "texture format",
            s,
            &[
                ("png", TextureFormat::Png),
                ("jpg", TextureFormat::Jpg),
                ("jpeg", TextureFormat::Jpg),
            ],
        )
    }
}

/// Built-in metadata exporters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExporterKind {
    /// Frames keyed by name (TexturePacker-style hash).
    JsonHash,
    /// Frames as an ordered array with a `filename` field.
    JsonArray,
}

impl ExporterKind {
    pub const NAMES: &'static [(&'static str, ExporterKind)] = &[
        ("jsonhash", ExporterKind::JsonHash),
        ("json", ExporterKind::JsonHash),
        ("jsonarray", ExporterKind::JsonArray),
    ];

    pub fn extension(self) -> &'static str {
        "json"
    }
}

impl FromStr for ExporterKind {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("exporter", s, Self::NAMES)
    }
}

/// Packing and rendering options for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Bin (page) width in pixels.
    pub max_width: u32,
    /// Bin (page) height in pixels.
    pub max_height: u32,
    /// Keep pages at exactly max_width/max_height instead of shrinking to content.
    pub fixed_size: bool,
    /// Round page dimensions up to powers of two.
    pub power_of_two: bool,
    /// Empty pixels reserved between frames.
    pub padding: u32,
    /// Edge pixels replicated around each frame.
    pub extrude: u32,
    /// Allow 90° clockwise rotation of frames.
    pub allow_rotation: bool,
    /// Merge images with identical trimmed pixels into one placement.
    pub detect_identical: bool,

    /// Trim transparent borders (alpha <= alpha_threshold).
    pub trim: bool,
    pub trim_mode: TrimMode,
    pub alpha_threshold: u8,
    pub transparent_policy: TransparentPolicy,

    pub packer: PackerKind,
    pub heuristic: Heuristic,
    pub sort_order: SortOrder,

    pub filter: FilterKind,
    /// Page scale factor; metadata stays in unscaled coordinates.
    pub scale: f32,
    pub scale_method: ScaleMethod,

    /// Use rayon for decoding, optimal-packer candidates and page compositing
    /// (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            fixed_size: false,
            power_of_two: false,
            padding: 0,
            extrude: 0,
            allow_rotation: true,
            detect_identical: true,
            trim: true,
            trim_mode: TrimMode::Trim,
            alpha_threshold: 0,
            transparent_policy: TransparentPolicy::OneByOne,
            packer: PackerKind::MaxRects,
            heuristic: Heuristic::BestShortSideFit,
            sort_order: SortOrder::AreaDesc,
            filter: FilterKind::None,
            scale: 1.0,
            scale_method: ScaleMethod::Bilinear,
            parallel: false,
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the bin has a zero dimension, if padding/extrude leave no
    /// room for even a 1x1 frame, or if the scale factor is not a positive finite number.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        let reserve = self.slot_margin();
        if reserve >= self.max_width || reserve >= self.max_height {
            return Err(AtlasError::Configuration(format!(
                "padding ({}) + 2 * extrude ({}) leaves no room in {}x{} bins",
                self.padding, self.extrude, self.max_width, self.max_height
            )));
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(AtlasError::Configuration(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Extra pixels each frame reserves on both axes (padding plus extrusion on both sides).
    pub fn slot_margin(&self) -> u32 {
        self.padding
            .saturating_add(self.extrude.saturating_mul(2))
    }

    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn fixed_size(mut self, v: bool) -> Self {
        self.cfg.fixed_size = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn extrude(mut self, v: u32) -> Self {
        self.cfg.extrude = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn detect_identical(mut self, v: bool) -> Self {
        self.cfg.detect_identical = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn trim_mode(mut self, v: TrimMode) -> Self {
        self.cfg.trim_mode = v;
        self
    }
    pub fn alpha_threshold(mut self, v: u8) -> Self {
        self.cfg.alpha_threshold = v;
        self
    }
    pub fn transparent_policy(mut self, v: TransparentPolicy) -> Self {
        self.cfg.transparent_policy = v;
        self
    }
    pub fn packer(mut self, v: PackerKind) -> Self {
        self.cfg.packer = v;
        self
    }
    pub fn heuristic(mut self, v: Heuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn filter(mut self, v: FilterKind) -> Self {
        self.cfg.filter = v;
        self
    }
    pub fn scale(mut self, v: f32, method: ScaleMethod) -> Self {
        self.cfg.scale = v;
        self.cfg.scale_method = method;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

/// Output naming and encoding options consumed when turning a packed atlas into files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Base name of every output file.
    pub texture_name: String,
    pub texture_format: TextureFormat,
    /// Embed the texture as a data URI in the metadata instead of writing it separately.
    pub base64_export: bool,
    pub exporter: ExporterKind,
    /// Separator between base name and page number when there is more than one page.
    pub suffix: String,
    pub suffix_initial_value: u32,
    /// Strip the file extension from frame names.
    pub remove_file_extension: bool,
    /// Keep the folder part of frame names (relative to the input root).
    pub prepend_folder_name: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            texture_name: "pack-result".into(),
            texture_format: TextureFormat::Png,
            base64_export: false,
            exporter: ExporterKind::JsonHash,
            suffix: "-".into(),
            suffix_initial_value: 0,
            remove_file_extension: false,
            prepend_folder_name: true,
        }
    }
}
