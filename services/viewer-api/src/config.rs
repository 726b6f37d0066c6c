//! Startup configuration.
//!
//! Command line flags (with environment fallbacks) are parsed by clap into
//! [`CliArgs`] and validated once into [`ViewerSettings`], which is shared
//! read-only by every request.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use map_common::{Extent, ScaleList, UnitKind, ViewerError, ViewerResult};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9991;

/// Default scale denominators, largest first.
pub const DEFAULT_SCALES: &str = "10000,5000,2000,1000,500";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Minimal HTML viewer for MapServer mapfiles.
#[derive(Parser, Debug, Clone)]
#[command(name = "mapfile-viewer")]
#[command(about = "Browser viewer for MapServer mapfiles with a built-in OWS proxy")]
pub struct CliArgs {
    /// Path to a mapfile, OR a comma-separated list of mapfile fragments to
    /// concatenate on the fly (fragments must not contain the MAP/END
    /// wrapper). Example: 'map/base.map,map/layers.map'
    #[arg(short, long, env = "VIEWER_MAPFILE")]
    pub mapfile: Option<String>,

    /// Extent 'minx,miny,maxx,maxy' overriding the mapfile EXTENT
    #[arg(short, long, env = "VIEWER_EXTENT", allow_hyphen_values = true)]
    pub extent: Option<String>,

    /// Comma-separated list of layers to show. Detected from the mapfile when omitted
    #[arg(short, long, env = "VIEWER_LAYERS")]
    pub layers: Option<String>,

    /// String overriding the CONNECTION of all layers
    #[arg(short, long, env = "VIEWER_CONNECTION")]
    pub connection: Option<String>,

    /// Comma-separated list of scale denominators
    #[arg(short, long, env = "VIEWER_SCALES", default_value = DEFAULT_SCALES)]
    pub scales: String,

    /// Port to listen on
    #[arg(short, long, env = "VIEWER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Map units overriding the mapfile UNITS (in, ft, mi, m, km, dd, px)
    #[arg(long)]
    pub units: Option<String>,

    /// Device resolution in DPI overriding the mapfile RESOLUTION
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Add the map NAME as an aggregate first layer
    #[arg(long)]
    pub root_layer: bool,

    /// Directory served under /static
    #[arg(long, env = "VIEWER_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// MapServer CGI executable used for rendering
    #[arg(long, env = "MAPSERV_BIN", default_value = "mapserv")]
    pub mapserv: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    pub worker_threads: Option<usize>,

    /// Address of a separate Prometheus metrics listener
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,

    /// Check mapfile syntax, print the result and exit
    #[arg(short, long)]
    pub test: bool,
}

impl CliArgs {
    /// Mapfile paths named by `--mapfile`, in argument order.
    ///
    /// Returns `None` when the flag is absent or names nothing.
    pub fn mapfile_paths(&self) -> Option<Vec<PathBuf>> {
        let paths: Vec<PathBuf> = self
            .mapfile
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if paths.is_empty() {
            None
        } else {
            Some(paths)
        }
    }
}

/// Validated process-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    /// Absolute path of the mapfile the viewer page describes.
    pub mapfile: PathBuf,
    pub port: u16,
    pub scales: ScaleList,
    pub extent_override: Option<Extent>,
    pub layer_override: Option<Vec<String>>,
    pub connection_override: Option<String>,
    pub units_override: Option<UnitKind>,
    pub resolution_override: Option<f64>,
    pub root_layer: bool,
    /// Absolute path of the static asset root.
    pub static_dir: PathBuf,
}

impl ViewerSettings {
    /// Settings with every override unset.
    pub fn new(mapfile: impl Into<PathBuf>) -> Self {
        Self {
            mapfile: mapfile.into(),
            port: DEFAULT_PORT,
            scales: ScaleList::default(),
            extent_override: None,
            layer_override: None,
            connection_override: None,
            units_override: None,
            resolution_override: None,
            root_layer: false,
            static_dir: PathBuf::from("static"),
        }
    }

    /// Validate command line values.
    ///
    /// `mapfile` is the single mapfile to serve, which is the concatenated
    /// file when several fragments were given.
    pub fn from_args(args: &CliArgs, mapfile: &Path) -> ViewerResult<Self> {
        let extent_override = args
            .extent
            .as_deref()
            .map(Extent::from_comma_string)
            .transpose()?;

        let resolution_override = match args.resolution {
            Some(dpi) if !dpi.is_finite() || dpi <= 0.0 => {
                return Err(ViewerError::Configuration(format!(
                    "resolution must be a positive number of DPI, got {}",
                    dpi
                )))
            }
            other => other,
        };

        Ok(Self {
            mapfile: absolute(mapfile)?,
            port: args.port,
            scales: args.scales.parse()?,
            extent_override,
            layer_override: args.layers.as_deref().and_then(parse_layer_list),
            connection_override: args.connection.clone(),
            units_override: args.units.as_deref().map(UnitKind::from_key).transpose()?,
            resolution_override,
            root_layer: args.root_layer,
            static_dir: absolute(&args.static_dir)?,
        })
    }

    /// Identifier handed to the engine to load the configured mapfile.
    pub fn mapfile_identifier(&self) -> String {
        self.mapfile.to_string_lossy().into_owned()
    }
}

/// Split a comma-separated layer list, dropping blank entries.
///
/// An empty list means "no override".
pub fn parse_layer_list(list: &str) -> Option<Vec<String>> {
    let layers: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if layers.is_empty() {
        None
    } else {
        Some(layers)
    }
}

fn absolute(path: &Path) -> ViewerResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ViewerError::Resource(format!("cannot determine working directory: {}", e)))?;
    Ok(cwd.join(path))
}
