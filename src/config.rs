use crate::symbols::{MarkerStyle, POPULATION_MARKER, SCALE_FACTOR};
use anyhow::{Context, Result};
use clap::Parser;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_CONFIG: &str = "propmap.toml";

/// Proportional symbol map in the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GeoJSON file with the features to symbolize
    #[arg(value_name = "DATA")]
    pub data: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GeoJSON lines or polygons drawn as the base map
    #[arg(long, value_name = "FILE")]
    pub coastlines: Option<PathBuf>,

    /// Substring selecting the sequenced attributes
    #[arg(long, value_name = "TEXT")]
    pub marker: Option<String>,

    /// Where log output goes
    #[arg(long, value_name = "FILE", default_value = "propmap.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub symbols: SymbolConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub coastlines: Option<PathBuf>,
    pub attribute_marker: String,
    pub name_property: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/MegaCities.geojson"),
            coastlines: None,
            attribute_marker: POPULATION_MARKER.to_string(),
            name_property: "City".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SymbolConfig {
    pub scale_factor: f64,
    pub default_radius: f64,
    pub fill: String,
    pub stroke: String,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            scale_factor: SCALE_FACTOR,
            default_radius: 8.0,
            fill: "#ff7800".to_string(),
            stroke: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center_lon: 0.0,
            center_lat: 20.0,
            zoom: 1.0,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }
}

/// Fill and outline colours of the symbols
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub fill: Color,
    pub stroke: Color,
}

/// Everything the app needs at startup, CLI merged over config
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub coastlines: Option<PathBuf>,
    pub attribute_marker: String,
    pub style: MarkerStyle,
    pub palette: Palette,
    pub view: ViewConfig,
    pub log_file: PathBuf,
}

impl Settings {
    /// Read the config named on the command line, or `propmap.toml` when
    /// present, then apply command line overrides.
    pub fn resolve(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => AppConfig::load_from_file(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => {
                AppConfig::load_from_file(Path::new(DEFAULT_CONFIG))?
            }
            None => AppConfig::default(),
        };
        Self::merge(cli, config)
    }

    pub fn merge(cli: Cli, config: AppConfig) -> Result<Self> {
        let palette = Palette {
            fill: parse_color(&config.symbols.fill)?,
            stroke: parse_color(&config.symbols.stroke)?,
        };
        Ok(Self {
            data_path: cli.data.unwrap_or(config.data.path),
            coastlines: cli.coastlines.or(config.data.coastlines),
            attribute_marker: cli.marker.unwrap_or(config.data.attribute_marker),
            style: MarkerStyle {
                scale_factor: config.symbols.scale_factor,
                default_radius: config.symbols.default_radius,
                name_property: config.data.name_property,
            },
            palette,
            view: config.view,
            log_file: cli.log_file,
        })
    }
}

fn parse_color(text: &str) -> Result<Color> {
    Color::from_str(text).map_err(|_| anyhow::anyhow!("Invalid colour in configuration: {text:?}"))
}
