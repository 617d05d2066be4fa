use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};
use crate::menu::{ItemMarkup, MenuMarkup};

/// Radius used when the configured value is absent or unusable.
pub const DEFAULT_RADIUS: f64 = 220.0;

const DEFAULT_ITEMS: [(&str, &str); 4] = [
    ("Home", "-60"),
    ("Projects", "-20"),
    ("About", "20"),
    ("Contact", "60"),
];

/// Rotating-cube backdrop with a radial pop-out menu
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Menu radius as a CSS length, e.g. "260px"
    #[arg(long)]
    pub radius: Option<String>,

    /// Menu item as LABEL:ANGLE (degrees); repeat for more items
    #[arg(long = "item", value_name = "LABEL:ANGLE")]
    pub items: Vec<String>,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Run without the 3D background
    #[arg(long)]
    pub no_background: bool,

    /// Start with the debug overlay visible
    #[arg(short, long)]
    pub debug: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Log level used when `RUST_LOG` is unset. Without a log file only
    /// warnings are kept, since they go to the terminal's stderr.
    pub fn default_log_level(&self) -> &'static str {
        match (&self.log_file, self.verbose) {
            (None, _) => "warn",
            (Some(_), true) => "debug",
            (Some(_), false) => "info",
        }
    }
}

/// Settings the page is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub radius: f64,
    pub markup: MenuMarkup,
    pub background: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            radius: DEFAULT_RADIUS,
            markup: MenuMarkup {
                toggle_label: Some("Menu".to_string()),
                items: Some(
                    DEFAULT_ITEMS
                        .iter()
                        .map(|(label, angle)| ItemMarkup::new(*label, *angle))
                        .collect(),
                ),
            },
            background: true,
        }
    }
}

impl PageConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = PageConfig {
            radius: parse_radius(args.radius.as_deref()),
            background: !args.no_background,
            ..PageConfig::default()
        };
        if !args.items.is_empty() {
            let items = args
                .items
                .iter()
                .map(|raw| parse_item(raw))
                .collect::<Result<Vec<_>>>()?;
            config.markup.items = Some(items);
        }
        Ok(config)
    }
}

/// Reads a CSS length such as `"260px"`. Missing, non-numeric, non-finite
/// and zero values give [`DEFAULT_RADIUS`].
pub fn parse_radius(raw: Option<&str>) -> f64 {
    raw.map(|s| s.trim())
        .map(|s| s.strip_suffix("px").unwrap_or(s).trim())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r != 0.0)
        .unwrap_or(DEFAULT_RADIUS)
}

/// Parses `LABEL:ANGLE`. The angle is kept raw, like a data attribute.
pub fn parse_item(raw: &str) -> Result<ItemMarkup> {
    let (label, angle) = raw
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidItem(raw.to_string()))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(Error::InvalidItem(raw.to_string()));
    }
    Ok(ItemMarkup::new(label, angle.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_parsing() {
        assert_eq!(parse_radius(Some("260px")), 260.0);
        assert_eq!(parse_radius(Some(" 180 ")), 180.0);
        assert_eq!(parse_radius(Some("12.5px")), 12.5);
        assert_eq!(parse_radius(Some("wide")), DEFAULT_RADIUS);
        assert_eq!(parse_radius(Some("0px")), DEFAULT_RADIUS);
        assert_eq!(parse_radius(Some("")), DEFAULT_RADIUS);
        assert_eq!(parse_radius(None), DEFAULT_RADIUS);
    }

    #[test]
    fn item_parsing() {
        let item = parse_item("Blog:45").unwrap();
        assert_eq!(item.label, "Blog");
        assert_eq!(item.angle.as_deref(), Some("45"));

        assert!(matches!(parse_item("Blog"), Err(Error::InvalidItem(_))));
        assert!(matches!(parse_item(":45"), Err(Error::InvalidItem(_))));
    }

    #[test]
    fn args_build_a_page_config() {
        let args = Args::parse_from(["cubemenu", "--radius", "300px", "--item", "A:0", "--item", "B:90"]);
        let config = PageConfig::from_args(&args).unwrap();
        assert_eq!(config.radius, 300.0);
        assert!(config.background);
        assert_eq!(config.markup.items.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["cubemenu", "--no-background"]);
        let config = PageConfig::from_args(&args).unwrap();
        assert_eq!(config.radius, DEFAULT_RADIUS);
        assert!(!config.background);
        assert_eq!(config.markup.items.as_ref().map(Vec::len), Some(4));
        assert_eq!(args.fps, 60);
    }

    #[test]
    fn warnings_are_kept_without_a_log_file() {
        let args = Args::parse_from(["cubemenu", "-v"]);
        assert_eq!(args.default_log_level(), "warn");

        let args = Args::parse_from(["cubemenu", "--log-file", "page.log"]);
        assert_eq!(args.default_log_level(), "info");

        let args = Args::parse_from(["cubemenu", "--log-file", "page.log", "--verbose"]);
        assert_eq!(args.default_log_level(), "debug");
    }
}
