// Config Module - Configuration management and command-line argument parsing
use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::gradients::PaletteSet;
use crate::renderer::{ControlInput, PatternSelector, DEFAULT_HUE_INTERVAL_MS};
use crate::types::Rgb;

const APP_DIR: &str = "spiralwled";

// Global storage for custom config path
static CUSTOM_CONFIG_PATH: OnceLock<Option<String>> = OnceLock::new();

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Procedural LED patterns for Fibonacci spiral discs, streamed to WLED via DDP",
    long_about = "Renders palette-driven procedural patterns (waves, noise fire and water, swirls,\n\
                  particles, twinkles) over a Fibonacci spiral LED layout and streams each frame\n\
                  to a WLED controller over DDP, or previews it in the terminal.\n\
                  Edit the config file while running to change pattern, palette and speed live."
)]
pub struct Args {
    /// Config name (in ~/.config/spiralwled) or path
    #[arg(long)]
    pub cfg: Option<String>,

    /// Total number of LEDs on the disc
    #[arg(short = 'L', long)]
    pub leds: Option<usize>,

    /// Number of spiral arms the strip is wired along
    #[arg(long)]
    pub arms: Option<usize>,

    /// Pattern name or index (see --list)
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Palette name or index (see --list)
    #[arg(short = 'P', long)]
    pub palette: Option<String>,

    /// Animation speed (0-255)
    #[arg(short, long)]
    pub speed: Option<u8>,

    /// Output brightness (0-255)
    #[arg(short, long)]
    pub brightness: Option<u8>,

    /// Rendering frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// WLED device IP address or hostname
    #[arg(short, long)]
    pub wled_ip: Option<String>,

    /// Output: "ddp", "preview" or "none"
    #[arg(short, long)]
    pub output: Option<String>,

    /// List patterns and palettes, then exit
    #[arg(long)]
    pub list: bool,

    /// Print --list output as JSON
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub total_leds: usize,
    pub spiral_arms: usize,
    pub pattern: String,
    pub palette: String,
    pub speed: u32,
    pub brightness: u32,
    pub solid_color: String,
    pub cooling: u32,
    pub sparking: u32,
    pub fps: f64,
    pub hue_interval_ms: u32,
    pub reset_on_switch: bool,
    pub output: String,
    pub wled_ip: String,
    /// name -> "RRGGBB,RRGGBB,..."
    pub custom_palettes: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            config_path: None,
            total_leds: 256,
            spiral_arms: 13,
            pattern: "Color Palette Waves".to_string(),
            palette: "Rainbow".to_string(),
            speed: 30,
            brightness: 128,
            solid_color: "0000FF".to_string(),
            cooling: 49,
            sparking: 60,
            fps: 100.0,
            hue_interval_ms: DEFAULT_HUE_INTERVAL_MS,
            reset_on_switch: true,
            output: "ddp".to_string(),
            wled_ip: String::new(),
            custom_palettes: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn merge_with_args(&mut self, args: &Args) -> bool {
        // Track if any args were actually provided
        let mut args_provided = false;

        if let Some(leds) = args.leds {
            self.total_leds = leds;
            args_provided = true;
        }

        if let Some(arms) = args.arms {
            self.spiral_arms = arms;
            args_provided = true;
        }

        if let Some(ref pattern) = args.pattern {
            self.pattern = pattern.clone();
            args_provided = true;
        }

        if let Some(ref palette) = args.palette {
            self.palette = palette.clone();
            args_provided = true;
        }

        if let Some(speed) = args.speed {
            self.speed = speed as u32;
            args_provided = true;
        }

        if let Some(brightness) = args.brightness {
            self.brightness = brightness as u32;
            args_provided = true;
        }

        if let Some(fps) = args.fps {
            self.fps = fps;
            args_provided = true;
        }

        if let Some(ref wled_ip) = args.wled_ip {
            self.wled_ip = wled_ip.clone();
            args_provided = true;
        }

        if let Some(ref output) = args.output {
            self.output = output.clone();
            args_provided = true;
        }

        if args_provided {
            self.sanitize();
        }
        args_provided
    }

    /// Set the global config path (called once at startup)
    pub fn set_config_path(cfg: Option<String>) {
        let _ = CUSTOM_CONFIG_PATH.set(cfg);
    }

    /// Get the global config path (if set)
    fn get_config_path_arg() -> Option<&'static str> {
        CUSTOM_CONFIG_PATH.get().and_then(|opt| opt.as_deref())
    }

    pub fn config_path(cfg_arg: Option<&str>) -> Result<PathBuf> {
        // Priority: explicit arg > global > None
        let cfg = cfg_arg.or_else(|| Self::get_config_path_arg());

        if let Some(cfg) = cfg {
            let path = PathBuf::from(cfg);
            if path.is_absolute() || cfg.contains('/') || cfg.contains('\\') {
                return Ok(path);
            }

            // Otherwise treat as config name in config directory
            let config_dir = Self::config_dir()?;
            let filename = if cfg.ends_with(".conf") {
                cfg.to_string()
            } else {
                format!("{}.conf", cfg)
            };
            Ok(config_dir.join(filename))
        } else {
            Ok(Self::config_dir()?.join("config.conf"))
        }
    }

    fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        let config_dir = PathBuf::from(home).join(".config").join(APP_DIR);
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Parse TOML contents and sanitize the result
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut parsed: Self = toml::from_str(contents)?;
        parsed.sanitize();
        Ok(parsed)
    }

    pub fn load_with_path(cfg_arg: Option<&str>) -> Result<Self> {
        let path = Self::config_path(cfg_arg)?;
        let contents = std::fs::read_to_string(&path)?;
        let mut parsed = Self::from_toml(&contents)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        parsed.config_path = Some(path);
        Ok(parsed)
    }

    /// Sanitize config values to handle common formatting issues
    pub fn sanitize(&mut self) {
        self.pattern = self.pattern.trim().to_string();
        self.palette = self.palette.trim().to_string();
        self.wled_ip = self.wled_ip.trim().to_string();
        self.output = self.output.trim().to_lowercase();
        if !matches!(self.output.as_str(), "ddp" | "preview" | "none") {
            log::warn!("Unknown output '{}', using ddp", self.output);
            self.output = "ddp".to_string();
        }

        self.solid_color = self.solid_color.trim().trim_start_matches('#').to_uppercase();
        if Rgb::from_hex(&self.solid_color).is_err() {
            log::warn!("Invalid solid_color '{}', using 0000FF", self.solid_color);
            self.solid_color = "0000FF".to_string();
        }

        // Clamp numeric values to reasonable ranges
        self.total_leds = self.total_leds.min(100_000);
        self.spiral_arms = self.spiral_arms.clamp(1, 1000);
        self.speed = self.speed.min(255);
        self.brightness = self.brightness.min(255);
        self.cooling = self.cooling.min(255);
        self.sparking = self.sparking.min(255);
        self.fps = if self.fps.is_finite() { self.fps.clamp(1.0, 500.0) } else { 100.0 };
        self.hue_interval_ms = self.hue_interval_ms.clamp(1, 60_000);

        self.custom_palettes = self
            .custom_palettes
            .iter()
            .map(|(name, colors)| (name.trim().to_string(), Self::sanitize_color_string(colors)))
            .filter(|(name, _)| !name.is_empty())
            .collect();
    }

    /// Sanitize a comma-separated hex color list.
    /// Removes trailing commas, leading commas, extra whitespace, and invalid entries
    fn sanitize_color_string(color: &str) -> String {
        color
            .trim()
            .to_uppercase()
            .split(',')
            .map(|s| s.trim().trim_start_matches('#'))
            .filter(|s| !s.is_empty())
            .filter(|s| s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Palette index for the configured name (or number), if it exists
    pub fn palette_index(&self, palettes: &PaletteSet) -> Option<usize> {
        palettes.position(&self.palette).or_else(|| {
            self.palette
                .parse::<usize>()
                .ok()
                .filter(|&i| i < palettes.len())
        })
    }

    /// Control parameters for the renderer. An unknown palette keeps `fallback_palette`.
    pub fn control_input(&self, palettes: &PaletteSet, fallback_palette: usize) -> ControlInput {
        let palette = self.palette_index(palettes).unwrap_or_else(|| {
            log::warn!("Unknown palette '{}', keeping palette {}", self.palette, fallback_palette);
            fallback_palette
        });

        ControlInput {
            speed: self.speed.min(255) as u8,
            palette,
            solid_color: Rgb::from_hex(&self.solid_color).unwrap_or(Rgb::new(0, 0, 255)),
            brightness: self.brightness.min(255) as u8,
            pattern: PatternSelector::parse(&self.pattern),
            cooling: self.cooling.min(255) as u8,
            sparking: self.sparking.min(255) as u8,
        }
    }

    /// Render the config as a commented TOML document
    pub fn to_toml_string(&self) -> String {
        let mut sanitized = self.clone();
        sanitized.sanitize();

        let mut contents = format!(
            r#"# SpiralWLED Configuration File
# Edit this file while the program is running to change settings in real-time
# Note: total_leds, spiral_arms, fps, output and wled_ip apply on restart

# Total number of LEDs on the disc
total_leds = {}

# Number of spiral arms the strip is wired along (odd arms run inward)
spiral_arms = {}

# Pattern name or index (run with --list to see all)
pattern = "{}"

# Palette name or index (run with --list to see all)
palette = "{}"

# Animation speed (0-255)
speed = {}

# Output brightness (0-255), applied when frames are sent
brightness = {}

# Color used by the "Solid Color" pattern (hex)
solid_color = "{}"

# Heat-map fire: how fast cells cool (0-255) and how often sparks ignite (0-255)
cooling = {}
sparking = {}

# Rendering frame rate
fps = {}

# Milliseconds per step of the slowly rotating global hue
hue_interval_ms = {}

# Start a pattern from fresh state whenever it is selected
# Options: true, false
reset_on_switch = {}

# Output: "ddp" (WLED over UDP port 4048), "preview" (terminal), "none"
output = "{}"

# WLED device IP address or hostname
wled_ip = "{}"
"#,
            sanitized.total_leds,
            sanitized.spiral_arms,
            sanitized.pattern,
            sanitized.palette,
            sanitized.speed,
            sanitized.brightness,
            sanitized.solid_color,
            sanitized.cooling,
            sanitized.sparking,
            sanitized.fps,
            sanitized.hue_interval_ms,
            sanitized.reset_on_switch,
            sanitized.output,
            sanitized.wled_ip,
        );

        contents.push_str("\n# Custom palettes: name = \"RRGGBB,RRGGBB,...\" (2 to 16 colors)\n");
        contents.push_str("# A custom palette with a built-in name replaces that palette\n");
        contents.push_str("[custom_palettes]\n");
        for (name, colors) in &sanitized.custom_palettes {
            contents.push_str(&format!("\"{}\" = \"{}\"\n", name.replace('"', ""), colors));
        }

        contents
    }

    pub fn save(&self) -> Result<()> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::config_path(None)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, self.to_toml_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = EngineConfig::from_toml("speed = 90\n").unwrap();
        assert_eq!(config.speed, 90);
        assert_eq!(config.total_leds, 256);
        assert_eq!(config.pattern, "Color Palette Waves");
    }

    #[test]
    fn sanitize_clamps_and_normalizes() {
        let config = EngineConfig::from_toml(
            r##"
speed = 900
brightness = 300
fps = 0.0
output = " PREVIEW "
solid_color = "#00ff00"
hue_interval_ms = 0

[custom_palettes]
" Mine " = "ff0000, ,00FF00,zzzzzz,"
"##,
        )
        .unwrap();
        assert_eq!(config.speed, 255);
        assert_eq!(config.brightness, 255);
        assert_eq!(config.fps, 1.0);
        assert_eq!(config.output, "preview");
        assert_eq!(config.solid_color, "00FF00");
        assert_eq!(config.hue_interval_ms, 1);
        assert_eq!(config.custom_palettes.get("Mine").map(String::as_str), Some("FF0000,00FF00"));
    }

    #[test]
    fn bad_values_fall_back() {
        let config = EngineConfig::from_toml("output = \"hdmi\"\nsolid_color = \"purple\"\n").unwrap();
        assert_eq!(config.output, "ddp");
        assert_eq!(config.solid_color, "0000FF");
    }

    #[test]
    fn saved_file_parses_back() {
        let mut config = EngineConfig::default();
        config.pattern = "Swirl".to_string();
        config.speed = 77;
        config.custom_palettes.insert("Sea Glass".to_string(), "00FFAA,0044FF".to_string());

        let reparsed = EngineConfig::from_toml(&config.to_toml_string()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn save_writes_to_explicit_path() {
        let dir = std::env::temp_dir().join(format!("spiralwled-test-{}", std::process::id()));
        let path = dir.join("engine.conf");
        let config = EngineConfig { config_path: Some(path.clone()), ..EngineConfig::default() };
        config.save().unwrap();
        let loaded = EngineConfig::load_with_path(path.to_str()).unwrap();
        assert_eq!(loaded.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.total_leds, config.total_leds);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn args_override_config() {
        let mut config = EngineConfig::default();
        assert!(!config.merge_with_args(&Args::default()));

        let args = Args {
            pattern: Some("Fire".to_string()),
            speed: Some(200),
            output: Some("None".to_string()),
            ..Args::default()
        };
        assert!(config.merge_with_args(&args));
        assert_eq!(config.pattern, "Fire");
        assert_eq!(config.speed, 200);
        assert_eq!(config.output, "none");
    }

    #[test]
    fn control_input_resolves_names() {
        let palettes = PaletteSet::builtin().unwrap();
        let config = EngineConfig {
            palette: "lava".to_string(),
            pattern: "11".to_string(),
            ..EngineConfig::default()
        };
        let input = config.control_input(&palettes, 0);
        assert_eq!(input.palette, palettes.position("Lava").unwrap());
        assert_eq!(input.pattern, PatternSelector::Index(11));
        assert_eq!(input.solid_color, Rgb::new(0, 0, 255));

        let unknown = EngineConfig { palette: "Plaid".to_string(), ..EngineConfig::default() };
        assert_eq!(unknown.control_input(&palettes, 4).palette, 4);

        let numeric = EngineConfig { palette: "3".to_string(), ..EngineConfig::default() };
        assert_eq!(numeric.palette_index(&palettes), Some(3));
    }
}
