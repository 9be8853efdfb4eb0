//! Wall configuration file and environment-provided link parameters.

use crate::foundation::core::Vec2i;
use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::{WireReader, WireWriter};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Numbering of screens inside the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// `rank = x + y * cols`.
    #[default]
    RowMajor,
    /// `rank = y + x * rows`.
    ColumnMajor,
}

impl Orientation {
    /// Flag stored in configuration files: `0` is row-major, anything else column-major.
    pub fn from_flag(flag: i32) -> Self {
        if flag == 0 {
            Orientation::RowMajor
        } else {
            Orientation::ColumnMajor
        }
    }

    pub fn flag(self) -> i32 {
        match self {
            Orientation::RowMajor => 0,
            Orientation::ColumnMajor => 1,
        }
    }
}

/// Physical layout of the display wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WallConfig {
    /// Pixel size of one screen.
    pub local_screen: Vec2i,
    /// Grid size in screens (columns, rows).
    pub display_config: Vec2i,
    /// Hidden pixels between adjacent screens, per axis.
    #[serde(default)]
    pub bezel: Vec2i,
    #[serde(default)]
    pub orientation: Orientation,
}

/// Size of [`WallConfig::to_bytes`].
pub const WALL_CONFIG_BYTES: usize = 7 * 4;

impl WallConfig {
    pub fn new(local_screen: Vec2i, display_config: Vec2i) -> Self {
        Self {
            local_screen,
            display_config,
            bezel: Vec2i::default(),
            orientation: Orientation::RowMajor,
        }
    }

    pub fn with_bezel(mut self, bezel: Vec2i) -> Self {
        self.bezel = bezel;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Load a configuration file: JSON when the extension is `.json`, otherwise the
    /// whitespace-separated text form (`w h cols rows bezel_x bezel_y orientation`).
    pub fn load(path: &Path) -> WallResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read wall config '{}'", path.display()))
            .map_err(|e| WallError::config(format!("{e:#}")))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let cfg = if is_json {
            serde_json::from_str::<WallConfig>(&text).map_err(|e| {
                WallError::config(format!("parse wall config '{}': {e}", path.display()))
            })?
        } else {
            Self::parse(&text)?
        };
        cfg.validate()?;
        tracing::debug!(path = %path.display(), ?cfg, "loaded wall config");
        Ok(cfg)
    }

    /// Parse the seven-integer text form.
    pub fn parse(text: &str) -> WallResult<Self> {
        const FIELDS: [&str; 7] = [
            "local screen width",
            "local screen height",
            "grid columns",
            "grid rows",
            "bezel x",
            "bezel y",
            "orientation",
        ];
        let mut tokens = text.split_whitespace();
        let mut v = [0i32; 7];
        for (slot, name) in v.iter_mut().zip(FIELDS) {
            let tok = tokens
                .next()
                .ok_or_else(|| WallError::config(format!("wall config is missing the {name}")))?;
            *slot = tok
                .parse()
                .map_err(|_| WallError::config(format!("invalid {name} '{tok}'")))?;
        }
        Ok(Self {
            local_screen: Vec2i::new(v[0], v[1]),
            display_config: Vec2i::new(v[2], v[3]),
            bezel: Vec2i::new(v[4], v[5]),
            orientation: Orientation::from_flag(v[6]),
        })
    }

    /// Text form accepted by [`WallConfig::parse`].
    pub fn to_text(&self) -> String {
        format!(
            "{} {}\n{} {}\n{} {}\n{}\n",
            self.local_screen.x,
            self.local_screen.y,
            self.display_config.x,
            self.display_config.y,
            self.bezel.x,
            self.bezel.y,
            self.orientation.flag()
        )
    }

    pub fn validate(&self) -> WallResult<()> {
        if self.local_screen.x <= 0 || self.local_screen.y <= 0 {
            return Err(WallError::config(format!(
                "local screen size must be positive, got {}",
                self.local_screen
            )));
        }
        if self.display_config.x <= 0 || self.display_config.y <= 0 {
            return Err(WallError::config(format!(
                "display grid must be positive, got {}",
                self.display_config
            )));
        }
        if self.bezel.x < 0 || self.bezel.y < 0 {
            return Err(WallError::config(format!(
                "bezel compensation must not be negative, got {}",
                self.bezel
            )));
        }
        Ok(())
    }

    /// Fixed little-endian form broadcast from the master to every display node.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(WALL_CONFIG_BYTES);
        w.put_vec2i(self.local_screen);
        w.put_vec2i(self.display_config);
        w.put_vec2i(self.bezel);
        w.put_i32(self.orientation.flag());
        w.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> WallResult<Self> {
        if bytes.len() != WALL_CONFIG_BYTES {
            return Err(WallError::protocol(format!(
                "wall config broadcast must be {WALL_CONFIG_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = WireReader::new(bytes);
        let cfg = Self {
            local_screen: r.vec2i()?,
            display_config: r.vec2i()?,
            bezel: r.vec2i()?,
            orientation: Orientation::from_flag(r.i32()?),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Connection and display parameters normally supplied through the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSettings {
    /// `DW_CONFIG_FILE`
    pub config_file: PathBuf,
    /// `DW_HOSTNAME`
    pub host: String,
    /// `DW_HOSTPORT`
    pub port: u16,
    /// `DW_FULLSCREEN`
    pub fullscreen: bool,
    /// `OSPRAY_PREALLOCATED_TILES`
    pub preallocated_tiles: u32,
    /// `OSPRAY_DYNAMIC_LOADBALANCER`
    pub dynamic_load_balancer: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("default.conf"),
            host: "localhost".to_string(),
            port: 4444,
            fullscreen: true,
            preallocated_tiles: 4,
            dynamic_load_balancer: false,
        }
    }
}

impl LinkSettings {
    pub fn from_env() -> WallResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LinkSettings::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> WallResult<Self> {
        let mut s = Self::default();
        if let Some(v) = lookup("DW_CONFIG_FILE") {
            s.config_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("DW_HOSTNAME") {
            s.host = v;
        }
        if let Some(v) = lookup("DW_HOSTPORT") {
            s.port = parse_var("DW_HOSTPORT", &v)?;
        }
        if let Some(v) = lookup("DW_FULLSCREEN") {
            s.fullscreen = parse_var::<i64>("DW_FULLSCREEN", &v)? != 0;
        }
        if let Some(v) = lookup("OSPRAY_PREALLOCATED_TILES") {
            s.preallocated_tiles = parse_var("OSPRAY_PREALLOCATED_TILES", &v)?;
        }
        if let Some(v) = lookup("OSPRAY_DYNAMIC_LOADBALANCER") {
            s.dynamic_load_balancer = parse_var::<i64>("OSPRAY_DYNAMIC_LOADBALANCER", &v)? != 0;
        }
        Ok(s)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> WallResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| WallError::config(format!("{key}='{value}' is not a valid number")))
}

#[cfg(test)]
#[path = "../../tests/unit/wall/config.rs"]
mod tests;
