use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Number of panes the edit window always carries.
pub const PANE_COUNT: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EditConfig {
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panes: Vec<PaneSection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowSection {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

/// Pacing knobs for the render gate, configure tracker, and repaint timer.
///
/// The defaults reproduce the integer microsecond arithmetic of the classic
/// GLArea demo: `1_000_000 / 25`, `1_000_000 / 30`, and a `1000 / 60`
/// millisecond timer truncated to 16 ms.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimingSection {
    #[serde(
        default = "default_render_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub render_interval: Duration,
    #[serde(
        default = "default_configure_settle",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub configure_settle: Duration,
    #[serde(
        default = "default_timer_period",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timer_period: Duration,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaneSection {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_shader: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_shader: Option<PathBuf>,
    pub background: Color,
}

/// Straight RGBA colour with components in `[0, 1]`.
///
/// Accepts either an array of three or four floats or a `#rrggbb` /
/// `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const RED: Color = Color([1.0, 0.0, 0.0, 1.0]);
    pub const BLUE: Color = Color([0.0, 0.0, 1.0, 1.0]);

    pub fn components(self) -> [f32; 4] {
        self.0
    }

    pub fn parse_hex(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| format!("colour '{trimmed}' must start with '#'"))?;
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(format!(
                "colour '{trimmed}' must be #rrggbb or #rrggbbaa"
            ));
        }

        let mut components = [1.0f32; 4];
        for (index, chunk) in digits.as_bytes().chunks(2).enumerate() {
            let text = std::str::from_utf8(chunk).map_err(|err| err.to_string())?;
            let value = u8::from_str_radix(text, 16)
                .map_err(|_| format!("colour '{trimmed}' contains invalid hex digits"))?;
            components[index] = f32::from(value) / 255.0;
        }
        Ok(Color(components))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Str(String),
            List(Vec<f32>),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Str(raw) => Color::parse_hex(&raw).map_err(de::Error::custom),
            Helper::List(values) => match values.as_slice() {
                [r, g, b] => Ok(Color([*r, *g, *b, 1.0])),
                [r, g, b, a] => Ok(Color([*r, *g, *b, *a])),
                other => Err(de::Error::custom(format!(
                    "colour arrays need 3 or 4 components, got {}",
                    other.len()
                ))),
            },
        }
    }
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            version: 1,
            window: WindowSection::default(),
            timing: TimingSection::default(),
            panes: Vec::new(),
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            render_interval: default_render_interval(),
            configure_settle: default_configure_settle(),
            timer_period: default_timer_period(),
        }
    }
}

fn default_title() -> String {
    "Edit".to_string()
}

fn default_width() -> u32 {
    600
}

fn default_height() -> u32 {
    400
}

fn default_render_interval() -> Duration {
    Duration::from_micros(1_000_000 / 25)
}

fn default_configure_settle() -> Duration {
    Duration::from_micros(1_000_000 / 30)
}

fn default_timer_period() -> Duration {
    Duration::from_millis((1000.0_f64 / 60.0) as u64)
}

/// Built-in pane layout: a red pane on the left, a blue pane on the right,
/// both using the embedded triangle shaders.
pub fn default_panes() -> [PaneSection; PANE_COUNT] {
    [
        PaneSection {
            label: "left".to_string(),
            vertex_shader: None,
            fragment_shader: None,
            background: Color::RED,
        },
        PaneSection {
            label: "right".to_string(),
            vertex_shader: None,
            fragment_shader: None,
            background: Color::BLUE,
        },
    ]
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl EditConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EditConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates a config file, resolving relative shader paths
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the configured panes, or the built-in pair when none are set.
    pub fn resolved_panes(&self) -> [PaneSection; PANE_COUNT] {
        match self.panes.as_slice() {
            [left, right] => [left.clone(), right.clone()],
            _ => default_panes(),
        }
    }

    pub fn resolve_relative_paths(&mut self, base: &Path) {
        for pane in &mut self.panes {
            for slot in [&mut pane.vertex_shader, &mut pane.fragment_shader] {
                if let Some(path) = slot.as_mut() {
                    if path.is_relative() {
                        *path = base.join(&*path);
                    }
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window width and height must be greater than zero".into(),
            ));
        }

        for (name, value) in [
            ("render_interval", self.timing.render_interval),
            ("configure_settle", self.timing.configure_settle),
            ("timer_period", self.timing.timer_period),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "timing.{name} must be greater than zero"
                )));
            }
        }

        if !self.panes.is_empty() && self.panes.len() != PANE_COUNT {
            return Err(ConfigError::Invalid(format!(
                "expected exactly {PANE_COUNT} [[panes]] entries, found {}",
                self.panes.len()
            )));
        }

        for pane in &self.panes {
            if pane.label.trim().is_empty() {
                return Err(ConfigError::Invalid("pane label may not be empty".into()));
            }

            if pane
                .background
                .0
                .iter()
                .any(|component| !(0.0..=1.0).contains(component))
            {
                return Err(ConfigError::Invalid(format!(
                    "pane '{}' background components must be within [0, 1]",
                    pane.label
                )));
            }
        }

        Ok(())
    }
}
