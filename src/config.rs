use crate::gesture::Gesture;
use crate::keymap::{normalize_key, UnknownKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// An HSV triple in the 8-bit vision scale: hue 0-179, saturation and value 0-255
pub type HsvTriple = [u8; 3];

pub const DEFAULT_SKIN_LOWER: HsvTriple = [0, 20, 70];
pub const DEFAULT_SKIN_UPPER: HsvTriple = [20, 255, 255];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid cooldown: {0}ms")]
    NegativeCooldown(i64),

    #[error("invalid min hand area: {0}")]
    NonPositiveMinArea(f64),

    #[error("max hand area ({max}) must be greater than min hand area ({min})")]
    InvertedAreaBand { min: f64, max: f64 },

    #[error("confidence must be between 0 and 1: {0}")]
    ConfidenceOutOfRange(f64),

    #[error("skin lower bound {lower:?} exceeds upper bound {upper:?}")]
    InvertedSkinRange { lower: HsvTriple, upper: HsvTriple },

    #[error("defect depth threshold must be non-negative: {0}")]
    NegativeDefectThreshold(f64),

    #[error("simulation period must be non-zero")]
    ZeroSimulationPeriod,

    #[error("invalid camera settings: {width}x{height} @ {fps}fps")]
    InvalidCamera { width: u32, height: u32, fps: u32 },

    #[error("no gesture bindings configured")]
    NoBindings,

    #[error("binding for {gesture}: {source}")]
    InvalidBinding {
        gesture: Gesture,
        #[source]
        source: UnknownKey,
    },
}

/// Thresholds and timings consumed by the recognition core
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub skin_lower: HsvTriple,
    pub skin_upper: HsvTriple,
    pub min_hand_area: f64,
    pub max_hand_area: f64,
    /// Depth above which a convexity defect counts as a gap between fingers.
    /// Same fixed-point scale as defect depths (pixels * 256).
    pub defect_depth_threshold: f64,
    pub cooldown: Duration,
    /// Reserved gating knob; validated but not consulted by the rules.
    pub confidence: f64,
    pub simulation_period: Duration,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            skin_lower: DEFAULT_SKIN_LOWER,
            skin_upper: DEFAULT_SKIN_UPPER,
            min_hand_area: 5000.0,
            max_hand_area: 50000.0,
            defect_depth_threshold: 10000.0,
            cooldown: Duration::from_millis(500),
            confidence: 0.7,
            simulation_period: Duration::from_secs(3),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_hand_area <= 0.0 {
            return Err(ConfigError::NonPositiveMinArea(self.min_hand_area));
        }
        if self.max_hand_area <= self.min_hand_area {
            return Err(ConfigError::InvertedAreaBand {
                min: self.min_hand_area,
                max: self.max_hand_area,
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::ConfidenceOutOfRange(self.confidence));
        }
        if self.defect_depth_threshold < 0.0 {
            return Err(ConfigError::NegativeDefectThreshold(
                self.defect_depth_threshold,
            ));
        }
        if self
            .skin_lower
            .iter()
            .zip(self.skin_upper.iter())
            .any(|(lo, hi)| lo > hi)
        {
            return Err(ConfigError::InvertedSkinRange {
                lower: self.skin_lower,
                upper: self.skin_upper,
            });
        }
        if self.simulation_period.is_zero() {
            return Err(ConfigError::ZeroSimulationPeriod);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    pub device_id: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 || self.fps == 0 {
            return Err(ConfigError::InvalidCamera {
                width: self.width,
                height: self.height,
                fps: self.fps,
            });
        }
        Ok(())
    }
}

/// Full application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    /// Gesture to key name, handed to the external key injector
    pub bindings: BTreeMap<Gesture, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            detection: DetectionConfig::default(),
            bindings: default_bindings(),
        }
    }
}

pub fn default_bindings() -> BTreeMap<Gesture, String> {
    [
        (Gesture::OpenPalm, "space"),
        (Gesture::ClosedFist, "enter"),
        (Gesture::OneFinger, "1"),
        (Gesture::TwoFingers, "2"),
        (Gesture::ThreeFingers, "3"),
    ]
    .into_iter()
    .map(|(g, k)| (g, k.to_string()))
    .collect()
}

impl Config {
    /// Load a JSON config file. Missing or malformed values fall back to
    /// defaults; the merged result must still pass validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!("Loading configuration from {}", path.display());
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(data)?;
        let config = raw.into_config()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bindings.is_empty() {
            return Err(ConfigError::NoBindings);
        }
        for (&gesture, key) in &self.bindings {
            normalize_key(key)
                .map_err(|source| ConfigError::InvalidBinding { gesture, source })?;
        }
        self.camera.validate()?;
        self.detection.validate()
    }
}

/// Deserialize a field, discarding values of the wrong shape instead of
/// failing the whole document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            tracing::warn!("Ignoring malformed config value {}: {}", value, err);
            Ok(None)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    camera: RawCamera,
    detection: RawDetection,
    #[serde(deserialize_with = "lenient")]
    gesture_bindings: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCamera {
    #[serde(deserialize_with = "lenient")]
    device_id: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    width: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    height: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    fps: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDetection {
    #[serde(deserialize_with = "lenient")]
    min_hand_area: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    max_hand_area: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    cooldown_ms: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    confidence: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    defect_depth_threshold: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    simulation_period_ms: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    skin_color_lower: Option<Vec<i64>>,
    #[serde(deserialize_with = "lenient")]
    skin_color_upper: Option<Vec<i64>>,
}

fn hsv_triple(values: Option<Vec<i64>>, fallback: HsvTriple, name: &str) -> HsvTriple {
    let Some(values) = values else {
        return fallback;
    };
    let parsed: Option<Vec<u8>> = values.iter().map(|&v| u8::try_from(v).ok()).collect();
    match parsed.as_deref() {
        Some(&[h, s, v]) => [h, s, v],
        _ => {
            tracing::warn!(
                "{} must be three values in 0-255, got {:?}; using {:?}",
                name,
                values,
                fallback
            );
            fallback
        }
    }
}

impl RawConfig {
    fn into_config(self) -> Result<Config, ConfigError> {
        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            device_id: self.camera.device_id.unwrap_or(camera_defaults.device_id),
            width: self.camera.width.unwrap_or(camera_defaults.width),
            height: self.camera.height.unwrap_or(camera_defaults.height),
            fps: self.camera.fps.unwrap_or(camera_defaults.fps),
        };

        let defaults = DetectionConfig::default();
        let raw = self.detection;
        let cooldown = match raw.cooldown_ms {
            Some(ms) if ms < 0 => return Err(ConfigError::NegativeCooldown(ms)),
            Some(ms) => Duration::from_millis(ms as u64),
            None => defaults.cooldown,
        };
        let detection = DetectionConfig {
            skin_lower: hsv_triple(raw.skin_color_lower, defaults.skin_lower, "skin_color_lower"),
            skin_upper: hsv_triple(raw.skin_color_upper, defaults.skin_upper, "skin_color_upper"),
            min_hand_area: raw.min_hand_area.unwrap_or(defaults.min_hand_area),
            max_hand_area: raw.max_hand_area.unwrap_or(defaults.max_hand_area),
            defect_depth_threshold: raw
                .defect_depth_threshold
                .unwrap_or(defaults.defect_depth_threshold),
            cooldown,
            confidence: raw.confidence.unwrap_or(defaults.confidence),
            simulation_period: raw
                .simulation_period_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.simulation_period),
        };

        let bindings = match self.gesture_bindings {
            Some(entries) => {
                let mut bindings = BTreeMap::new();
                for (label, key) in entries {
                    let gesture = match label.parse::<Gesture>() {
                        Ok(gesture) => gesture,
                        Err(err) => {
                            tracing::warn!("Skipping binding: {}", err);
                            continue;
                        }
                    };
                    match normalize_key(&key) {
                        Ok(key) => {
                            bindings.insert(gesture, key);
                        }
                        Err(err) => tracing::warn!("Skipping binding for {}: {}", gesture, err),
                    }
                }
                bindings
            }
            None => default_bindings(),
        };

        Ok(Config {
            camera,
            detection,
            bindings,
        })
    }
}
