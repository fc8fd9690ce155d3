use std::collections::BTreeMap;
use std::fmt::Display;

pub const NUM_KEYPOINTS: usize = 468;
pub const NUM_IRIS_KEYPOINTS: usize = 5;

/// A legal value for a tunable flag. Flags are either switches or numbers, never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
}

impl FlagValue {
    /// Returns `None` for JSON values that can never be a flag value (strings, arrays, ...).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FlagValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(FlagValue::Number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            FlagValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            FlagValue::Bool(_) => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Number(value)
    }
}

impl Display for FlagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Proposed flag values keyed by flag name.
pub type FlagConfig = BTreeMap<String, FlagValue>;

const ON_OFF: &[FlagValue] = &[FlagValue::Bool(true), FlagValue::Bool(false)];

/// Flags a caller may tune, with their legal values.
///
/// Only flags that are actually tunable at runtime and that do not depend on
/// other flags are listed. `WEBGL_RENDER_FLOAT32_CAPABLE` is the exception: it
/// is exposed next to `WEBGL_FORCE_F16_TEXTURES` so the pair reads sensibly.
pub const TUNABLE_FLAG_VALUE_RANGE: &[(&str, &[FlagValue])] = &[
    (
        "WEBGL_VERSION",
        &[FlagValue::Number(1.0), FlagValue::Number(2.0)],
    ),
    ("WASM_HAS_SIMD_SUPPORT", ON_OFF),
    ("WASM_HAS_MULTITHREAD_SUPPORT", ON_OFF),
    ("WEBGL_CPU_FORWARD", ON_OFF),
    ("WEBGL_PACK", ON_OFF),
    ("WEBGL_FORCE_F16_TEXTURES", ON_OFF),
    ("WEBGL_RENDER_FLOAT32_CAPABLE", ON_OFF),
    (
        "WEBGL_FLUSH_THRESHOLD",
        &[
            FlagValue::Number(-1.0),
            FlagValue::Number(0.0),
            FlagValue::Number(0.25),
            FlagValue::Number(0.5),
            FlagValue::Number(0.75),
            FlagValue::Number(1.0),
            FlagValue::Number(1.25),
            FlagValue::Number(1.5),
            FlagValue::Number(1.75),
            FlagValue::Number(2.0),
        ],
    ),
    ("CHECK_COMPUTATION_FOR_ERRORS", ON_OFF),
];

/// Which tunable flags each backend honours.
pub const BACKEND_FLAGS: &[(&str, &[&str])] = &[
    (
        "tfjs-wasm",
        &["WASM_HAS_SIMD_SUPPORT", "WASM_HAS_MULTITHREAD_SUPPORT"],
    ),
    (
        "tfjs-webgl",
        &[
            "WEBGL_VERSION",
            "WEBGL_CPU_FORWARD",
            "WEBGL_PACK",
            "WEBGL_FORCE_F16_TEXTURES",
            "WEBGL_RENDER_FLOAT32_CAPABLE",
            "WEBGL_FLUSH_THRESHOLD",
        ],
    ),
    ("mediapipe-gpu", &[]),
];

pub const MODEL_BACKENDS: &[(&str, &[&str])] =
    &[("MediaPipeFaceMesh", &["mediapipe-gpu", "tfjs-webgl"])];

pub const TUNABLE_FLAG_NAMES: &[(&str, &str)] = &[
    ("PROD", "production mode"),
    ("WEBGL_VERSION", "webgl version"),
    ("WASM_HAS_SIMD_SUPPORT", "wasm SIMD"),
    ("WASM_HAS_MULTITHREAD_SUPPORT", "wasm multithread"),
    ("WEBGL_CPU_FORWARD", "cpu forward"),
    ("WEBGL_PACK", "webgl pack"),
    ("WEBGL_FORCE_F16_TEXTURES", "enforce float16"),
    ("WEBGL_RENDER_FLOAT32_CAPABLE", "enable float32"),
    ("WEBGL_FLUSH_THRESHOLD", "GL flush wait time(ms)"),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Legal values for `flag`, or `None` when the flag is not tunable.
pub fn allowed_values(flag: &str) -> Option<&'static [FlagValue]> {
    lookup(TUNABLE_FLAG_VALUE_RANGE, flag)
}

pub fn is_tunable(flag: &str) -> bool {
    allowed_values(flag).is_some()
}

pub fn flag_label(flag: &str) -> Option<&'static str> {
    lookup(TUNABLE_FLAG_NAMES, flag)
}

pub fn backend_flags(backend_id: &str) -> Option<&'static [&'static str]> {
    lookup(BACKEND_FLAGS, backend_id)
}

pub fn model_backends(model: &str) -> Option<&'static [&'static str]> {
    lookup(MODEL_BACKENDS, model)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

pub const VIDEO_SIZES: &[(&str, VideoSize)] = &[
    ("1920 X 1080", VideoSize { width: 1920, height: 1080 }),
    ("1200 X 800", VideoSize { width: 1200, height: 800 }),
    ("640 X 480", VideoSize { width: 640, height: 480 }),
    ("640 X 360", VideoSize { width: 640, height: 360 }),
    ("360 X 270", VideoSize { width: 360, height: 270 }),
];

pub const DEFAULT_VIDEO_SIZE: &str = "1920 X 1080";

impl VideoSize {
    pub fn from_label(label: &str) -> anyhow::Result<Self> {
        lookup(VIDEO_SIZES, label).ok_or_else(|| {
            let known = VIDEO_SIZES.iter().map(|(l, _)| *l).collect::<Vec<_>>();
            anyhow::anyhow!("Unknown video size {label:?}, expected one of {known:?}")
        })
    }
}
