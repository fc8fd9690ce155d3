use std::fmt::Display;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::configure::BackendId;
use crate::params::{model_backends, NUM_IRIS_KEYPOINTS, NUM_KEYPOINTS};

pub const MEDIAPIPE_FACE_MESH_VERSION: &str = "0.4.1633559619";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupportedModel {
    #[default]
    MediaPipeFaceMesh,
}

impl SupportedModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedModel::MediaPipeFaceMesh => "MediaPipeFaceMesh",
        }
    }

    pub fn backends(&self) -> &'static [&'static str] {
        model_backends(self.as_str()).unwrap_or_default()
    }
}

impl Display for SupportedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MediaPipeFaceMesh" => Ok(SupportedModel::MediaPipeFaceMesh),
            _ => bail!("Unsupported model {s:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    pub max_faces: usize,
    /// Adds iris landmarks after the base mesh.
    pub refine_landmarks: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            max_faces: 1,
            refine_landmarks: true,
        }
    }
}

impl DetectorConfig {
    pub fn expected_keypoints(&self) -> usize {
        if self.refine_landmarks {
            NUM_KEYPOINTS + 2 * NUM_IRIS_KEYPOINTS
        } else {
            NUM_KEYPOINTS
        }
    }
}

/// Everything needed to construct a detector for one model/backend pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorOptions {
    pub model: SupportedModel,
    pub runtime: String,
    pub max_faces: usize,
    pub refine_landmarks: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_path: Option<String>,
}

impl DetectorOptions {
    pub fn for_backend(
        model: SupportedModel,
        config: &DetectorConfig,
        backend_id: &str,
    ) -> anyhow::Result<Self> {
        if !model.backends().iter().any(|b| *b == backend_id) {
            bail!(
                "{model} does not support {backend_id}, expected one of {:?}",
                model.backends()
            );
        }
        let id = BackendId::parse(backend_id)?;
        let solution_path = match id.runtime.as_str() {
            "mediapipe" => Some(format!(
                "https://cdn.jsdelivr.net/npm/@mediapipe/face_mesh@{MEDIAPIPE_FACE_MESH_VERSION}"
            )),
            "tfjs" => None,
            other => bail!("Unsupported runtime {other:?}"),
        };
        if config.max_faces == 0 {
            bail!("max_faces must be at least 1");
        }
        Ok(DetectorOptions {
            model,
            runtime: id.runtime,
            max_faces: config.max_faces,
            refine_landmarks: config.refine_landmarks,
            solution_path,
        })
    }
}
