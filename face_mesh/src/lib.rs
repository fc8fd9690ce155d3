pub mod canvas;
pub mod configure;
pub mod contours;
pub mod detector;
pub mod environment;
pub mod error;
pub mod params;
pub mod path_utils;
pub mod raster;
pub mod render;

use serde::{Deserialize, Serialize};

pub use canvas::{Canvas2d, FillRule, Point, RecordingCanvas, Rgba};
pub use configure::{configure, configure_flags, BackendId};
pub use contours::{Contour, ContourLabel};
pub use environment::{Backend, BackendFactory, Environment};
pub use error::{ConfigureError, RenderError};
pub use params::{FlagConfig, FlagValue};
pub use raster::ImageCanvas;
pub use render::{draw_path, draw_results, RenderOptions};

/// A single landmark as returned by the detector. `z` is carried through but never drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    /// Drops any depth component.
    pub fn to_point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Face bounding box in the detector's pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// One detected face: its landmarks in model order plus the box around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub keypoints: Vec<Keypoint>,
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
}

impl Face {
    /// True when the detector ran with iris refinement and returned both irises.
    pub fn has_irises(&self) -> bool {
        self.keypoints.len() >= params::NUM_KEYPOINTS + 2 * params::NUM_IRIS_KEYPOINTS
    }

    pub fn points(&self) -> Vec<Point> {
        self.keypoints.iter().map(Keypoint::to_point).collect()
    }
}
