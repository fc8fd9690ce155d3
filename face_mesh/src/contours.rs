use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::canvas::Rgba;

// Keypoint indices per facial feature in the 478 point MediaPipe FaceMesh
// topology. Each list holds the first index of every connection in the
// feature's mesh edges followed by the end of the final connection.
const LIPS: &[usize] = &[
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 61, 185, 40, 39, 37, 0, 267, 269, 270, 409, 78,
    95, 88, 178, 87, 14, 317, 402, 318, 324, 78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308,
];
const LEFT_EYE: &[usize] = &[
    263, 249, 390, 373, 374, 380, 381, 382, 263, 466, 388, 387, 386, 385, 384, 398, 362,
];
const LEFT_EYEBROW: &[usize] = &[276, 283, 282, 295, 300, 293, 334, 296, 336];
const LEFT_IRIS: &[usize] = &[474, 475, 476, 477, 474];
const RIGHT_EYE: &[usize] = &[
    33, 7, 163, 144, 145, 153, 154, 155, 33, 246, 161, 160, 159, 158, 157, 173, 133,
];
const RIGHT_EYEBROW: &[usize] = &[46, 53, 52, 65, 70, 63, 105, 66, 107];
const RIGHT_IRIS: &[usize] = &[469, 470, 471, 472, 469];
const FACE_OVAL: &[usize] = &[
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109, 10,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContourLabel {
    Lips,
    LeftEye,
    LeftEyebrow,
    LeftIris,
    RightEye,
    RightEyebrow,
    RightIris,
    FaceOval,
}

impl ContourLabel {
    pub const ALL: [ContourLabel; 8] = [
        ContourLabel::Lips,
        ContourLabel::LeftEye,
        ContourLabel::LeftEyebrow,
        ContourLabel::LeftIris,
        ContourLabel::RightEye,
        ContourLabel::RightEyebrow,
        ContourLabel::RightIris,
        ContourLabel::FaceOval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContourLabel::Lips => "lips",
            ContourLabel::LeftEye => "leftEye",
            ContourLabel::LeftEyebrow => "leftEyebrow",
            ContourLabel::LeftIris => "leftIris",
            ContourLabel::RightEye => "rightEye",
            ContourLabel::RightEyebrow => "rightEyebrow",
            ContourLabel::RightIris => "rightIris",
            ContourLabel::FaceOval => "faceOval",
        }
    }

    pub fn indices(&self) -> &'static [usize] {
        match self {
            ContourLabel::Lips => LIPS,
            ContourLabel::LeftEye => LEFT_EYE,
            ContourLabel::LeftEyebrow => LEFT_EYEBROW,
            ContourLabel::LeftIris => LEFT_IRIS,
            ContourLabel::RightEye => RIGHT_EYE,
            ContourLabel::RightEyebrow => RIGHT_EYEBROW,
            ContourLabel::RightIris => RIGHT_IRIS,
            ContourLabel::FaceOval => FACE_OVAL,
        }
    }

    /// Display colour of the feature: grey for the midline, green for the
    /// subject's left side and red for the right.
    pub fn color(&self) -> Rgba {
        match self {
            ContourLabel::Lips | ContourLabel::FaceOval => Rgba::new(0xe0, 0xe0, 0xe0, 1.0),
            ContourLabel::LeftEye | ContourLabel::LeftEyebrow | ContourLabel::LeftIris => {
                Rgba::new(0x30, 0xff, 0x30, 1.0)
            }
            ContourLabel::RightEye | ContourLabel::RightEyebrow | ContourLabel::RightIris => {
                Rgba::new(0xff, 0x30, 0x30, 1.0)
            }
        }
    }

    /// Iris contours only resolve when the detector refines landmarks.
    pub fn needs_iris_refinement(&self) -> bool {
        matches!(self, ContourLabel::LeftIris | ContourLabel::RightIris)
    }
}

impl Display for ContourLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContourLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContourLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown contour {s:?}"))
    }
}

/// A named, ordered list of keypoint indices outlining one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub label: Cow<'static, str>,
    pub indices: Cow<'static, [usize]>,
    /// Overrides the renderer's fill colour for this contour.
    pub fill: Option<Rgba>,
}

impl Contour {
    pub fn custom(label: impl Into<String>, indices: Vec<usize>) -> Self {
        Self {
            label: Cow::Owned(label.into()),
            indices: Cow::Owned(indices),
            fill: None,
        }
    }

    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = Some(fill);
        self
    }
}

impl From<ContourLabel> for Contour {
    fn from(label: ContourLabel) -> Self {
        Self {
            label: Cow::Borrowed(label.as_str()),
            indices: Cow::Borrowed(label.indices()),
            fill: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{NUM_IRIS_KEYPOINTS, NUM_KEYPOINTS};

    #[test]
    fn indices_fit_the_topology() {
        let limit = NUM_KEYPOINTS + 2 * NUM_IRIS_KEYPOINTS;
        for label in ContourLabel::ALL {
            let indices = label.indices();
            assert!(indices.len() >= 3, "{label} too short");
            let max = *indices.iter().max().unwrap();
            if label.needs_iris_refinement() {
                assert!(max >= NUM_KEYPOINTS && max < limit, "{label}");
            } else {
                assert!(max < NUM_KEYPOINTS, "{label}");
            }
        }
    }

    /// Mirrors how the landmark model publishes contours: the first index of
    /// each connection, then the end of the last one.
    fn from_connections(pairs: &[[usize; 2]]) -> Vec<usize> {
        let mut indices = pairs.iter().map(|p| p[0]).collect::<Vec<_>>();
        indices.extend(pairs.last().map(|p| p[1]));
        indices
    }

    #[test]
    fn lips_follow_connection_pairs() {
        let pairs = [
            [61, 146], [146, 91], [91, 181], [181, 84], [84, 17], [17, 314], [314, 405],
            [405, 321], [321, 375], [375, 291], [61, 185], [185, 40], [40, 39], [39, 37],
            [37, 0], [0, 267], [267, 269], [269, 270], [270, 409], [409, 291], [78, 95],
            [95, 88], [88, 178], [178, 87], [87, 14], [14, 317], [317, 402], [402, 318],
            [318, 324], [324, 308], [78, 191], [191, 80], [80, 81], [81, 82], [82, 13],
            [13, 312], [312, 311], [311, 310], [310, 415], [415, 308],
        ];
        assert_eq!(ContourLabel::Lips.indices(), from_connections(&pairs).as_slice());
        assert_eq!(ContourLabel::Lips.indices().len(), 41);
    }

    #[test]
    fn eyes_and_brows_follow_connection_pairs() {
        let left_eye = [
            [263, 249], [249, 390], [390, 373], [373, 374], [374, 380], [380, 381],
            [381, 382], [382, 362], [263, 466], [466, 388], [388, 387], [387, 386],
            [386, 385], [385, 384], [384, 398], [398, 362],
        ];
        let right_eyebrow = [
            [46, 53], [53, 52], [52, 65], [65, 55], [70, 63], [63, 105], [105, 66], [66, 107],
        ];
        let left_iris = [[474, 475], [475, 476], [476, 477], [477, 474]];
        assert_eq!(ContourLabel::LeftEye.indices(), from_connections(&left_eye).as_slice());
        assert_eq!(
            ContourLabel::RightEyebrow.indices(),
            from_connections(&right_eyebrow).as_slice()
        );
        assert_eq!(ContourLabel::LeftIris.indices(), from_connections(&left_iris).as_slice());
        let right_eye = ContourLabel::RightEye.indices();
        assert_eq!(right_eye.iter().filter(|&&i| i == 133).count(), 1);
        assert_eq!(&right_eye[7..9], &[155, 33]);
        assert_eq!(ContourLabel::LeftEyebrow.indices().len(), 9);
    }

    #[test]
    fn colours_follow_side_of_face() {
        assert_eq!(ContourLabel::Lips.color(), ContourLabel::FaceOval.color());
        assert_eq!(ContourLabel::LeftEye.color(), Rgba::new(0x30, 0xff, 0x30, 1.0));
        assert_eq!(ContourLabel::RightIris.color(), "#FF3030".parse::<Rgba>().unwrap());
    }

    #[test]
    fn labels_round_trip_through_strings() {
        for label in ContourLabel::ALL {
            assert_eq!(label.to_string().parse::<ContourLabel>().unwrap(), label);
        }
        assert!("mouth".parse::<ContourLabel>().is_err());
        let json = serde_json::to_string(&ContourLabel::RightEyebrow).unwrap();
        assert_eq!(json, "\"rightEyebrow\"");
    }

    #[test]
    fn contour_from_label_borrows_table() {
        let contour = Contour::from(ContourLabel::FaceOval);
        assert_eq!(contour.label, "faceOval");
        assert_eq!(contour.indices.first(), contour.indices.last());
        let custom = Contour::custom("square", vec![0, 1, 2, 3]);
        assert_eq!(custom.indices.len(), 4);
        assert_eq!(custom.fill, None);
        let tinted = custom.with_fill(Rgba::new(1, 2, 3, 0.5));
        assert_eq!(tinted.fill, Some(Rgba::new(1, 2, 3, 0.5)));
    }
}
