use face_mesh::canvas::DrawCommand;
use face_mesh::detector::{DetectorConfig, DetectorOptions, SupportedModel};
use face_mesh::params::NUM_KEYPOINTS;
use face_mesh::*;
use serde_json::json;

#[tokio::test]
async fn webgl_pack_is_visible_on_active_backend() {
    let mut env = Environment::with_default_backends();
    let flags = json!({ "WEBGL_PACK": false });
    configure(&mut env, Some(&flags), "tfjs-webgl").await.unwrap();

    assert_eq!(env.flags().get_bool("WEBGL_PACK"), Some(false));
    assert_eq!(env.backend_name(), Some("webgl"));
    let backend = env.active_backend().unwrap();
    assert_eq!(backend.flag("WEBGL_PACK"), Some(FlagValue::Bool(false)));
}

#[test]
fn square_lips_render_closed_fill() {
    let faces: Vec<Face> = serde_json::from_value(json!([{
        "keypoints": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 10}, {"x": 0, "y": 10}],
        "box": {"xMin": 0, "yMin": 0, "xMax": 10, "yMax": 10}
    }]))
    .unwrap();
    let options = RenderOptions {
        contours: vec![Contour::custom("lips", vec![0, 1, 2, 3])],
        ..Default::default()
    };

    let mut canvas = RecordingCanvas::new();
    assert_eq!(draw_results(&mut canvas, &faces, &options), Ok(1));

    let curves = canvas.curves().count();
    assert_eq!(curves, 1);
    let tail = &canvas.commands[canvas.commands.len() - 3..];
    assert_eq!(
        tail,
        &[
            DrawCommand::ClosePath,
            DrawCommand::FillStyle(canvas::LIPS_FILL),
            DrawCommand::Fill(FillRule::EvenOdd),
        ]
    );
}

#[tokio::test]
async fn configured_session_paints_lips_onto_image() {
    let backend = "tfjs-webgl";
    let detector = DetectorOptions::for_backend(
        SupportedModel::MediaPipeFaceMesh,
        &DetectorConfig::default(),
        backend,
    )
    .unwrap();
    assert_eq!(detector.runtime, "tfjs");

    let mut env = Environment::with_default_backends();
    let flags = json!({ "WEBGL_VERSION": 2, "WEBGL_CPU_FORWARD": false });
    configure(&mut env, Some(&flags), backend).await.unwrap();

    // a mesh whose lip ring is a circle around (50, 50) and everything else at the origin
    let mut keypoints = vec![Keypoint::new(0.0, 0.0); NUM_KEYPOINTS];
    let lips = ContourLabel::Lips.indices();
    for (n, &index) in lips.iter().enumerate() {
        let a = n as f32 * std::f32::consts::TAU / lips.len() as f32;
        keypoints[index] = Keypoint::new(50.0 + 30.0 * a.cos(), 50.0 + 30.0 * a.sin());
    }
    let face = Face {
        keypoints,
        bounding_box: BoundingBox {
            x_min: 20.0,
            y_min: 20.0,
            x_max: 80.0,
            y_max: 80.0,
        },
    };

    let mut canvas = ImageCanvas::blank(100, 100);
    let drawn = draw_results(&mut canvas, &[face], &RenderOptions::default()).unwrap();
    assert_eq!(drawn, 1);

    let image = canvas.into_image();
    let painted = image.pixels().filter(|p| p.0[3] > 0).count();
    assert!(painted > 0);
    assert_eq!(image.get_pixel(95, 95).0, [0, 0, 0, 0]);
}
