use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser};
use face_mesh::{
    configure,
    contours::{Contour, ContourLabel},
    detector::{DetectorConfig, DetectorOptions, SupportedModel},
    params::{VideoSize, DEFAULT_VIDEO_SIZE},
    path_utils::{input_path, output_path},
    draw_results, Environment, Face, ImageCanvas, RenderOptions, Rgba,
};
use tracing::{debug, info, warn};

mod flags;

const DEFAULT_BACKEND: &str = "tfjs-webgl";
const DEFAULT_FILL: &str = "rgba(230, 92, 72, 0.2)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = OverlayArgs::parse();
    debug!("Executing with args: {:?}", args);

    let detector = DetectorOptions::for_backend(args.model, &args.detector.config(), &args.backend)?;
    info!(
        "Detector {} on {} runtime (max faces {}, refine landmarks {})",
        detector.model, detector.runtime, detector.max_faces, detector.refine_landmarks
    );

    let mut env = Environment::with_default_backends();
    let flag_config = flags::collect(&args.flags, args.flags_json.as_deref())?;
    configure(&mut env, flag_config.as_ref(), &args.backend).await?;
    if let Some(backend) = env.active_backend() {
        info!("Active backend: {}", backend.name());
    }

    let faces = read_faces(&args.faces)?;
    info!("Loaded {} face(s) from {}", faces.len(), args.faces.display());
    let expected = args.detector.config().expected_keypoints();
    for (i, face) in faces.iter().enumerate() {
        if face.keypoints.len() < expected {
            warn!(
                "Face {i} has {} keypoints, the configured detector returns {expected}",
                face.keypoints.len()
            );
        }
    }

    let mut canvas = match &args.image {
        Some(path) => {
            let image = image::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            ImageCanvas::new(image.into_rgba8())
        }
        None => {
            let size = VideoSize::from_label(&args.size)?;
            ImageCanvas::blank(size.width, size.height)
        }
    };

    let options = RenderOptions {
        contours: args.contour_list(),
        fill: args.fill,
        strict: args.strict,
    };
    let drawn = draw_results(&mut canvas, &faces, &options)?;
    info!("Drew {drawn} contour(s)");

    save(canvas.into_image(), &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {}", args.output.display());
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "overlay", version, about, next_line_help = true)]
struct OverlayArgs {
    /// Backend to configure, as <runtime>-<backend>.
    #[arg(short, long, default_value = DEFAULT_BACKEND, env)]
    backend: String,

    /// Landmark model the detections came from.
    #[arg(short, long, default_value = "MediaPipeFaceMesh", env)]
    model: SupportedModel,

    /// Tunable backend flag, as NAME=VALUE. May be repeated.
    #[arg(long = "flag", value_name = "NAME=VALUE")]
    flags: Vec<String>,

    /// Tunable backend flags as a JSON object. Entries from --flag take precedence.
    #[arg(long, env)]
    flags_json: Option<String>,

    /// JSON array of detected faces, each with `keypoints` and `box`.
    #[arg(short, long, value_parser = input_path, env)]
    faces: PathBuf,

    /// Image to draw over. Without one a transparent canvas of --size is used.
    #[arg(short, long, value_parser = input_path)]
    image: Option<PathBuf>,

    /// Canvas size preset used when no image is given.
    #[arg(long, default_value = DEFAULT_VIDEO_SIZE)]
    size: String,

    /// Where to write the composited image.
    #[arg(short, long, value_parser = output_path)]
    output: PathBuf,

    /// Facial contours to draw.
    #[arg(short, long = "contour", default_value = "lips", value_delimiter = ',')]
    contours: Vec<ContourLabel>,

    /// Fill colour as #rrggbb, rgb(..) or rgba(..).
    #[arg(long, default_value = DEFAULT_FILL)]
    fill: Rgba,

    /// Fill each contour with its feature colour, keeping the alpha of --fill.
    #[arg(long)]
    label_colors: bool,

    /// Fail when a contour references a keypoint missing from a face.
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    detector: DetectorArgs,
}

#[derive(Args, Debug)]
struct DetectorArgs {
    /// The maximum number of faces the detector reports.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    max_faces: u16,

    /// Disable iris refinement (468 instead of 478 keypoints).
    #[arg(long)]
    no_refine_landmarks: bool,
}

impl OverlayArgs {
    fn contour_list(&self) -> Vec<Contour> {
        self.contours
            .iter()
            .map(|&label| {
                let contour = Contour::from(label);
                if self.label_colors {
                    contour.with_fill(label.color().with_alpha(self.fill.a))
                } else {
                    contour
                }
            })
            .collect()
    }
}

impl DetectorArgs {
    fn config(&self) -> DetectorConfig {
        DetectorConfig {
            max_faces: self.max_faces as usize,
            refine_landmarks: !self.no_refine_landmarks,
        }
    }
}

fn read_faces(path: &Path) -> anyhow::Result<Vec<Face>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse faces in {}", path.display()))
}

/// JPEG has no alpha channel, so those outputs are flattened to RGB first.
fn save(image: image::RgbaImage, path: &Path) -> anyhow::Result<()> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    if is_jpeg {
        image::DynamicImage::ImageRgba8(image).into_rgb8().save(path)?;
    } else {
        image.save(path)?;
    }
    Ok(())
}
