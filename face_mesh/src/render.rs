use tracing::trace;

use crate::canvas::{Canvas2d, FillRule, Point, Rgba, LIPS_FILL};
use crate::contours::{Contour, ContourLabel};
use crate::error::RenderError;
use crate::Face;

pub const CONTOUR_LINE_WIDTH: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Contours drawn for every face, in order.
    pub contours: Vec<Contour>,
    /// Used for contours without their own fill.
    pub fill: Rgba,
    /// Fail on a contour that references a keypoint the detector did not
    /// return instead of silently skipping it.
    pub strict: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            contours: vec![ContourLabel::Lips.into()],
            fill: LIPS_FILL,
            strict: false,
        }
    }
}

/// Draws `points` as one closed, smoothed region filled with the even-odd rule.
///
/// Each curve runs from the current point with the previous keypoint as its
/// control point and the midpoint of the previous and current keypoints as its
/// end. The last two keypoints never start a curve; closing the path joins the
/// final curve back to the first point. Fewer than three points emit no curves.
pub fn draw_path<C: Canvas2d + ?Sized>(ctx: &mut C, points: &[Point], fill: Rgba) {
    let Some(first) = points.first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for i in 1..points.len().saturating_sub(2) {
        let prev = points[i - 1];
        let mid = prev.midpoint(&points[i]);
        ctx.quadratic_curve_to(prev.x, prev.y, mid.x, mid.y);
    }
    ctx.close_path();
    ctx.set_fill_style(fill);
    ctx.fill(FillRule::EvenOdd);
}

/// Draws the configured contours of every face. Returns how many were drawn.
///
/// A contour referencing a keypoint beyond the face's keypoint list is skipped
/// for that face, or reported as [`RenderError::MissingKeypoint`] when
/// `options.strict` is set. Strict mode checks every face before drawing, so a
/// miss anywhere leaves the canvas untouched.
pub fn draw_results<C: Canvas2d + ?Sized>(
    ctx: &mut C,
    faces: &[Face],
    options: &RenderOptions,
) -> Result<usize, RenderError> {
    if options.strict {
        check_complete(faces, &options.contours)?;
    }
    let mut drawn = 0;
    for (face_idx, face) in faces.iter().enumerate() {
        let keypoints = face.points();
        for contour in &options.contours {
            let Some(path) = contour
                .indices
                .iter()
                .map(|&i| keypoints.get(i).copied())
                .collect::<Option<Vec<Point>>>()
            else {
                trace!("Skipping {} on face {face_idx}: keypoint missing", contour.label);
                continue;
            };
            ctx.set_line_width(CONTOUR_LINE_WIDTH);
            draw_path(&mut *ctx, &path, contour.fill.unwrap_or(options.fill));
            drawn += 1;
        }
    }
    Ok(drawn)
}

fn check_complete(faces: &[Face], contours: &[Contour]) -> Result<(), RenderError> {
    for (face_idx, face) in faces.iter().enumerate() {
        for contour in contours {
            if let Some(&index) = contour
                .indices
                .iter()
                .find(|&&i| i >= face.keypoints.len())
            {
                return Err(RenderError::MissingKeypoint {
                    face: face_idx,
                    contour: contour.label.to_string(),
                    index,
                });
            }
        }
    }
    Ok(())
}
