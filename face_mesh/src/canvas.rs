use std::fmt::Display;
use std::str::FromStr;

use anyhow::{bail, Context};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

/// A CSS style colour with 8 bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

pub const LIPS_FILL: Rgba = Rgba::new(230, 92, 72, 0.2);

impl Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = anyhow::Error;

    /// Accepts `#rrggbb`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                bail!("Expected #rrggbb, found {s:?}");
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .with_context(|| format!("Invalid hex colour {s:?}"))
            };
            return Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, 1.0));
        }

        let (body, expected) = if let Some(body) = s.strip_prefix("rgba(") {
            (body, 4)
        } else if let Some(body) = s.strip_prefix("rgb(") {
            (body, 3)
        } else {
            bail!("Unsupported colour {s:?}");
        };
        let body = body
            .strip_suffix(')')
            .with_context(|| format!("Unterminated colour {s:?}"))?;
        let parts = body.split(',').map(str::trim).collect::<Vec<_>>();
        if parts.len() != expected {
            bail!("Expected {expected} colour components in {s:?}");
        }
        let channel = |i: usize| -> anyhow::Result<u8> {
            parts[i]
                .parse::<u8>()
                .with_context(|| format!("Invalid colour component {:?}", parts[i]))
        };
        let a = if expected == 4 {
            let a = parts[3]
                .parse::<f32>()
                .with_context(|| format!("Invalid alpha {:?}", parts[3]))?;
            if !(0.0..=1.0).contains(&a) {
                bail!("Alpha {a} outside 0..=1");
            }
            a
        } else {
            1.0
        };
        Ok(Rgba::new(channel(0)?, channel(1)?, channel(2)?, a))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// The subset of a 2D drawing context the renderer needs.
pub trait Canvas2d {
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32);
    fn close_path(&mut self);
    fn set_fill_style(&mut self, color: Rgba);
    fn set_line_width(&mut self, width: f32);
    fn fill(&mut self, rule: FillRule);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginPath,
    MoveTo(Point),
    QuadraticCurveTo { control: Point, end: Point },
    ClosePath,
    FillStyle(Rgba),
    LineWidth(f32),
    Fill(FillRule),
}

/// Canvas that keeps every call instead of painting.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fills(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill(_)))
            .count()
    }

    pub fn curves(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::QuadraticCurveTo { control, end } => Some((*control, *end)),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Canvas2d for RecordingCanvas {
    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::MoveTo(Point::new(x, y)));
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        self.commands.push(DrawCommand::QuadraticCurveTo {
            control: Point::new(cpx, cpy),
            end: Point::new(x, y),
        });
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn set_fill_style(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::FillStyle(color));
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn fill(&mut self, rule: FillRule) {
        self.commands.push(DrawCommand::Fill(rule));
    }
}
