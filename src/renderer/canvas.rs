//! Canvas 2D backend

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::draw::{DrawCmd, Shape};
use crate::scene::Viewport;

/// Night sky behind the scene
const BACKGROUND: &str = "#0b1026";

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    /// Match the backing store to the displayed size
    pub fn resize(&mut self, width: u32, height: u32) -> Viewport {
        self.canvas.set_width(width.max(1));
        self.canvas.set_height(height.max(1));
        self.viewport()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    pub fn render(&self, commands: &[DrawCmd]) {
        let viewport = self.viewport();
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx
            .fill_rect(0.0, 0.0, viewport.width as f64, viewport.height as f64);

        for cmd in commands {
            self.ctx.set_fill_style_str(&cmd.css_color());
            self.ctx.begin_path();
            match &cmd.shape {
                Shape::Circle { center, radius } => {
                    let _ = self.ctx.arc(
                        center.x as f64,
                        center.y as f64,
                        radius.max(0.0) as f64,
                        0.0,
                        TAU,
                    );
                }
                Shape::Polygon(points) => {
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    self.ctx.move_to(first.x as f64, first.y as f64);
                    for p in rest {
                        self.ctx.line_to(p.x as f64, p.y as f64);
                    }
                    self.ctx.close_path();
                }
            }
            self.ctx.fill();
        }
    }

    /// Small text overlay (FPS)
    pub fn overlay(&self, text: &str) {
        self.ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
        self.ctx.set_font("14px monospace");
        let _ = self.ctx.fill_text(text, 10.0, 20.0);
    }
}
