//! Render composition.
//!
//! Every flow describes what it wants drawn this frame as a [`Render`]. The
//! engine opens one render pass per frame (cleared to the context's clear
//! colour, with depth) and hands it to each flow's render in order.

use crate::context::Context;

/// A closure that records draw calls into the frame's render pass.
pub type DrawFn<'a> = Box<dyn FnOnce(&Context, &mut wgpu::RenderPass<'_>) + 'a>;

/// Specifies how a flow should be rendered.
///
/// - `None` renders nothing
/// - `Custom` records its own draw calls, including pipeline and bind group setup
pub enum Render<'a> {
    None,
    Custom(DrawFn<'a>),
}

impl<'a> Render<'a> {
    pub fn custom<F>(draw: F) -> Self
    where
        F: FnOnce(&Context, &mut wgpu::RenderPass<'_>) + 'a,
    {
        Self::Custom(Box::new(draw))
    }

    pub fn draw(self, ctx: &Context, pass: &mut wgpu::RenderPass<'_>) {
        match self {
            Render::None => (),
            Render::Custom(draw) => draw(ctx, pass),
        }
    }
}
