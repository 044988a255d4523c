//! Rendering pipeline for the poster composition.
//!
//! `render` turns a [`DesignState`](crate::state::DesignState) into a
//! [`VisualTree`]. From there the tree is either serialized as an HTML
//! preview document or styled, laid out, painted into an SVG scene and
//! rasterized to PNG.

pub mod compose;
pub mod html;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod style;
pub mod tree;

pub use compose::render;
pub use tree::{Element, Node, VisualTree};

use crate::Viewport;

/// Encoded PNG output of one rasterization.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Style, lay out and paint `tree`, producing an SVG document in CSS px.
pub fn svg_scene(tree: &VisualTree, viewport: Viewport) -> String {
    let styled = style::resolve(tree);
    let boxes = layout::layout_composition(&styled, viewport);
    let commands = paint::build_display_list(&styled, &boxes);
    log::trace!("{} layout boxes, {} paint commands", boxes.len(), commands.len());
    raster::scene_to_svg(&commands, viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DesignState, Layout};

    #[test]
    fn every_layout_produces_a_scene() {
        for layout in Layout::ALL {
            let tree = render(&DesignState { layout, ..Default::default() });
            let svg = svg_scene(&tree, Viewport { width: 540, height: 540 });
            assert!(svg.starts_with("<svg"));
            assert!(svg.contains("<text"));
        }
    }
}
