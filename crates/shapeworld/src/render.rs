//! Rendering seam for slot objects and the builder menu.

use crate::selection::{Marker, SelectionController};
use shapeworld_core::{Configuration, MenuLayout, ObjectState, ShapeSkin, SlotId};

/// Draws one slot's object and returns a handle to what was drawn.
pub trait Renderer {
    /// Handle to the drawn object.
    type Handle;

    /// Renders `object` in `slot`.
    fn render(&mut self, slot: SlotId, object: &ObjectState) -> Self::Handle;
}

/// Renders all three slots in order.
pub fn render_configuration<R: Renderer>(renderer: &mut R, configuration: &Configuration) -> Vec<R::Handle> {
    configuration
        .iter()
        .map(|(slot, object)| renderer.render(slot, object))
        .collect()
}

/// Plain-text renderer used by the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer {
    skin: ShapeSkin,
}

impl TextRenderer {
    /// Creates a renderer using `skin` for shape names.
    pub fn new(skin: ShapeSkin) -> Self {
        Self { skin }
    }

    /// One-line description of an object.
    pub fn describe(&self, object: &ObjectState) -> String {
        format!(
            "{} shade {} {}",
            self.skin.label(object.shape),
            object.color,
            object.pattern
        )
    }

    /// Configuration with selection markers (`*` primary, `+` secondary).
    pub fn board(&mut self, configuration: &Configuration, selection: &SelectionController) -> String {
        render_configuration(self, configuration)
            .into_iter()
            .zip(configuration.iter())
            .map(|(line, (slot, _))| {
                let mark = match selection.marker(slot) {
                    Some(Marker::Primary) => "*",
                    Some(Marker::Secondary) => "+",
                    None => " ",
                };
                format!("{}{}", mark, line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Menu grid, one row per line.
    pub fn menu(&self, layout: &MenuLayout) -> String {
        layout
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|item| format!("{}:{}", item.id, self.describe(&item.object())))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Renderer for TextRenderer {
    type Handle = String;

    fn render(&mut self, slot: SlotId, object: &ObjectState) -> String {
        format!("[{}] {}", slot, self.describe(object))
    }
}
