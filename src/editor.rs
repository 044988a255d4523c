//! Application root: owns the design state, the control panel and the
//! composition last rendered from that state.

use crate::controls::{Control, ControlPanel, Widget};
use crate::rendering::html::{self, HtmlOptions};
use crate::rendering::{render, VisualTree};
use crate::state::DesignState;

#[derive(Debug, Clone)]
pub struct Editor {
    state: DesignState,
    panel: ControlPanel,
    tree: VisualTree,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(DesignState::default())
    }
}

impl Editor {
    pub fn new(state: DesignState) -> Self {
        let tree = render(&state);
        Self { state, panel: ControlPanel::new(), tree }
    }

    pub fn state(&self) -> &DesignState {
        &self.state
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    /// The composition currently on screen
    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    /// Apply one input event and re-render.
    pub fn apply(&mut self, control: Control) -> &VisualTree {
        log::trace!("control event {:?}", control);
        let next = self.panel.apply(&self.state, control);
        self.set_state(next)
    }

    /// Replace the whole design (e.g. a loaded document) and re-render.
    pub fn set_state(&mut self, state: DesignState) -> &VisualTree {
        if state != self.state {
            self.tree = render(&state);
            self.state = state;
        }
        &self.tree
    }

    pub fn begin_suggestions(&mut self) {
        self.panel.begin_suggestions();
    }

    pub fn finish_suggestions(&mut self, suggestions: Vec<String>) {
        self.panel.finish_suggestions(suggestions);
    }

    pub fn visible_widgets(&self) -> Vec<Widget> {
        self.panel.visible_widgets(&self.state)
    }

    /// The live preview as a standalone HTML document.
    pub fn preview_html(&self, opts: &HtmlOptions) -> String {
        html::to_document(&self.tree, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Layout;

    #[test]
    fn each_upload_embeds_its_own_file() -> crate::Result<()> {
        use crate::assets;
        use crate::controls::{image_upload, logo_upload};

        let dir = std::env::temp_dir().join(format!("iqtisad-uploads-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let first = dir.join("first.png");
        let second = dir.join("second.jpg");
        std::fs::write(&first, b"\x89PNG\r\n\x1a\nfirst")?;
        std::fs::write(&second, [0xff, 0xd8, 0xff, 0xe0, 2, 3])?;

        let mut editor = Editor::default();
        editor.apply(logo_upload(&first)?);
        let first_uri = editor.state().logo_url.clone().unwrap();
        assert_eq!(first_uri, assets::to_data_uri("image/png", &std::fs::read(&first)?));

        editor.apply(logo_upload(&second)?);
        let second_uri = editor.state().logo_url.clone().unwrap();
        assert_eq!(second_uri, assets::to_data_uri("image/jpeg", &std::fs::read(&second)?));
        assert_ne!(first_uri, second_uri);
        let badge = editor.tree().root.find_class("logo-badge-image").unwrap();
        assert_eq!(badge.get_attr("src"), Some(second_uri.as_str()));

        editor.apply(image_upload(&first)?);
        assert_eq!(editor.state().image_url.as_deref(), Some(first_uri.as_str()));

        assert!(image_upload(&dir.join("missing.png")).is_err());
        let _ = std::fs::remove_dir_all(&dir);
        Ok(())
    }

    #[test]
    fn edits_rerender_the_composition() {
        let mut editor = Editor::default();
        assert!(editor.tree().root.find_class("overlay-layout").is_some());
        editor.apply(Control::Layout(Layout::Split));
        assert!(editor.tree().root.find_class("split-layout").is_some());
        assert!(editor.tree().root.find_class("overlay-layout").is_none());
        assert_eq!(editor.state().layout, Layout::Split);
    }

    #[test]
    fn suggestion_selection_flows_into_headline() {
        let mut editor = Editor::default();
        editor.begin_suggestions();
        editor.finish_suggestions(vec!["الذهب يقفز".into()]);
        editor.apply(Control::SelectSuggestion(0));
        let headline = editor.tree().root.find_class("poster-headline").unwrap();
        assert_eq!(headline.text_content(), "الذهب يقفز");
    }

    #[test]
    fn preview_contains_headline() {
        let editor = Editor::default();
        let doc = editor.preview_html(&HtmlOptions::default());
        assert!(doc.contains(&editor.state().headline));
        assert!(doc.starts_with("<!DOCTYPE html>"));
    }
}
