use std::fs;
use std::path::PathBuf;

use iqtisad_canvas::rendering::layout::layout_composition;
use iqtisad_canvas::rendering::paint::{build_display_list, PaintCommand};
use iqtisad_canvas::rendering::style::resolve;
use iqtisad_canvas::rendering::svg_scene;
use iqtisad_canvas::{render, DesignState, Layout, Viewport};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn check_golden(name: &str, actual: &str) {
    let expected_path = golden_path(name);
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, actual).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    assert!(
        expected_path.exists(),
        "no golden at {:?}; run with UPDATE_GOLDENS=1 to create it",
        expected_path
    );

    let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(actual, exp.trim(), "golden mismatch for {}", name);
}

fn sample_state(layout: Layout) -> DesignState {
    DesignState {
        layout,
        headline: "البنك المركزي يرفع أسعار الفائدة للمرة الثالثة".into(),
        category: "اقتصاد".into(),
        source: "وكالة الأنباء".into(),
        image_url: Some("data:image/png;base64,iVBORw0KGgo=".into()),
        ..Default::default()
    }
}

#[test]
fn golden_tree_fingerprints() {
    for layout in Layout::ALL {
        let tree = render(&sample_state(layout));
        check_golden(&format!("tree-{}.sha256", layout.as_str()), &tree.fingerprint());
    }
}

/// One line per paint command: kind, colors, sizes and text, without
/// coordinates.
fn scene_outline(state: &DesignState, view: Viewport) -> String {
    let tree = render(state);
    let styled = resolve(&tree);
    let nodes = layout_composition(&styled, view);
    build_display_list(&styled, &nodes)
        .iter()
        .map(|cmd| match cmd {
            PaintCommand::SolidRect { color, radius, .. } => {
                format!("rect {}/{:.2} r{:.0}", color.hex(), color.a, radius)
            }
            PaintCommand::GradientRect { stops, .. } => {
                let stops: Vec<String> = stops
                    .iter()
                    .map(|s| format!("{}/{:.2}@{:.0}", s.color.hex(), s.color.a, s.offset * 100.0))
                    .collect();
                format!("gradient {}", stops.join(" "))
            }
            PaintCommand::Image { cover, filter, radius, .. } => {
                let fit = if *cover { "cover" } else { "contain" };
                let filter = match filter {
                    Some(f) => format!("b{:.2} c{:.2}", f.brightness, f.contrast),
                    None => "nofilter".to_string(),
                };
                format!("image {} {} r{:.0}", fit, filter, radius)
            }
            PaintCommand::Text { lines, font_size, font_weight, color, anchor, stroke, .. } => {
                let stroke = (*stroke)
                    .map(|(w, c)| format!(" stroke{:.0}{}", w, c.hex()))
                    .unwrap_or_default();
                format!("text {:.0} {:?} {} {}{} {}", font_size, anchor, color.hex(), font_weight, stroke, lines.join(" "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn golden_scene_outlines() {
    let view = Viewport { width: 540, height: 540 };
    for layout in Layout::ALL {
        let outline = scene_outline(&sample_state(layout), view);
        check_golden(&format!("scene-{}.txt", layout.as_str()), &outline);
    }
}

#[test]
fn scene_is_deterministic() {
    let view = Viewport { width: 540, height: 540 };
    for layout in Layout::ALL {
        let state = sample_state(layout);
        assert_eq!(svg_scene(&render(&state), view), svg_scene(&render(&state), view));
    }
}

#[test]
fn render_is_deterministic() {
    for layout in Layout::ALL {
        let state = sample_state(layout);
        let a = render(&state);
        let b = render(&state);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}

#[test]
fn fingerprint_tracks_state() {
    let a = render(&DesignState::default());
    let b = render(&DesignState { overlay_opacity: 0.71, ..Default::default() });
    assert_ne!(a.fingerprint(), b.fingerprint());
}
