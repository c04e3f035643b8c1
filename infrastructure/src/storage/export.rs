//! Export renderers for stored comics

use flate2::Compression;
use flate2::write::GzEncoder;
use math_comic_domain::MultiPanelComic;
use std::fmt::Write as _;
use std::io;

pub(super) fn to_json(comic: &MultiPanelComic) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(comic)
}

/// Readable document; image links point at `image_prefix/<file_name>`
/// when a prefix is given, otherwise at the stored public URL
pub(super) fn to_markdown(comic: &MultiPanelComic, image_prefix: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", comic.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Topic:** {}", comic.topic);
    let _ = writeln!(out, "- **Age group:** {}", comic.options.age_group.as_str());
    let _ = writeln!(out, "- **Style:** {}", comic.options.style.as_str());
    let _ = writeln!(out, "- **Language:** {}", comic.options.language);
    let _ = writeln!(
        out,
        "- **Created:** {}",
        comic.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "- **ID:** `{}`", comic.id);

    for panel in &comic.panels {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Panel {}", panel.number);
        let _ = writeln!(out);

        let src = match image_prefix {
            Some(prefix) => format!("{}/{}", prefix, panel.image.file_name),
            None => panel.image.url.clone(),
        };
        let _ = writeln!(out, "![Panel {}]({})", panel.number, src);
        let _ = writeln!(out);
        let _ = writeln!(out, "*{}*", panel.content.image_description);

        if !panel.content.dialogue.is_empty() {
            let _ = writeln!(out);
            for line in &panel.content.dialogue {
                let _ = writeln!(out, "> {}", line);
            }
        }
        if let Some(narration) = &panel.content.narration {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", narration);
        }
    }

    out
}

/// tar.gz with `comic.json`, `comic.md` and `images/<file_name>` entries
pub(super) fn to_bundle(
    comic: &MultiPanelComic,
    images: &[(String, Vec<u8>)],
) -> io::Result<Vec<u8>> {
    let json = to_json(comic).map_err(io::Error::other)?;
    let markdown = to_markdown(comic, Some("images"));

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);

    append(&mut archive, "comic.json", &json)?;
    append(&mut archive, "comic.md", markdown.as_bytes())?;
    for (file_name, bytes) in images {
        append(&mut archive, &format!("images/{}", file_name), bytes)?;
    }

    archive.into_inner()?.finish()
}

fn append<W: io::Write>(archive: &mut tar::Builder<W>, name: &str, bytes: &[u8]) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    archive.append_data(&mut header, name, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use math_comic_domain::{
        ComicAssembler, ComicContent, ConceptValidator, ImageRef, OptionsProcessor, PanelContent,
    };
    use std::io::Read;

    fn comic() -> MultiPanelComic {
        let concept = ConceptValidator::default()
            .parse_math_concept("分数的认识")
            .unwrap();
        let options = OptionsProcessor::default().apply_defaults(None);
        let content = ComicContent {
            title: "Sharing a Pizza".to_string(),
            panels: (1..=options.panel_count)
                .map(|n| {
                    PanelContent::new(format!("scene {}", n))
                        .with_dialogue(format!("line {}", n))
                        .with_narration(format!("narration {}", n))
                })
                .collect(),
        };
        let images = (1..=options.panel_count)
            .map(|n| ImageRef {
                file_name: format!("panel_{:02}_x.png", n),
                url: format!("/images/panel_{:02}_x.png", n),
                path: format!("/data/images/panel_{:02}_x.png", n),
            })
            .collect();
        ComicAssembler::assemble(&concept, &options, content, images).unwrap()
    }

    #[test]
    fn test_markdown_lists_every_panel() {
        let comic = comic();
        let md = to_markdown(&comic, None);

        assert!(md.starts_with("# Sharing a Pizza\n"));
        assert!(md.contains("- **Topic:** 分数的认识"));
        for n in 1..=comic.panel_count() {
            assert!(md.contains(&format!("## Panel {}", n)));
            assert!(md.contains(&format!("(/images/panel_{:02}_x.png)", n)));
            assert!(md.contains(&format!("> line {}", n)));
        }
    }

    #[test]
    fn test_bundle_contains_json_markdown_and_images() {
        let comic = comic();
        let images = vec![("panel_01_x.png".to_string(), vec![7u8; 10])];
        let bytes = to_bundle(&comic, &images).unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(bytes.as_slice()));
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            if name == "comic.json" {
                let mut text = String::new();
                entry.read_to_string(&mut text).unwrap();
                let back: MultiPanelComic = serde_json::from_str(&text).unwrap();
                assert_eq!(back, comic);
            }
            if name == "comic.md" {
                let mut text = String::new();
                entry.read_to_string(&mut text).unwrap();
                assert!(text.contains("(images/panel_01_x.png)"));
            }
            names.push(name);
        }
        assert_eq!(names, vec!["comic.json", "comic.md", "images/panel_01_x.png"]);
    }
}
