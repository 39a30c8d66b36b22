/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;

/// Sources that are fetched remotely or already embedded.
const REMOTE_PREFIXES: [&str; 4] = ["http://", "https://", "//", "data:"];

static IMG_SRC: OnceLock<Regex> = OnceLock::new();

/// A local image referenced from the HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// The `src` attribute value exactly as written in the markup.
    pub original_src: String,
    pub path: PathBuf,
    pub filename: String,
    pub cid: String,
}

fn img_src_regex() -> &'static Regex {
    IMG_SRC.get_or_init(|| {
        Regex::new(r#"(?i)<img[^>]+src=["'](.*?)["']"#).expect("Invalid img regex")
    })
}

/// Returns every `src` value found inside an `<img>` tag, in document order.
pub fn img_sources(html: &str) -> impl Iterator<Item = &str> {
    img_src_regex()
        .captures_iter(html)
        .filter_map(|captures| captures.get(1))
        .map(|src| src.as_str())
}

pub fn is_remote(src: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|prefix| src.starts_with(prefix))
}

/// Resolves a local `src` against the directory holding the HTML file.
pub fn resolve(src: &str, html_dir: &Path) -> PathBuf {
    html_dir.join(src.trim_start_matches("./").trim_start_matches('/'))
}

/// Finds the local images an HTML document references.
///
/// Remote and `data:` sources are ignored, as are sources that do not
/// resolve to an existing file. A source repeated in several tags is
/// listed once. Content-IDs are `image0`, `image1`, ... in order of
/// first appearance.
pub fn discover_images(html: &str, html_dir: &Path) -> Vec<ImageRef> {
    let mut images: Vec<ImageRef> = Vec::new();

    for src in img_sources(html) {
        if is_remote(src) {
            log::debug!("Skipping remote image {src:?}");
            continue;
        }
        if images.iter().any(|image| image.original_src == src) {
            continue;
        }

        let path = resolve(src, html_dir);
        if !path.is_file() {
            log::debug!("Skipping image {src:?}: {} not found", path.display());
            continue;
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| src.to_string());
        images.push(ImageRef {
            original_src: src.to_string(),
            cid: format!("image{}", images.len()),
            path,
            filename,
        });
    }

    images
}

/// Points every `src="..."` or `src='...'` occurrence of each image at its
/// Content-ID. Everything else in the document is left untouched.
pub fn inline_images(html: &str, images: &[ImageRef]) -> String {
    images.iter().fold(html.to_string(), |html, image| {
        let cid_src = format!("src=\"cid:{}\"", image.cid);
        html.replace(&format!("src=\"{}\"", image.original_src), &cid_src)
            .replace(&format!("src='{}'", image.original_src), &cid_src)
    })
}
