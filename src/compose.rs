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

use std::path::Path;

use mail_builder::{headers::content_type::ContentType, mime::MimePart, MessageBuilder};

use crate::{
    html::{discover_images, inline_images, ImageRef},
    smtp::message::{IntoMessage, Message},
};

/// An image part referenced from the HTML body by Content-ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub cid: String,
    pub filename: String,
    pub content_type: &'static str,
    pub contents: Vec<u8>,
}

/// An HTML document with its local images embedded.
///
/// The rewritten markup only lives here; the file on disk is never modified.
#[derive(Debug, Clone, Default)]
pub struct HtmlEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub images: Vec<InlineImage>,
}

impl HtmlEmail {
    /// Reads an HTML file and embeds the images it references.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(crate::Error::HtmlNotFound(path.to_path_buf()));
        }

        let html = std::fs::read_to_string(path)?;
        let html_dir = path.parent().unwrap_or_else(|| Path::new(""));
        HtmlEmail::from_html(&html, html_dir)
    }

    /// Embeds the images of `html`, resolving relative sources against `html_dir`.
    pub fn from_html(html: &str, html_dir: &Path) -> crate::Result<Self> {
        let images = discover_images(html, html_dir);
        let html = inline_images(html, &images);

        Ok(HtmlEmail {
            html,
            images: images
                .into_iter()
                .map(InlineImage::read)
                .collect::<crate::Result<Vec<_>>>()?,
            ..Default::default()
        })
    }

    /// Set the sender of the message.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Set the message recipient.
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    /// Set the message subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Builds the MIME tree:
    ///
    /// ```text
    /// multipart/related
    /// ├── multipart/alternative
    /// │   └── text/html
    /// └── image/* (inline, Content-ID), one per embedded image
    /// ```
    pub fn message_builder(&self) -> MessageBuilder<'_> {
        let mut parts = vec![MimePart::new(
            "multipart/alternative",
            vec![MimePart::new("text/html", self.html.as_str())],
        )];
        parts.extend(self.images.iter().map(|image| {
            MimePart::new(image.content_type, image.contents.as_slice())
                .cid(image.cid.as_str())
                .header(
                    "Content-Disposition",
                    ContentType::new("inline").attribute("filename", image.filename.as_str()),
                )
        }));

        MessageBuilder::new()
            .from(self.from.as_str())
            .to(self.to.as_str())
            .subject(self.subject.as_str())
            .body(MimePart::new("multipart/related", parts))
    }

    /// Renders the message as RFC 5322 bytes.
    pub fn write_to_vec(&self) -> crate::Result<Vec<u8>> {
        Ok(self.message_builder().write_to_vec()?)
    }
}

impl<'x> IntoMessage<'x> for &HtmlEmail {
    fn into_message(self) -> crate::Result<Message<'x>> {
        Message::new(self.from.clone(), [self.to.clone()], self.write_to_vec()?).into_message()
    }
}

impl InlineImage {
    fn read(image: ImageRef) -> crate::Result<Self> {
        let contents = std::fs::read(&image.path).map_err(|error| crate::Error::ImageRead {
            path: image.path.clone(),
            error,
        })?;

        Ok(InlineImage {
            content_type: content_type(&image.path),
            cid: image.cid,
            filename: image.filename,
            contents,
        })
    }
}

/// MIME type for an image, guessed from its file extension.
pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg" | "jpe") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("tif" | "tiff") => "image/tiff",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use mail_parser::{MessageParser, MimeHeaders};

    use crate::smtp::message::IntoMessage;

    use super::{content_type, HtmlEmail};

    const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn write_site(html: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), PNG).unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, html).unwrap();
        (dir, path)
    }

    #[test]
    fn embed_local_image() {
        let (_dir, path) = write_site("<html><body><img src=\"./logo.png\"></body></html>");
        let email = HtmlEmail::from_file(&path)
            .unwrap()
            .from("john@gmail.com")
            .to("jane@example.com")
            .subject("Logo test");

        assert_eq!(email.images.len(), 1);
        assert_eq!(email.images[0].cid, "image0");
        assert_eq!(email.images[0].filename, "logo.png");
        assert_eq!(email.images[0].content_type, "image/png");
        assert_eq!(
            email.html,
            "<html><body><img src=\"cid:image0\"></body></html>"
        );

        // The file on disk is left untouched
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<html><body><img src=\"./logo.png\"></body></html>"
        );

        let raw = email.write_to_vec().unwrap();
        let message = MessageParser::default().parse(&raw).unwrap();
        assert_eq!(message.subject(), Some("Logo test"));

        let root = message.parts[0].content_type().unwrap();
        assert_eq!(root.ctype(), "multipart");
        assert_eq!(root.subtype(), Some("related"));

        let html = message.body_html(0).unwrap();
        assert!(html.contains("src=\"cid:image0\""));
        assert!(!html.contains("logo.png"));

        let images = message
            .parts
            .iter()
            .filter(|part| part.content_type().is_some_and(|ct| ct.ctype() == "image"))
            .collect::<Vec<_>>();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].content_id(), Some("image0"));
        assert_eq!(images[0].attachment_name(), Some("logo.png"));
        assert_eq!(
            images[0].content_disposition().map(|cd| cd.ctype()),
            Some("inline")
        );
        assert_eq!(images[0].contents(), PNG.as_slice());
    }

    #[test]
    fn remote_image_is_not_embedded() {
        let source = "<p><img src=\"https://example.com/x.png\"></p>";
        let (_dir, path) = write_site(source);
        let email = HtmlEmail::from_file(&path)
            .unwrap()
            .from("john@gmail.com")
            .to("jane@example.com")
            .subject("Remote");

        assert!(email.images.is_empty());
        assert_eq!(email.html, source);

        let raw = email.write_to_vec().unwrap();
        let message = MessageParser::default().parse(&raw).unwrap();
        assert!(!message
            .parts
            .iter()
            .any(|part| part.content_type().is_some_and(|ct| ct.ctype() == "image")));
        assert_eq!(message.body_html(0).unwrap(), source);
    }

    #[test]
    fn missing_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.html");
        assert!(matches!(
            HtmlEmail::from_file(&path),
            Err(crate::Error::HtmlNotFound(missing)) if missing == path
        ));
    }

    #[test]
    fn envelope_from_headers() {
        let (_dir, path) = write_site("<img src='logo.png'>");
        let email = HtmlEmail::from_file(&path)
            .unwrap()
            .from("john@gmail.com")
            .to("jane@example.com")
            .subject("Envelope");

        let message = (&email).into_message().unwrap();
        assert_eq!(message.mail_from, "john@gmail.com");
        assert_eq!(message.rcpt_to.len(), 1);
        assert_eq!(message.rcpt_to[0], "jane@example.com");
        assert!(!message.body.is_empty());

        assert!(matches!(
            (&HtmlEmail::from_html("<p>hi</p>", Path::new(".")).unwrap()).into_message(),
            Err(crate::Error::MissingMailFrom)
        ));
    }

    #[test]
    fn image_content_types() {
        for (file, expected) in [
            ("a.png", "image/png"),
            ("a.JPG", "image/jpeg"),
            ("a.jpeg", "image/jpeg"),
            ("a.gif", "image/gif"),
            ("a.svg", "image/svg+xml"),
            ("a.webp", "image/webp"),
            ("a.heic", "application/octet-stream"),
            ("noextension", "application/octet-stream"),
        ] {
            assert_eq!(content_type(Path::new(file)), expected, "{file}");
        }
    }
}
