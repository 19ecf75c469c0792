use serde::{Deserialize, Serialize};

/// Media type of a carousel slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Image,
    Video,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub kind: SlideKind,
    pub src: String,
}

impl Slide {
    /// Classifies a media URL by its extension, ignoring any query string or fragment.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        let kind = if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            SlideKind::Video
        } else {
            SlideKind::Image
        };
        Self {
            kind,
            src: url.to_string(),
        }
    }
}

/// Everything a marker popup shows: authored slides in order plus captions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopupContent {
    pub title: String,
    pub slides: Vec<Slide>,
    pub captions: Vec<String>,
}

impl PopupContent {
    pub fn new(title: impl Into<String>, images: &[String], captions: &[String]) -> Self {
        Self {
            title: title.into(),
            slides: images.iter().map(|url| Slide::from_url(url)).collect(),
            captions: captions.to_vec(),
        }
    }

    /// Popups without slides never get a carousel.
    pub fn has_carousel(&self) -> bool {
        !self.slides.is_empty()
    }

    /// One caption per slide switches along with the slides.
    pub fn has_slide_captions(&self) -> bool {
        self.captions.len() > 1 && self.captions.len() == self.slides.len()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn status(index: usize) -> &'static str {
    if index == 0 {
        "visible"
    } else {
        "hidden"
    }
}

fn slides_html(slides: &[Slide]) -> String {
    slides
        .iter()
        .enumerate()
        .map(|(i, slide)| match slide.kind {
            SlideKind::Video => format!(
                r#"<video controls class="carousel-img object-cover {}"><source src="{}" type="video/mp4">Your browser does not support the video tag.</video>"#,
                status(i),
                escape(&slide.src)
            ),
            SlideKind::Image => format!(
                r#"<img src="{}" class="carousel-img {}"/>"#,
                escape(&slide.src),
                status(i)
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn dots_html(count: usize) -> String {
    (0..count)
        .map(|i| {
            if i == 0 {
                r#"<span class="dot active"></span>"#
            } else {
                r#"<span class="dot"></span>"#
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn captions_html(content: &PopupContent) -> String {
    if content.has_slide_captions() {
        let captions = content
            .captions
            .iter()
            .enumerate()
            .map(|(i, caption)| {
                format!(r#"<p class="carousel-caption {}">{}</p>"#, status(i), escape(caption))
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(r#"<div class="carousel-captions">{}</div>"#, captions)
    } else if let Some(caption) = content.captions.first() {
        format!(r#"<p class="carousel-caption">{}</p>"#, escape(caption))
    } else {
        String::new()
    }
}

/// Renders the popup subtree: slides (first visible), arrows, dots (first active) and captions.
pub fn render_popup_html(content: &PopupContent) -> String {
    format!(
        r#"<div class="popup">
    <h3 class="popup-title">{title}</h3>
    <div class="carousel-container">
        <div class="carousel-imgs">
{slides}
        </div>
        <a class="prev arrow">&#10094;</a>
        <a class="next arrow">&#10095;</a>
        <div class="slide-numbers">
{dots}
        </div>
    </div>
    {captions}
</div>"#,
        title = escape(&content.title),
        slides = slides_html(&content.slides),
        dots = dots_html(content.slides.len()),
        captions = captions_html(content),
    )
}
