use crate::popup::{PopupContent, SlideKind};
use crate::viewport::{ContentSize, ContentStyle, Layout, Offset};

/// Display status of one slide or caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideStatus {
    Visible,
    Hidden,
}

impl SlideStatus {
    pub fn class_name(&self) -> &'static str {
        match self {
            SlideStatus::Visible => "visible",
            SlideStatus::Hidden => "hidden",
        }
    }
}

/// The rendered subtree of exactly one popup.
///
/// A carousel only ever talks to the surface it was bound to; implementations
/// must not reach into other popups. The previous/next arrows and the dots are
/// wired by the owner of the surface: arrow clicks dispatch to
/// `Carousel::previous`/`Carousel::next`, and a dot click calls
/// `Carousel::go_to` with its own position.
pub trait PopupSurface {
    fn slide_count(&self) -> usize;
    fn dot_count(&self) -> usize;
    fn set_slide_status(&mut self, index: usize, status: SlideStatus);
    fn set_dot_active(&mut self, index: usize, active: bool);

    /// Number of per-slide captions. Zero when the popup has none or a single static caption.
    fn caption_count(&self) -> usize {
        0
    }
    fn set_caption_status(&mut self, _index: usize, _status: SlideStatus) {}

    /// Current size of the content container, if it has been laid out.
    fn content_size(&self) -> Option<ContentSize>;
    fn apply_content_style(&mut self, style: &ContentStyle);
    fn set_offset(&mut self, offset: Offset);

    /// Removes the popup from the map.
    fn close(&mut self);
}

/// One element with a class list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    classes: Vec<String>,
}

impl Node {
    pub fn with_classes(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideNode {
    pub kind: SlideKind,
    pub src: String,
    pub node: Node,
}

/// In-memory popup subtree mirroring what `render_popup_html` produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupDom {
    pub slides: Vec<SlideNode>,
    pub dots: Vec<Node>,
    pub captions: Vec<Node>,
    pub container: Node,
    pub style: Option<ContentStyle>,
    pub measured: Option<ContentSize>,
    pub offset: Option<Offset>,
    pub open: bool,
}

impl PopupDom {
    pub fn from_content(content: &PopupContent) -> Self {
        let status = |i: usize| if i == 0 { "visible" } else { "hidden" };
        let slides = content
            .slides
            .iter()
            .enumerate()
            .map(|(i, slide)| SlideNode {
                kind: slide.kind,
                src: slide.src.clone(),
                node: Node::with_classes(&["carousel-img", status(i)]),
            })
            .collect();
        let dots = (0..content.slides.len())
            .map(|i| {
                if i == 0 {
                    Node::with_classes(&["dot", "active"])
                } else {
                    Node::with_classes(&["dot"])
                }
            })
            .collect();
        let captions = if content.has_slide_captions() {
            (0..content.captions.len())
                .map(|i| Node::with_classes(&["carousel-caption", status(i)]))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            slides,
            dots,
            captions,
            container: Node::with_classes(&["popup-content"]),
            style: None,
            measured: None,
            offset: None,
            open: true,
        }
    }

    /// Simulates layout reporting a size for the content container.
    pub fn with_measured_size(mut self, width: f64, height: f64) -> Self {
        self.measured = Some(ContentSize { width, height });
        self
    }

    pub fn visible_slides(&self) -> Vec<usize> {
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, s)| s.node.has_class("visible"))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn active_dots(&self) -> Vec<usize> {
        self.dots
            .iter()
            .enumerate()
            .filter(|(_, d)| d.has_class("active"))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn visible_captions(&self) -> Vec<usize> {
        self.captions
            .iter()
            .enumerate()
            .filter(|(_, c)| c.has_class("visible"))
            .map(|(i, _)| i)
            .collect()
    }
}

fn set_status(node: &mut Node, status: SlideStatus) {
    node.remove_class("visible");
    node.remove_class("hidden");
    node.add_class(status.class_name());
}

impl PopupSurface for PopupDom {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn dot_count(&self) -> usize {
        self.dots.len()
    }

    fn set_slide_status(&mut self, index: usize, status: SlideStatus) {
        if let Some(slide) = self.slides.get_mut(index) {
            set_status(&mut slide.node, status);
        }
    }

    fn set_dot_active(&mut self, index: usize, active: bool) {
        if let Some(dot) = self.dots.get_mut(index) {
            if active {
                dot.add_class("active");
            } else {
                dot.remove_class("active");
            }
        }
    }

    fn caption_count(&self) -> usize {
        self.captions.len()
    }

    fn set_caption_status(&mut self, index: usize, status: SlideStatus) {
        if let Some(caption) = self.captions.get_mut(index) {
            set_status(caption, status);
        }
    }

    fn content_size(&self) -> Option<ContentSize> {
        self.measured
    }

    fn apply_content_style(&mut self, style: &ContentStyle) {
        for layout in Layout::ALL {
            self.container.remove_class(layout.rule().class_name);
        }
        self.container.add_class(&style.class_name);
        self.style = Some(style.clone());
    }

    fn set_offset(&mut self, offset: Offset) {
        self.offset = Some(offset);
    }

    fn close(&mut self) {
        self.open = false;
    }
}
