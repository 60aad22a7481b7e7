//! Message rendering.
//!
//! Rendering is split in two.  [`render`] is a pure function from a session to
//! an ordered list of [`DisplayNode`] descriptors; a [`Surface`] draws those
//! descriptors somewhere.  [`TerminalSurface`] draws them with ANSI styling,
//! [`BufferSurface`] just records them.

use std::io::{self, Stdout, Write};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Message, MessageKind, Role};

use super::session::Session;

/// Shown in place of an empty session.
pub const PLACEHOLDER_TEXT: &str = "Start a conversation by typing a message below.";

/// Display width limit for image nodes, in pixels.
pub const IMAGE_MAX_WIDTH: u32 = 300;

/// ANSI escape code for bold text (used for strong spans).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code that ends bold.
const ANSI_NO_BOLD: &str = "\x1b[22m";

/// ANSI escape code for dim text (used for the placeholder and images).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for emphasis spans).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code that ends italic.
const ANSI_NO_ITALIC: &str = "\x1b[23m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the bot label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI sequence that clears the screen and homes the cursor.
const ANSI_CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("strong pattern is valid"));

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.*?)_").expect("emphasis pattern is valid"));

/// Turn bot text into safe markup.
///
/// `&`, `<` and `>` are escaped first so nothing in the input can become a
/// live tag.  Then `**x**` becomes `<strong>x</strong>`, `_x_` becomes
/// `<em>x</em>`, and each newline becomes `<br>`.
pub fn format_markup(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    let strong = STRONG.replace_all(&escaped, "<strong>$1</strong>");
    let emphasis = EMPHASIS.replace_all(&strong, "<em>$1</em>");
    emphasis.replace('\n', "<br>")
}

/// The content of a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBody {
    /// Shown exactly as typed.
    Literal(String),
    /// Output of [`format_markup`].
    Markup(String),
}

/// One thing to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayNode {
    /// Stands in for an empty session.
    Placeholder(String),
    /// A text message.
    Text { role: Role, body: TextBody },
    /// An image message; `src` is a `data:` URI.
    Image {
        role: Role,
        src: String,
        max_width: u32,
    },
}

impl DisplayNode {
    fn from_message(message: &Message) -> Self {
        match message.kind {
            MessageKind::Image => DisplayNode::Image {
                role: message.role,
                src: message.content.clone(),
                max_width: IMAGE_MAX_WIDTH,
            },
            MessageKind::Text => {
                let body = match message.role {
                    Role::User => TextBody::Literal(message.content.clone()),
                    Role::Bot => TextBody::Markup(format_markup(&message.content)),
                };
                DisplayNode::Text {
                    role: message.role,
                    body,
                }
            }
        }
    }
}

/// Describe `session` as display nodes, one per message in order.
pub fn render(session: &Session) -> Vec<DisplayNode> {
    if session.is_empty() {
        return vec![DisplayNode::Placeholder(PLACEHOLDER_TEXT.to_string())];
    }
    session
        .messages()
        .iter()
        .map(DisplayNode::from_message)
        .collect()
}

/// Somewhere display nodes can be drawn.
pub trait Surface {
    /// Remove everything drawn so far.
    fn clear(&mut self);

    /// Draw one node after the ones already drawn.
    fn append(&mut self, node: &DisplayNode);

    /// Bring the most recent node into view.
    fn scroll_to_bottom(&mut self);
}

/// Redraw `session` on `surface` from scratch.
///
/// Drawing the same session twice leaves the surface showing the same nodes
/// once.
pub fn draw(session: &Session, surface: &mut dyn Surface) {
    surface.clear();
    for node in render(session) {
        surface.append(&node);
    }
    surface.scroll_to_bottom();
}

/// A surface that keeps the nodes it is given.
#[derive(Debug, Default, Clone)]
pub struct BufferSurface {
    nodes: Vec<DisplayNode>,
    scrolls: usize,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The nodes currently drawn.
    pub fn nodes(&self) -> &[DisplayNode] {
        &self.nodes
    }

    /// How many times the surface was scrolled.
    pub fn scrolls(&self) -> usize {
        self.scrolls
    }
}

impl Surface for BufferSurface {
    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn append(&mut self, node: &DisplayNode) {
        self.nodes.push(node.clone());
    }

    fn scroll_to_bottom(&mut self) {
        self.scrolls += 1;
    }
}

/// Draws nodes as terminal text with optional ANSI styling.
pub struct TerminalSurface<W: Write = Stdout> {
    out: W,
    use_color: bool,
}

impl TerminalSurface<Stdout> {
    /// Creates a TerminalSurface on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a TerminalSurface on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            out: io::stdout(),
            use_color,
        }
    }
}

impl Default for TerminalSurface<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Creates a TerminalSurface on an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Consume the surface and return its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(&self, role: Role) -> String {
        let (name, color) = match role {
            Role::User => ("you", ANSI_CYAN),
            Role::Bot => ("gemini", ANSI_GREEN),
        };
        if self.use_color {
            format!("{color}{name}>{ANSI_RESET} ")
        } else {
            format!("{name}> ")
        }
    }

    fn markup_to_terminal(&self, markup: &str) -> String {
        let (strong, end_strong, em, end_em) = if self.use_color {
            (ANSI_BOLD, ANSI_NO_BOLD, ANSI_ITALIC, ANSI_NO_ITALIC)
        } else {
            ("", "", "", "")
        };
        markup
            .replace("<br>", "\n")
            .replace("<strong>", strong)
            .replace("</strong>", end_strong)
            .replace("<em>", em)
            .replace("</em>", end_em)
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn clear(&mut self) {
        if self.use_color {
            let _ = write!(self.out, "{ANSI_CLEAR_SCREEN}");
        } else {
            let _ = writeln!(self.out);
        }
    }

    fn append(&mut self, node: &DisplayNode) {
        let line = match node {
            DisplayNode::Placeholder(text) if self.use_color => {
                format!("{ANSI_DIM}{text}{ANSI_RESET}")
            }
            DisplayNode::Placeholder(text) => text.clone(),
            DisplayNode::Text { role, body } => {
                let text = match body {
                    TextBody::Literal(text) => text.clone(),
                    TextBody::Markup(markup) => self.markup_to_terminal(markup),
                };
                format!("{}{text}", self.label(*role))
            }
            DisplayNode::Image {
                role,
                src,
                max_width,
            } => {
                let described = describe_image(src, *max_width);
                if self.use_color {
                    format!("{}{ANSI_DIM}{described}{ANSI_RESET}", self.label(*role))
                } else {
                    format!("{}{described}", self.label(*role))
                }
            }
        };
        let _ = writeln!(self.out, "{line}");
    }

    fn scroll_to_bottom(&mut self) {
        let _ = self.out.flush();
    }
}

fn describe_image(src: &str, max_width: u32) -> String {
    let mime = src
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or("image");
    let payload = src.split_once(',').map(|(_, p)| p.len()).unwrap_or(0);
    // Base64 carries three bytes per four characters.
    let bytes = payload / 4 * 3;
    format!("[{mime}, ~{bytes} bytes, {max_width}px wide]")
}
