pub mod document;
pub mod emitter;
pub mod hit;
pub mod host;
pub mod id;
pub mod layout;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod style;

pub use document::PosterDocument;
pub use emitter::{EDITOR_STYLES_ID, emit_document, emit_fragment};
pub use host::DocumentHost;
pub use id::NodeId;
pub use layout::{Viewport, resolve_layout};
pub use model::*;
pub use parser::parse_document;
pub use style::{ComputedStyle, InlineStyle, PositionMode, Stylesheet, format_px, parse_int, parse_px};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
