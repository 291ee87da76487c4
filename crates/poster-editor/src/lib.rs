pub mod config;
pub mod debounce;
pub mod history;
pub mod input;
pub mod layers;
pub mod mutate;
pub mod selection;
pub mod session;
pub mod tools;
pub mod viewport;

pub use config::EditorConfig;
pub use history::{History, Snapshot};
pub use mutate::{ResizeHandle, ZOrderAction};
pub use selection::SelectedElement;
pub use session::{AddElement, EditorSession};
pub use tools::ToolKind;
pub use viewport::CanvasTransform;
