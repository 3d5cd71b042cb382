//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! - `TitleBar`: form title and status
//! - `ButtonBar`: submit/cancel buttons and key help
//! - `ModelInfo`: live document and error pane
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `FormView`: the field tree; owns focus and scrolling through
//!   `FormViewState` and turns key presses into `Action`s
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs         (this file)
//! ├── title_bar.rs   (top bar)
//! ├── form_view.rs   (scrollable field tree)
//! ├── button_bar.rs  (buttons and help)
//! └── model_info.rs  (document pane)
//! ```

mod button_bar;
mod form_view;
mod model_info;
mod title_bar;

pub use button_bar::ButtonBar;
pub use form_view::{FormView, FormViewState};
pub use model_info::ModelInfo;
pub use title_bar::TitleBar;
