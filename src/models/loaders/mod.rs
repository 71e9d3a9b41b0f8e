pub mod toml_loader;

pub use toml_loader::{load_all_drafts, load_form_draft, save_form_draft};
