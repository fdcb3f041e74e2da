pub mod loader;
pub mod model;

pub use loader::{load_or_init, load_or_init_at_path, save, save_at_path};
pub use model::{DialConfig, ListenMode};
