pub mod storage;
pub mod types;

pub use storage::{clear_session, get_session_path, load_session, save_session};
pub use types::{Session, SESSION_VERSION};
