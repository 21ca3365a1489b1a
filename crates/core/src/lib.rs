pub mod config;
pub mod error;
pub mod paths;
pub mod session;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use paths::Paths;
pub use session::{Field, Selections, SessionState, SessionUpdate};
pub use types::{CaptchaImage, Complex, Credential, District};
