pub mod form_session;
pub mod session_registry;

pub use form_session::{FormSession, FormState};
pub use session_registry::SessionRegistry;
