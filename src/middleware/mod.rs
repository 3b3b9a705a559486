// Middleware modules
pub mod account;
pub mod logging;

pub use account::{account_identity_middleware, AccountIdentity, ACCOUNT_ID_HEADER};
pub use logging::logging_middleware;
