pub mod session_authority;

pub use session_authority::{
    AccountStore, AuthenticatedSession, IssuedTokens, PgSessionAuthority, PgStore,
    SessionAuthority, TokenStore,
};
