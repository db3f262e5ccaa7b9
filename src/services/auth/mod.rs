pub mod authenticator;
pub mod jwt_cookie;
pub mod roles;

pub use authenticator::{Authenticator, Principal, Scheme, TokenError};
pub use jwt_cookie::{JwtCookieAuthenticator, SessionClaims, SessionPolicy};
pub use roles::{Role, has_authorized_role};
