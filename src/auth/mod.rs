mod claims;
mod jwt;

pub use claims::{OperatorClaims, ADMIN_ROLE};
pub use jwt::JwtValidator;
