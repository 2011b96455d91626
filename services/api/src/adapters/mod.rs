pub mod db;
pub mod fcm;
pub mod jwt;
pub mod password;

pub use db::DbAdapter;
pub use fcm::FcmGateway;
pub use jwt::{Claims, JwtAdapter, JwtError};
pub use password::Argon2Hasher;
