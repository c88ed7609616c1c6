pub mod constants;
pub mod crypto;
pub mod der;
pub mod preservation;
pub mod signature;
pub mod verification;
pub mod x509;
