pub mod curry;
pub mod value;
