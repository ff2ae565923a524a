pub mod adt;
pub mod descriptor;
pub mod monoid;
pub mod record;
pub mod union;
