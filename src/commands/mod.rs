pub mod check;
pub mod typing;
