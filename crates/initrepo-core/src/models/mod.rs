pub mod check;
pub mod creation;
