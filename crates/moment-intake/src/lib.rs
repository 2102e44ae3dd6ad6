pub mod compare;
pub mod identity;
pub mod phone;
pub mod sanitize;
