pub mod initialization;
pub mod sync;
