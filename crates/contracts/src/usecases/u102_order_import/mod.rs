pub mod request;
pub mod response;

pub use request::OrderFetchRequest;
pub use response::{ImportStats, OrderAction, OrderOutcome};
