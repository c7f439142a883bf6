pub mod aggregate;

pub use aggregate::{Address, OrderNote, SalesOrder, SalesOrderId, SalesOrderItem};
