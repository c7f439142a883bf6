pub mod date_range;
pub mod import_mode;
pub mod log_level;
pub mod order_status;
pub mod run;
pub mod units;

pub use date_range::DateRange;
pub use import_mode::ImportMode;
pub use log_level::LogLevel;
pub use order_status::{DeliveryStatus, OrderStatus, PayoutStatus};
pub use run::{RunStatus, RunTrigger, ScheduleRecurrence};
pub use units::{DimensionUnit, WeightUnit};
