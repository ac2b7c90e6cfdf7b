pub mod coordinator;
pub mod dispatcher;
pub mod scheduler;
pub mod watermark;

pub use coordinator::{ScanCoordinator, ScanError, ScanReport};
pub use dispatcher::{DeliveryReport, DeliveryUnit, Dispatcher};
pub use scheduler::run_scheduler;
pub use watermark::Watermark;
