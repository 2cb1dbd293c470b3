pub mod delivery;
pub mod policy;
pub mod reducer;
pub mod status;

pub use status::{DeliveryStatus, PaymentShape, PaymentType, TransactionStatus, VehicleStatus};
