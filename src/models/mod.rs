pub mod accommodation;
pub mod benefit;
pub mod invoice;
pub mod order;
pub mod revenue;
pub mod room;
pub mod user;

pub use accommodation::{
    AccommodationRow, AccommodationStatusWindow, AccommodationView, KIND_HOMESTAY, KIND_HOTEL,
    KIND_VILLA,
};
pub use benefit::Benefit;
pub use invoice::{Invoice, INVOICE_PAID, INVOICE_UNPAID};
pub use order::{
    Order, ORDER_STATUS_CANCELLED, ORDER_STATUS_COMPLETED, ORDER_STATUS_CONFIRMED,
    ORDER_STATUS_PENDING,
};
pub use revenue::UserRevenue;
pub use room::{RoomStatusWindow, RoomView};
pub use user::{StaffView, User};
