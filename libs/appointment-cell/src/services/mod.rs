pub mod booking;
pub mod conflict;
pub mod lifecycle;

pub use booking::BookingService;
pub use conflict::ConflictService;
pub use lifecycle::LifecycleService;
