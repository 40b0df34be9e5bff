pub mod complaint;
pub mod dispatch;
pub mod staff;
