pub mod attendance;
pub mod presence;
pub mod shop;
pub mod staff;
