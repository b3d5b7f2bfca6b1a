pub mod booking;
pub mod calendar;
pub mod health;
pub mod slot_template;
