pub mod calendar;
pub mod slot_instance;
pub mod slot_template;
