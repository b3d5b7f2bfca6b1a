mod calendar_test;
mod middleware_test;
mod reservation_test;
mod slot_template_test;
