pub mod datetime;
pub mod event;
pub mod rrule;
pub mod timezone;

pub use event::{
    VOLATILE_PROPERTIES, is_exception, normalize_body, order_property_lines, recurrence_id_value,
};
pub use timezone::to_iana;
