pub mod cursor;
pub mod fields;
pub mod partition;
pub mod record;
pub mod slice;
pub mod window;
