pub mod file_utils;
pub mod log_setup;
pub mod shared_fn;
pub mod test_utils;

pub use shared_fn::SharedFn;
