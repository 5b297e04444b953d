pub mod future_timeout_ext;
pub mod reductions;
pub mod std_error_pp;
