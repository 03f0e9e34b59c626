mod support;
mod repair_loop_tests;
#[cfg(unix)]
mod check_cleanup_tests;
