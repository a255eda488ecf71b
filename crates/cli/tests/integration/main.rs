mod bundle_tests;
mod common;
mod dispatch_tests;
mod work_tests;
