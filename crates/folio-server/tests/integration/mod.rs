mod auth_tests;
mod file_tests;
mod me_tests;
mod post_tests;
mod stack_tests;
