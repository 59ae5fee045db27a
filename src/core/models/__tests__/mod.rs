pub mod context_test;
