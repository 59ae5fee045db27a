pub mod adam_test;
pub mod sgd_test;
