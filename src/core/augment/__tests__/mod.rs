pub mod geometry_test;
