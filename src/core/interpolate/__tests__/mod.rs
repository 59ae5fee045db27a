pub mod easing_test;
pub mod interpolator_test;
