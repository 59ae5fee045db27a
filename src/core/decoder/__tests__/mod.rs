pub mod latent_test;
