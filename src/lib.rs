pub mod config;
pub mod geometry;
pub mod gradients;
pub mod math8;
pub mod noise;
pub mod output;
pub mod patterns;
pub mod renderer;
pub mod types;
pub mod wave;
