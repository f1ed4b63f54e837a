pub mod composer;
pub mod programs;
pub mod renderer;
pub mod shaders;
