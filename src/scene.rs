pub mod assets;
pub mod camera;
pub mod light;
pub mod mesh;
pub mod model;
pub mod placement;
pub mod texture;
pub mod trees;
pub mod viewer;
