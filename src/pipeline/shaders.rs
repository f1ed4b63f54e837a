pub mod lit;
pub mod normal_map;
pub mod skybox;
