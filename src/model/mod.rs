// MODEL: Game state and data
pub mod body;
pub mod camera;
pub mod collectible;
pub mod world;

pub use body::{Appearance, DecorativeBody, Finish, KinematicBody, Shape};
pub use camera::Camera;
pub use collectible::{Collectible, CollectibleSet};
pub use world::{Lighting, World};
