pub mod characters;
pub mod distances;
pub mod quartets;
pub mod split_system;
pub mod taxa;

pub use characters::CharacterMatrix;
pub use distances::DistanceMatrix;
pub use quartets::{Quartet, QuartetSet};
pub use split_system::{Compatibility, SplitSystem};
pub use taxa::Taxa;
