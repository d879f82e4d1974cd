pub mod binding;
pub mod clip;
pub mod player;
pub mod tracks;
mod values;

pub use binding::TargetPath;
pub use clip::{Animation, AnimationChannel, Frame};
pub use player::{AnimationPlayer, PlaybackState, wrap_time};
pub use tracks::{Interpolation, KeyframeCursor, evaluate, evaluate_with_cursor};
pub use values::{Interpolatable, PropertyValue, Weights};
