//! Flipstage Sequence Model
//!
//! Defines the core data contracts shared by loading and playback:
//! - **Catalog:** Validated registry of sequence names and start frames
//! - **Sequence:** Immutable, gap-free lists of frame locators
//! - **Cards:** Carousel entries bound to a catalog sequence
//! - **Geometry:** Bounding boxes and camera poses for auto-framing
//!
//! Frame locators follow the asset convention
//! `{base}/image-sequences/{name}/{frame:04}.png`.

pub mod card;
pub mod catalog;
pub mod geometry;
pub mod sequence;

pub use card::*;
pub use catalog::*;
pub use geometry::*;
pub use sequence::*;
