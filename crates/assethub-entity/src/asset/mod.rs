//! Asset (indexed file) domain entities.

pub mod criteria;
pub mod kind;
pub mod model;

pub use criteria::AssetCriteria;
pub use kind::{AssetKind, MANIPULATABLE_IMAGE_EXTENSIONS, is_image_manipulatable};
pub use model::{Asset, FieldError};
