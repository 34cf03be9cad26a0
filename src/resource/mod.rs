// Resource Module
// Priority-overlay resolution of logical paths to loaded resources

pub mod directory;
pub mod entry;
pub mod error;
pub mod handle;
pub mod path;
pub mod propfile;
pub mod registry;
pub mod resource_type;
pub mod tier;
pub mod type_registry;


pub use directory::ResourceDirectory;
pub use entry::ResourceEntry;
pub use error::{DecodeError, FetchError, ResourceError, Result};
pub use handle::{AssetCell, HandleId, HandleKind, ResourceHandle};
pub use propfile::{PropertyError, PropertyFile};
pub use registry::Registry;
pub use resource_type::{Resource, ResourceKind, ResourceValue};
pub use tier::PriorityTier;
pub use type_registry::{Decode, DecoderRegistry, KindTable};
