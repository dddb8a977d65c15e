//! Retrieval of the engine's binary assets and the revocable references the
//! engine is loaded from.

mod dir;
mod error;
mod http;
mod object_url;
mod traits;

pub use dir::DirAssetSource;
pub use error::AssetError;
pub use http::HttpAssetSource;
pub use object_url::{Blob, ObjectUrl, ObjectUrlStore};
pub use traits::{AssetSource, CORE_ASSET_PATH, WASM_ASSET_PATH};
