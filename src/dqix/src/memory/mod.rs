//! Memory Access Abstraction
//!
//! Byte-range access to the emulated console's main RAM:
//! - `MemoryAccess` - the fallible request/response interface every backend implements
//! - `RamImage` - an in-memory image, used for tests and dry runs

mod image;
mod traits;

pub use image::RamImage;
pub use traits::{decode_uint, encode_uint, MemoryAccess, MemoryError, MemoryResult};
