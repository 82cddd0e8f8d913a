//! Token counting and the GSSC (gather → select → structure → compress)
//! context assembly pipeline.

pub mod builder;
pub mod compress;
pub mod config;
pub mod gather;
pub mod packet;
pub mod select;
pub mod structure;
pub mod tokens;

pub use builder::ContextBuilder;
pub use config::ContextConfig;
pub use gather::{GatherInput, Gatherer};
pub use packet::{ContextPacket, PacketType};
pub use structure::{DefaultStructurer, MinimalStructurer, Section, Structurer, TemplatedStructurer};
pub use tokens::{CharRatioCounter, DefaultTokenCounter, TokenCounter};
