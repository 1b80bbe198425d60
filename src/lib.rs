//! Reed-Solomon forward error correction packet filter for a reliable-UDP
//! streaming transport: a GF(2^8) systematic RS codec, a send-side block
//! assembler and a receive-side block tracker behind one small facade.

pub mod config;
pub mod error;
pub mod filter;
pub mod gf;
pub mod matrix;
pub mod packet;
pub mod pool;
pub mod receiver;
pub mod rs;
pub mod sender;
pub mod seq;
pub mod wire;

pub use config::FilterConfig;
pub use error::{ConfigError, DecodeError};
pub use filter::{ArqLevel, Inbound, RsFecFilter, DEFAULT_MAX_GROUPS, DEFAULT_TTL};
pub use packet::{ControlPacket, RebuiltPacket, SourcePacket};
pub use receiver::ProvidedQueue;
