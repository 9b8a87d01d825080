pub mod error;
pub mod filter;
pub mod packet;
pub mod sink;

pub use error::{Error, Result};
pub use filter::{DumpPolicy, FilterConfig, SeiTap, StreamParams};
pub use packet::{Packet, Rational, SideData};
