mod browser;
mod capabilities;
mod client_hints;
mod device;
mod formats;
mod network;
mod performance;

pub use browser::*;
pub use capabilities::*;
pub use client_hints::*;
pub use device::*;
pub use formats::*;
pub use network::*;
pub use performance::*;
