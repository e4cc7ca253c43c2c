// src/drivers/mod.rs
pub mod buffer;
pub mod error;
pub mod link;
pub mod plot;
pub mod protocol;

pub use buffer::SampleBuffer;
pub use error::{GsrError, MatError};
pub use link::{DeviceLink, PortDescription, SerialLink, SimulatedLink};
pub use plot::{render_conductance_png, PlotStyle};
pub use protocol::{parse_line, LineFramer};
