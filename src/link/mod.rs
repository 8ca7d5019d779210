//! Ground-control serial link: transport seam, inbound command parsing,
//! outbound telemetry records and their pacing.

pub mod command;
pub mod stream;
pub mod telemetry;
pub mod transport;

pub use command::{CommandParser, ParseError, encode_delimited, parse_line};
pub use stream::TelemetryStream;
pub use telemetry::{RecordError, TelemetryRecord, encode_record};
pub use transport::Transport;
