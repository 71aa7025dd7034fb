//! Attribute-file front end for the edge decoders.
//!
//! A [`Board`] assembles debounced inputs, Wiegand readers and TTL ports
//! from a [`BoardConfig`](edgeio_core::BoardConfig) and exposes them as
//! named attributes addressed `"<device>/<attribute>"`. Values are decimal
//! ASCII lines, the way a sysfs-style transport presents them.
//!
//! ```
//! use edgeio_attrs::Board;
//! use edgeio_core::BoardConfig;
//! use edgeio_hardware::mock::{MockClock, MockGpio, MockScheduler};
//! use edgeio_core::LineId;
//! use std::sync::Arc;
//!
//! let config = BoardConfig::from_json_str(r#"{
//!     "wiegand": [{ "name": "wiegand", "d0": 4, "d1": 5 }]
//! }"#).unwrap();
//!
//! let clock = MockClock::new();
//! let board = Board::new(
//!     &config,
//!     Arc::new(MockGpio::with_lines([LineId::new(4), LineId::new(5)])),
//!     Arc::new(MockScheduler::new(clock.clone())),
//!     Arc::new(clock),
//! ).unwrap();
//!
//! assert_eq!(board.show("wiegand/enabled").unwrap(), "0\n");
//! board.store("wiegand/enabled", "1\n").unwrap();
//! assert_eq!(board.show("wiegand/pulse_itvl_max").unwrap(), "2700\n");
//! ```

pub mod attribute;
pub mod board;
pub mod ttl;

pub use attribute::Access;
pub use board::Board;
pub use ttl::{TtlMode, TtlPort};
