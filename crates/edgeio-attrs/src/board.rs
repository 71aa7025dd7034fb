//! Board assembly and attribute dispatch.

use crate::attribute::{Access, format_line, parse_duration, parse_enabled};
use crate::ttl::{TtlMode, TtlPort};
use edgeio_core::constants::TTL_DEVICE;
use edgeio_core::{BoardConfig, Error, Result};
use edgeio_decoder::{DebouncedInput, WiegandReader};
use edgeio_hardware::{Clock, GpioController, OneShotScheduler};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Which Wiegand timing window an attribute addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimingField {
    IntervalMin,
    IntervalMax,
    WidthMin,
    WidthMax,
}

/// Attribute binding. Indices point into the board's component vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Debounced(usize),
    DebounceOnMs(usize),
    DebounceOffMs(usize),
    DebounceOnCount(usize),
    DebounceOffCount(usize),
    ReaderEnabled(usize),
    ReaderData(usize),
    ReaderNoise(usize),
    ReaderTiming(usize, TimingField),
    TtlMode(usize),
}

impl Attribute {
    fn access(self) -> Access {
        match self {
            Attribute::DebounceOnMs(_)
            | Attribute::DebounceOffMs(_)
            | Attribute::ReaderEnabled(_)
            | Attribute::ReaderTiming(..)
            | Attribute::TtlMode(_) => Access::ReadWrite,
            Attribute::Debounced(_)
            | Attribute::DebounceOnCount(_)
            | Attribute::DebounceOffCount(_)
            | Attribute::ReaderData(_)
            | Attribute::ReaderNoise(_) => Access::ReadOnly,
        }
    }
}

/// Every component of a board with its attribute table.
///
/// All inputs are registered at construction. Wiegand readers start
/// disabled and TTL ports start in mode `x`.
pub struct Board {
    inputs: Vec<DebouncedInput>,
    readers: Vec<WiegandReader>,
    ttl_ports: Vec<TtlPort>,
    attributes: BTreeMap<String, Attribute>,
}

impl Board {
    /// Validate `config` and build a board from it.
    ///
    /// # Errors
    /// Returns `Config` if [`BoardConfig::validate`] fails, otherwise the
    /// first error from registering a debounced input (`Busy` or
    /// `ResourceUnavailable`). Inputs registered before the failure are
    /// released again.
    pub fn new(
        config: &BoardConfig,
        gpio: Arc<dyn GpioController>,
        scheduler: Arc<dyn OneShotScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let mut attributes = BTreeMap::new();

        let mut inputs = Vec::with_capacity(config.inputs.len());
        for (index, input) in config.inputs.iter().enumerate() {
            inputs.push(DebouncedInput::register(
                input.name.clone(),
                input.line,
                &input.debounce,
                Arc::clone(&gpio),
                Arc::clone(&clock),
            )?);

            let prefix = format!("{}/{}", input.device, input.name);
            attributes.insert(format!("{prefix}_deb"), Attribute::Debounced(index));
            attributes.insert(format!("{prefix}_deb_on_ms"), Attribute::DebounceOnMs(index));
            attributes.insert(format!("{prefix}_deb_off_ms"), Attribute::DebounceOffMs(index));
            attributes.insert(format!("{prefix}_deb_on_cnt"), Attribute::DebounceOnCount(index));
            attributes.insert(format!("{prefix}_deb_off_cnt"), Attribute::DebounceOffCount(index));
        }

        let mut readers = Vec::with_capacity(config.wiegand.len());
        for (index, reader) in config.wiegand.iter().enumerate() {
            readers.push(WiegandReader::new(
                reader,
                Arc::clone(&gpio),
                Arc::clone(&scheduler),
                Arc::clone(&clock),
            ));

            let device = &reader.name;
            attributes.insert(format!("{device}/enabled"), Attribute::ReaderEnabled(index));
            attributes.insert(format!("{device}/data"), Attribute::ReaderData(index));
            attributes.insert(format!("{device}/noise"), Attribute::ReaderNoise(index));
            for (name, field) in [
                ("pulse_itvl_min", TimingField::IntervalMin),
                ("pulse_itvl_max", TimingField::IntervalMax),
                ("pulse_width_min", TimingField::WidthMin),
                ("pulse_width_max", TimingField::WidthMax),
            ] {
                attributes.insert(format!("{device}/{name}"), Attribute::ReaderTiming(index, field));
            }
        }

        let mut ttl_ports = Vec::with_capacity(config.ttl_ports.len());
        for (index, port) in config.ttl_ports.iter().enumerate() {
            ttl_ports.push(TtlPort::new(port, Arc::clone(&gpio)));
            attributes.insert(format!("{TTL_DEVICE}/{}_mode", port.name), Attribute::TtlMode(index));
        }

        info!(
            inputs = inputs.len(),
            readers = readers.len(),
            ttl_ports = ttl_ports.len(),
            attributes = attributes.len(),
            "Board assembled"
        );

        Ok(Self {
            inputs,
            readers,
            ttl_ports,
            attributes,
        })
    }

    fn lookup(&self, path: &str) -> Result<Attribute> {
        self.attributes
            .get(path)
            .copied()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// All attribute paths in sorted order.
    pub fn attributes(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    /// Access mode of an attribute.
    ///
    /// # Errors
    /// `NotFound` for an unknown path.
    pub fn access(&self, path: &str) -> Result<Access> {
        self.lookup(path).map(Attribute::access)
    }

    /// Read an attribute.
    ///
    /// Reading `<reader>/noise` clears the pending noise code.
    ///
    /// # Errors
    /// - `NotFound` for an unknown path
    /// - `NotEnabled` / `Busy` from `<reader>/data`
    pub fn show(&self, path: &str) -> Result<String> {
        let value = match self.lookup(path)? {
            Attribute::Debounced(i) => format_line(self.inputs[i].value()),
            Attribute::DebounceOnMs(i) => format_line(self.inputs[i].on_min_us() / 1_000),
            Attribute::DebounceOffMs(i) => format_line(self.inputs[i].off_min_us() / 1_000),
            Attribute::DebounceOnCount(i) => format_line(self.inputs[i].on_count()),
            Attribute::DebounceOffCount(i) => format_line(self.inputs[i].off_count()),
            Attribute::ReaderEnabled(i) => format_line(u8::from(self.readers[i].is_enabled())),
            Attribute::ReaderData(i) => format_line(self.readers[i].read_frame()?),
            Attribute::ReaderNoise(i) => format_line(self.readers[i].take_noise()),
            Attribute::ReaderTiming(i, field) => {
                let timing = self.readers[i].timing();
                format_line(match field {
                    TimingField::IntervalMin => timing.pulse_interval_min_us,
                    TimingField::IntervalMax => timing.pulse_interval_max_us,
                    TimingField::WidthMin => timing.pulse_width_min_us,
                    TimingField::WidthMax => timing.pulse_width_max_us,
                })
            }
            Attribute::TtlMode(i) => format_line(self.ttl_ports[i].mode()),
        };
        Ok(value)
    }

    /// Write an attribute.
    ///
    /// # Errors
    /// - `NotFound` for an unknown path, `ReadOnly` for a read-only one
    /// - `InvalidArgument` for a malformed value
    /// - `Busy` / `ResourceUnavailable` when enabling a reader or selecting a
    ///   TTL mode cannot acquire its line
    pub fn store(&self, path: &str, value: &str) -> Result<()> {
        let attribute = self.lookup(path)?;
        debug!(path, value = value.trim_end(), "Attribute store");

        match attribute {
            Attribute::DebounceOnMs(i) => {
                let ms = parse_duration(value)?;
                self.inputs[i].set_on_min_us(ms.saturating_mul(1_000));
            }
            Attribute::DebounceOffMs(i) => {
                let ms = parse_duration(value)?;
                self.inputs[i].set_off_min_us(ms.saturating_mul(1_000));
            }
            Attribute::ReaderEnabled(i) => {
                if parse_enabled(value)? {
                    self.readers[i].enable()?;
                } else {
                    self.readers[i].disable();
                }
            }
            Attribute::ReaderTiming(i, field) => {
                let micros = parse_duration(value)?;
                let reader = &self.readers[i];
                match field {
                    TimingField::IntervalMin => reader.set_pulse_interval_min_us(micros),
                    TimingField::IntervalMax => reader.set_pulse_interval_max_us(micros),
                    TimingField::WidthMin => reader.set_pulse_width_min_us(micros),
                    TimingField::WidthMax => reader.set_pulse_width_max_us(micros),
                }
            }
            Attribute::TtlMode(i) => self.ttl_ports[i].set_mode(TtlMode::parse(value))?,
            Attribute::Debounced(_)
            | Attribute::DebounceOnCount(_)
            | Attribute::DebounceOffCount(_)
            | Attribute::ReaderData(_)
            | Attribute::ReaderNoise(_) => return Err(Error::ReadOnly(path.to_string())),
        }
        Ok(())
    }

    /// Wiegand reader by device name.
    pub fn reader(&self, name: &str) -> Option<&WiegandReader> {
        self.readers.iter().find(|r| r.name() == name)
    }

    pub fn readers(&self) -> &[WiegandReader] {
        &self.readers
    }

    /// Debounced input by name.
    pub fn input(&self, name: &str) -> Option<&DebouncedInput> {
        self.inputs.iter().find(|i| i.name() == name)
    }

    /// TTL port by name.
    pub fn ttl_port(&self, name: &str) -> Option<&TtlPort> {
        self.ttl_ports.iter().find(|p| p.name() == name)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("inputs", &self.inputs)
            .field("readers", &self.readers)
            .field("ttl_ports", &self.ttl_ports)
            .finish()
    }
}
