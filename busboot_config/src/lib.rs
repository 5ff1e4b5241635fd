//! This busboot sub-crate contains all definitions needed to describe
//! a board running the busboot engine.
//!
//! NOTE: This code is not included anywhere from busboot itself! This
//! is a dependency of the busboot **build script**. The build script
//! uses it to turn a RON configuration file into the `board` module
//! that busboot includes (board id, application start, link topology).

use std::fmt::Display;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub mod codegen;
pub mod links;

use links::Link;

/// Number of interrupt-reachable driver slots per link kind.
pub const PERIPHERAL_SLOTS: usize = 8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub board: Board,
    pub links: Vec<Link>,
    #[serde(default)]
    pub protocol: Protocol,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Address of this board on every shared bus.
    pub id: u8,
    /// First byte of the application image, absolute.
    pub application_start: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Protocol {
    pub ping_triggers_reset: bool,
    pub serial_stall_timeout_ms: u32,
}

impl Default for Protocol {
    fn default() -> Self { Self { ping_triggers_reset: true, serial_stall_timeout_ms: 10 } }
}

impl Configuration {
    pub fn complete(&self) -> bool { self.problems().next().is_none() }

    pub fn problems(&self) -> impl Iterator<Item = ConfigurationProblem> + '_ {
        let no_links = self.links.is_empty().then_some(ConfigurationProblem::NoLinks);
        let misaligned = (self.board.application_start % 4 != 0)
            .then_some(ConfigurationProblem::MisalignedApplicationStart);
        let stall = (self.protocol.serial_stall_timeout_ms == 0)
            .then_some(ConfigurationProblem::ZeroStallTimeout);

        let per_link = self.links.iter().enumerate().flat_map(move |(index, link)| {
            let out_of_range = (link.peripheral() as usize >= PERIPHERAL_SLOTS)
                .then_some(ConfigurationProblem::PeripheralOutOfRange(*link));
            let zero_rate = (link.rate() == 0).then_some(ConfigurationProblem::ZeroRate(*link));
            let duplicated = self.links[..index]
                .iter()
                .any(|other| other.claims_same_peripheral(link))
                .then_some(ConfigurationProblem::DuplicatePeripheral(*link));
            [out_of_range, zero_rate, duplicated].into_iter().flatten()
        });

        [no_links, misaligned, stall].into_iter().flatten().chain(per_link)
    }

    /// Fails with the first problem found, if any.
    pub fn validate(&self) -> Result<()> {
        if let Some(problem) = self.problems().next() {
            bail!("Invalid busboot configuration: {}", problem);
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationProblem {
    NoLinks,
    MisalignedApplicationStart,
    ZeroStallTimeout,
    PeripheralOutOfRange(Link),
    ZeroRate(Link),
    DuplicatePeripheral(Link),
}

impl Display for ConfigurationProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationProblem::NoLinks => f.write_str("[Links] Define at least one link"),
            ConfigurationProblem::MisalignedApplicationStart => {
                f.write_str("[Board] Application start must be word aligned")
            }
            ConfigurationProblem::ZeroStallTimeout => {
                f.write_str("[Protocol] Serial stall timeout must be non-zero")
            }
            ConfigurationProblem::PeripheralOutOfRange(link) => write!(
                f,
                "[Links] {} peripheral index must be below {}",
                link, PERIPHERAL_SLOTS
            ),
            ConfigurationProblem::ZeroRate(link) => write!(f, "[Links] {} has a zero rate", link),
            ConfigurationProblem::DuplicatePeripheral(link) => {
                write!(f, "[Links] {} is claimed more than once", link)
            }
        }
    }
}
