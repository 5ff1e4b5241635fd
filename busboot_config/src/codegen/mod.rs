//! Generation of the `board` module included by busboot.
use std::{fs::OpenOptions, io::Write, path::Path};

use anyhow::Result;
use proc_macro2::TokenStream;
use quote::quote;

use crate::{links::Link, Configuration, PERIPHERAL_SLOTS};

/// Name of the generated file, relative to the output directory.
pub const BOARD_MODULE_FILENAME: &str = "board_configuration.rs";

/// Writes the board module into `out_dir`. The configuration is validated
/// first; an invalid configuration never produces a module.
pub fn generate_board_module<P: AsRef<Path>>(
    out_dir: P,
    configuration: &Configuration,
) -> Result<()> {
    let code = board_module_tokens(configuration)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(out_dir.as_ref().join(BOARD_MODULE_FILENAME))?;
    file.write_all(format!("{}", code).as_bytes())?;
    Ok(())
}

pub fn board_module_tokens(configuration: &Configuration) -> Result<TokenStream> {
    configuration.validate()?;

    let board_id = configuration.board.id;
    let application_start = configuration.board.application_start;
    let ping_triggers_reset = configuration.protocol.ping_triggers_reset;
    let stall_timeout = configuration.protocol.serial_stall_timeout_ms;
    let slots = PERIPHERAL_SLOTS;
    let links = configuration.links.iter().map(link_descriptor);

    Ok(quote! {
        pub const BOARD_ID: u8 = #board_id;
        pub const APPLICATION_START: u32 = #application_start;
        pub const PING_TRIGGERS_RESET: bool = #ping_triggers_reset;
        pub const SERIAL_STALL_TIMEOUT_MS: u32 = #stall_timeout;
        pub const PERIPHERAL_SLOTS: usize = #slots;
        pub const LINKS: &[LinkDescriptor] = &[#(#links),*];
    })
}

fn link_descriptor(link: &Link) -> TokenStream {
    let peripheral = link.peripheral();
    let rate = link.rate();
    match link {
        Link::Serial { .. } => quote! {
            LinkDescriptor { kind: LinkKind::Serial, peripheral: #peripheral, rate: #rate }
        },
        Link::Bus { .. } => quote! {
            LinkDescriptor { kind: LinkKind::Bus, peripheral: #peripheral, rate: #rate }
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Board, Protocol};

    fn configuration() -> Configuration {
        Configuration {
            board: Board { id: 7, application_start: 0x0804_0000 },
            links: vec![Link::Bus { peripheral: 1, bitrate: 500_000 }],
            protocol: Protocol { ping_triggers_reset: false, serial_stall_timeout_ms: 25 },
        }
    }

    #[test]
    fn generated_module_carries_board_constants() {
        let code: String = board_module_tokens(&configuration())
            .unwrap()
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        assert!(code.contains("pubconstBOARD_ID:u8=7u8;"));
        assert!(code.contains("pubconstAPPLICATION_START:u32=134479872u32;"));
        assert!(code.contains("pubconstPING_TRIGGERS_RESET:bool=false;"));
        assert!(code.contains("pubconstSERIAL_STALL_TIMEOUT_MS:u32=25u32;"));
        assert!(code.contains("LinkDescriptor{kind:LinkKind::Bus,peripheral:1u8,rate:500000u32}"));
    }

    #[test]
    fn invalid_configuration_generates_nothing() {
        let mut configuration = configuration();
        configuration.links.clear();
        assert!(board_module_tokens(&configuration).is_err());
    }
}
