use anyhow::Result;
use busboot_config::{codegen::generate_board_module, Configuration};
use std::{
    env,
    fs::File,
    io::{BufReader, Read},
};

const DEFAULT_CONFIG_FILENAME: &str = "default.ron";

fn main() -> Result<()> {
    process_configuration_file()?;
    Ok(())
}

fn process_configuration_file() -> Result<()> {
    println!("cargo:rerun-if-env-changed=BUSBOOT_CONFIG");
    println!(
        "cargo:rerun-if-changed=./busboot_config/sample_configurations/{}",
        DEFAULT_CONFIG_FILENAME
    );

    let filename = if let Ok(filename) = env::var("BUSBOOT_CONFIG") {
        println!("cargo:rerun-if-changed={}", filename);
        filename
    } else {
        // Useful for host testing. Real boards always provide their own.
        format!("./busboot_config/sample_configurations/{}", DEFAULT_CONFIG_FILENAME)
    };

    let file = File::open(filename)?;
    let mut buf_reader = BufReader::new(file);
    let mut contents = String::new();
    buf_reader.read_to_string(&mut contents)?;
    let configuration: Configuration = ron::from_str(&contents)?;
    generate_board_module(env::var("OUT_DIR")?, &configuration)?;

    Ok(())
}
