//! Entry point for the nc_utils demo binary.
//! Handles CLI parsing and dispatches to the library routines.

use clap::Parser;
use nc_utils::{example_write_nc, load_nc, ncread_vars_with, print_metadata, ArrayValue, ReadOptions};
use std::collections::BTreeMap;
use std::path::Path;

mod cli;
mod logging;

use cli::{Args, Command};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(args.verbose);

    match args.command {
        Command::Example { output } => {
            println!("writing example netCDF file to demonstrate code");
            example_write_nc(&output)?;
        }
        Command::Read { file, hdf5, raw } => {
            let vars = if hdf5 {
                read_hdf5(&file)?
            } else {
                let options = ReadOptions::default().with_mask_and_scale(!raw);
                ncread_vars_with(file.as_path(), &options)?
            };
            print_variables(&vars);
        }
        Command::Inspect { file } => {
            let file = load_nc(&file)?;
            print_metadata(&file)?;
        }
    }

    Ok(())
}

#[cfg(feature = "hdf5")]
fn read_hdf5(path: &Path) -> nc_utils::Result<BTreeMap<String, ArrayValue>> {
    nc_utils::load_hdf5(path)
}

#[cfg(not(feature = "hdf5"))]
fn read_hdf5(_path: &Path) -> nc_utils::Result<BTreeMap<String, ArrayValue>> {
    Err(nc_utils::NcUtilsError::InvalidOptions(
        "HDF5 support requires building with the `hdf5` feature".to_string(),
    ))
}

fn print_variables(vars: &BTreeMap<String, ArrayValue>) {
    for (name, value) in vars {
        let shape: Vec<String> = value.shape().iter().map(|s| s.to_string()).collect();
        if shape.is_empty() {
            println!("{} ({}): scalar", name, value.var_type());
        } else {
            println!("{} ({}): ({})", name, value.var_type(), shape.join(" × "));
        }
    }
}
