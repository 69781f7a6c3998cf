//! Defines command-line interface options using `clap` for the nc_utils demo binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A CLI tool for writing and reading NetCDF files
#[derive(Parser, Debug)]
#[command(
    name = "nc_utils",
    version,
    about = "Basic NetCDF and HDF5 file manipulation routines"
)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the 10x10 demo array to a NetCDF file
    Example {
        /// Destination of the demo file
        #[arg(short, long, default_value = "test.nc")]
        output: PathBuf,
    },

    /// Read every variable of a file and print its type and shape
    Read {
        /// Path to the NetCDF file
        file: PathBuf,

        /// Treat the file as plain HDF5 (requires the `hdf5` feature; NASA CDF is not supported)
        #[arg(long)]
        hdf5: bool,

        /// Keep stored values instead of unpacking scale_factor/add_offset and masking fill values
        #[arg(long)]
        raw: bool,
    },

    /// Print dimensions, variables and attributes of a NetCDF file
    Inspect {
        /// Path to the NetCDF file
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_default_output() {
        let args = Args::parse_from(["nc_utils", "example"]);
        match args.command {
            Command::Example { output } => assert_eq!(output, PathBuf::from("test.nc")),
            other => panic!("Expected Example, got {:?}", other),
        }
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_parse_read_with_verbosity() {
        let args = Args::parse_from(["nc_utils", "-vv", "read", "data.nc"]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Read { file, hdf5, raw } => {
                assert_eq!(file, PathBuf::from("data.nc"));
                assert!(!hdf5);
                assert!(!raw);
            }
            other => panic!("Expected Read, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_read_raw() {
        let args = Args::parse_from(["nc_utils", "read", "--raw", "packed.nc"]);
        assert!(matches!(args.command, Command::Read { raw: true, hdf5: false, .. }));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
