//! Command line interface.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "stevedore",
    version,
    about = "Open a container image, move files in or out, optionally commit the result"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy files out of an image
    Export {
        /// Image reference (repository[:tag]); prompted for when omitted
        #[arg(env = "STEVEDORE_IMAGE")]
        image: Option<String>,
    },
    /// Copy files into an image and optionally commit the result
    Import {
        /// Image reference (repository[:tag]); prompted for when omitted
        #[arg(env = "STEVEDORE_IMAGE")]
        image: Option<String>,
    },
    /// List locally stored images
    Images,
}
