use anyhow::Result;

#[path = "mailprobe-cli/args.rs"]
mod args;
#[path = "mailprobe-cli/output.rs"]
mod output;
#[path = "mailprobe-cli/permute.rs"]
mod permute;
#[path = "mailprobe-cli/verify.rs"]
mod verify;

use args::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Verify(args) => verify::run_verify(args)?,
        Commands::Check(args) => {
            // codes de sortie : 0 valide, 2 non valide, 1 erreur fatale
            if !verify::run_check(args)? {
                std::process::exit(2);
            }
        }
        Commands::Permute(args) => permute::run_permute(args)?,
    }
    Ok(())
}
