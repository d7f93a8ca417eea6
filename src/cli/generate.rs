use crate::cli::CliContext;
use crate::constants;
use crate::core::passgen::{self, PasswordOptions};
use anyhow::{bail, Result};
use clap::Args;

/// Password generator knobs, shared by `generate`, `add` and `edit`.
#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Length of the generated password
    #[arg(long, default_value_t = constants::DEFAULT_PASSWORD_LENGTH)]
    pub length: usize,

    /// Leave out uppercase letters
    #[arg(long)]
    pub no_uppercase: bool,

    /// Leave out digits
    #[arg(long)]
    pub no_numbers: bool,

    /// Include symbols
    #[arg(long)]
    pub symbols: bool,
}

impl GeneratorArgs {
    pub fn options(&self) -> PasswordOptions {
        PasswordOptions {
            length: self.length,
            uppercase: !self.no_uppercase,
            numbers: !self.no_numbers,
            symbols: self.symbols,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,
}

pub fn run(_ctx: &CliContext, args: GenerateArgs) -> Result<()> {
    if args.generator.length == 0 {
        bail!("--length must be at least 1");
    }
    let password = passgen::generate(&args.generator.options());
    println!("{}", password.as_str());
    Ok(())
}
