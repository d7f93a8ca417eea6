use crate::cli::generate::GeneratorArgs;
use crate::cli::CliContext;
use crate::constants;
use crate::core::{passgen, store};
use crate::models::entry::CredentialEntry;
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use dialoguer::{Confirm, Password};
use std::io::{Read, Write};
use zeroize::{Zeroize, Zeroizing};

pub(crate) fn parse_entry_name(s: &str) -> Result<String, String> {
    store::validate_name(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("field key cannot be empty".into());
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Args, Debug)]
pub struct PasswordArgs {
    /// Generate a random password instead of prompting
    #[arg(long)]
    pub generate: bool,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub from_stdin: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Entry name, e.g. web/example.com
    #[arg(value_parser = parse_entry_name)]
    pub name: String,

    /// Show the password instead of a mask
    #[arg(long)]
    pub reveal: bool,

    /// Print only this field, unmasked (password, username, url, notes, otp, or a custom key)
    #[arg(long, value_name = "FIELD", conflicts_with_all = ["raw", "format"])]
    pub field: Option<String>,

    /// Print the decrypted body as stored
    #[arg(long, conflicts_with = "format")]
    pub raw: bool,

    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Entry name; folders are created as needed
    #[arg(value_parser = parse_entry_name)]
    pub name: String,

    #[command(flatten)]
    pub password: PasswordArgs,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    /// Base32 TOTP secret
    #[arg(long, value_name = "SECRET")]
    pub otp_secret: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Extra key=value field (repeatable)
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[arg(value_parser = parse_entry_name)]
    pub name: String,

    /// Move the entry to a new name
    #[arg(long, value_name = "NEW_NAME", value_parser = parse_entry_name)]
    pub rename: Option<String>,

    /// Prompt for a new password
    #[arg(long = "password")]
    pub change_password: bool,

    #[command(flatten)]
    pub password: PasswordArgs,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long, value_name = "SECRET", conflicts_with = "clear_otp")]
    pub otp_secret: Option<String>,

    /// Remove the OTP secret
    #[arg(long)]
    pub clear_otp: bool,

    /// Replace the notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Extra key=value field (repeatable)
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    #[arg(value_parser = parse_entry_name)]
    pub name: String,

    /// Do not ask for confirmation
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run_show(ctx: &CliContext, args: ShowArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }
    let store = ctx.open_store(true)?;
    let leaf = store.leaf(&args.name)?;
    let entry = store
        .read(&leaf)
        .with_context(|| format!("read entry '{}'", args.name))?;

    if args.raw {
        let mut stdout = std::io::stdout();
        stdout.write_all(entry.raw.as_bytes()).context("write to stdout")?;
        stdout.flush().context("flush stdout")?;
        return Ok(());
    }

    if let Some(field) = &args.field {
        let value = entry
            .field(field)
            .ok_or_else(|| anyhow::anyhow!("field '{}' is not set on '{}'", field, args.name))?;
        println!("{}", value);
        return Ok(());
    }

    if args.format == "json" {
        let mut view = entry.clone();
        if !args.reveal {
            view.password = constants::PASSWORD_MASK.to_string();
        }
        let json = serde_json::to_string_pretty(&view).context("serialize entry")?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", entry_table(&entry, args.reveal));
    Ok(())
}

pub(crate) fn entry_table(entry: &CredentialEntry, reveal: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec!["name", entry.name.as_str()]);
    let password = if reveal {
        entry.password.as_str()
    } else {
        constants::PASSWORD_MASK
    };
    table.add_row(vec!["password", password]);
    if let Some(username) = &entry.username {
        table.add_row(vec!["username", username.as_str()]);
    }
    if let Some(url) = &entry.url {
        table.add_row(vec!["url", url.as_str()]);
    }
    if let Some(otp) = &entry.otp {
        table.add_row(vec![
            "otp".to_string(),
            format!("{} ({}s left)", otp.code, otp.remaining_secs),
        ]);
    } else if entry.otp_secret.is_some() {
        table.add_row(vec!["otp", "unusable secret"]);
    }
    if let Some(notes) = &entry.notes {
        table.add_row(vec!["notes", notes.as_str()]);
    }
    for (key, value) in &entry.extra {
        table.add_row(vec![key.as_str(), value.as_str()]);
    }
    table
}

pub fn run_add(ctx: &CliContext, args: AddArgs) -> Result<()> {
    if ctx.non_interactive && !args.password.generate && !args.password.from_stdin {
        bail!("--non-interactive requires --generate or --from-stdin for add");
    }
    let password = read_password(&args.password, &args.name)?;

    let mut entry = CredentialEntry::new(args.name.as_str(), password.as_str());
    entry.username = args.username.filter(|v| !v.is_empty());
    entry.url = args.url.filter(|v| !v.is_empty());
    entry.otp_secret = args.otp_secret.filter(|v| !v.is_empty());
    entry.notes = args.notes.filter(|v| !v.is_empty());
    for (key, value) in &args.fields {
        entry.set_extra(key, value);
    }

    let store = ctx.open_store(false)?;
    let _lock = ctx.lock()?;
    let leaf = store
        .create("", &entry)
        .with_context(|| format!("create entry '{}'", args.name))?;
    println!("Created {}", leaf.name);
    if args.password.generate {
        println!("Generated password stored. Run: passbook show {} --reveal", leaf.name);
    }
    Ok(())
}

pub fn run_edit(ctx: &CliContext, args: EditArgs) -> Result<()> {
    let replaces_password =
        args.change_password || args.password.generate || args.password.from_stdin;
    if ctx.non_interactive && args.change_password {
        bail!("--non-interactive cannot prompt; use --generate or --from-stdin");
    }

    let store = ctx.open_store(true)?;
    let _lock = ctx.lock()?;
    let leaf = store.leaf(&args.name)?;
    let mut entry = store
        .read(&leaf)
        .with_context(|| format!("read entry '{}'", args.name))?;

    if replaces_password {
        entry.password = read_password(&args.password, &args.name)?.to_string();
    }
    if let Some(username) = args.username {
        entry.username = Some(username).filter(|v| !v.is_empty());
    }
    if let Some(url) = args.url {
        entry.url = Some(url).filter(|v| !v.is_empty());
    }
    if args.clear_otp {
        entry.otp_secret = None;
    } else if let Some(secret) = args.otp_secret {
        entry.otp_secret = Some(secret).filter(|v| !v.is_empty());
    }
    if let Some(notes) = args.notes {
        entry.notes = Some(notes).filter(|v| !v.is_empty());
    }
    for (key, value) in &args.fields {
        entry.set_extra(key, value);
    }
    if let Some(new_name) = &args.rename {
        entry.name = new_name.clone();
    }

    let updated = store
        .update(&leaf, &entry)
        .with_context(|| format!("update entry '{}'", args.name))?;
    if updated.name != leaf.name {
        println!("Renamed {} -> {}", leaf.name, updated.name);
    } else {
        println!("Updated {}", updated.name);
    }
    Ok(())
}

pub fn run_rm(ctx: &CliContext, args: RmArgs) -> Result<()> {
    if ctx.non_interactive && !args.yes {
        bail!("--non-interactive requires --yes for rm");
    }
    let store = ctx.open_store(false)?;
    let leaf = store.leaf(&args.name)?;
    if !leaf.path.is_file() {
        bail!("entry not found: {}", args.name);
    }
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}?", args.name))
            .default(false)
            .interact()
            .context("read confirmation")?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let _lock = ctx.lock()?;
    store
        .delete(&leaf)
        .with_context(|| format!("delete entry '{}'", args.name))?;
    println!("Deleted {}", args.name);
    Ok(())
}

fn read_password(args: &PasswordArgs, name: &str) -> Result<Zeroizing<String>> {
    if args.generate && args.from_stdin {
        bail!("--generate and --from-stdin cannot be used together");
    }
    let password = if args.generate {
        passgen::generate(&args.generator.options())
    } else if args.from_stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read password from stdin")?;
        let password = Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string());
        buf.zeroize();
        password
    } else {
        Zeroizing::new(
            Password::new()
                .with_prompt(format!("Password for {}", name))
                .with_confirmation("Repeat password", "Passwords do not match")
                .allow_empty_password(true)
                .interact()
                .context("read password from prompt")?,
        )
    };
    if password.contains(['\r', '\n']) {
        bail!("password must be a single line");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_name() {
        assert!(parse_entry_name("web/example.com").is_ok());
        assert!(parse_entry_name("bad name").is_err());
        assert!(parse_entry_name("../x").is_err());
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("pin=12=34").unwrap(),
            ("pin".to_string(), "12=34".to_string())
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_table_masks_password_by_default() {
        let mut entry = CredentialEntry::new("mail", "hunter2");
        entry.username = Some("alice".into());
        let masked = entry_table(&entry, false).to_string();
        assert!(!masked.contains("hunter2"));
        assert!(masked.contains(constants::PASSWORD_MASK));
        assert!(masked.contains("alice"));
        assert!(entry_table(&entry, true).to_string().contains("hunter2"));
    }
}
