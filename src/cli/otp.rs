use crate::cli::entry::parse_entry_name;
use crate::cli::CliContext;
use crate::constants;
use crate::core::otp::{self, OtpError};
use crate::models::entry::OtpState;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use std::io::Write;
use std::thread;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct OtpArgs {
    #[arg(value_parser = parse_entry_name)]
    pub name: String,

    /// Keep printing the code, regenerating it when the window closes
    #[arg(long)]
    pub watch: bool,
}

/// Caller-side countdown: one tick per second, derive again at zero.
struct Countdown {
    uri: String,
    state: OtpState,
}

impl Countdown {
    fn new(state: OtpState) -> Self {
        let mut countdown = Self {
            uri: state.url.clone(),
            state,
        };
        countdown.reset_window();
        countdown
    }

    /// Advance by one second. Returns whether a new code was derived.
    fn tick_at(&mut self, unix_secs: u64) -> Result<bool, OtpError> {
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs > 0 {
            return Ok(false);
        }
        if let Some(state) = otp::derive_at(&self.uri, unix_secs)? {
            self.state = state;
        }
        self.reset_window();
        Ok(true)
    }

    fn reset_window(&mut self) {
        if self.state.remaining_secs == 0 {
            self.state.remaining_secs = constants::OTP_STEP_SECS;
        }
    }
}

fn now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

pub fn run(ctx: &CliContext, args: OtpArgs) -> Result<()> {
    let store = ctx.open_store(true)?;
    let leaf = store.leaf(&args.name)?;
    let entry = store
        .read(&leaf)
        .with_context(|| format!("read entry '{}'", args.name))?;
    let Some(state) = entry.otp else {
        if entry.otp_secret.is_some() {
            bail!("entry '{}' has an OTP secret that is not valid base32", args.name);
        }
        bail!("entry '{}' has no OTP secret", args.name);
    };

    if !args.watch {
        println!("{}", state.code);
        return Ok(());
    }

    let mut countdown = Countdown::new(state);
    let mut stdout = std::io::stdout();
    loop {
        write!(
            stdout,
            "\r{}  {:>2}s ",
            countdown.state.code, countdown.state.remaining_secs
        )
        .context("write to stdout")?;
        stdout.flush().context("flush stdout")?;
        thread::sleep(Duration::from_secs(1));
        countdown
            .tick_at(now())
            .with_context(|| format!("derive OTP for '{}'", args.name))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn state_at(t: u64) -> OtpState {
        otp::derive_at(&otp::provisioning_uri(SECRET), t)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_countdown_regenerates_at_zero() {
        let mut countdown = Countdown::new(state_at(58));
        assert_eq!(countdown.state.remaining_secs, 2);
        let first = countdown.state.code.clone();

        assert!(!countdown.tick_at(59).unwrap());
        assert_eq!(countdown.state.remaining_secs, 1);

        assert!(countdown.tick_at(61).unwrap());
        assert_eq!(countdown.state.remaining_secs, 29);
        assert_ne!(countdown.state.code, first);
    }

    #[test]
    fn test_zero_window_resets_to_full_step() {
        let mut countdown = Countdown::new(state_at(59));
        assert!(countdown.tick_at(60).unwrap());
        assert_eq!(countdown.state.remaining_secs, 30);
    }
}
