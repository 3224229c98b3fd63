use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use key_press_replay::{CancelToken, InputSink, NullSink, ReplayConfig, ReplayEngine};
use tracing_subscriber::EnvFilter;

/// Replay a configured sequence of key presses to the focused window.
#[derive(Parser, Debug)]
#[command(name = "kpr", version, about)]
struct Cli {
    /// Path to the config file
    #[arg(default_value = "config.json")]
    config: String,

    /// Override the configured loop count (0 = infinite)
    #[arg(long)]
    loop_count: Option<i32>,

    /// Override the configured initial delay in milliseconds
    #[arg(long)]
    initial_delay: Option<u64>,

    /// Print and time the actions without injecting any input
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("key_press_replay=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    warn_if_not_elevated();

    let mut config = ReplayConfig::from_file(&cli.config)?;
    if let Some(loop_count) = cli.loop_count {
        config.loop_count = loop_count;
    }
    if let Some(initial_delay) = cli.initial_delay {
        config.initial_delay_ms = initial_delay;
    }

    if config.actions.is_empty() {
        println!("No actions defined in config. Nothing to do.");
        return Ok(());
    }

    print_summary(&cli.config, &config);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("\nStopping...");
                cancel.cancel();
            }
        });
    }

    let mut sink = make_sink(cli.dry_run)?;
    let engine = ReplayEngine::new(config);
    engine.run(sink.as_mut(), &cancel).await?;

    Ok(())
}

fn print_summary(path: &str, config: &ReplayConfig) {
    println!("{}", "=== Key Press Replay ===".bold());
    println!("  Config         : {path}");
    println!("  Actions        : {}", config.actions.len());
    let loops = if config.loop_count <= 0 {
        "Infinite".to_string()
    } else {
        config.loop_count.to_string()
    };
    println!("  Loop count     : {loops}");
    println!("  Initial delay  : {}ms", config.initial_delay_ms);
    println!();
    println!("Actions:");
    for (i, action) in config.actions.iter().enumerate() {
        println!(
            "  {:3}. Key: {:<20} Hold: {}ms  Wait after: {}ms",
            i + 1,
            action.key,
            action.hold_ms,
            action.wait_after_ms
        );
    }
    println!();
    println!("Press Ctrl+C to stop at any time.");
}

fn make_sink(dry_run: bool) -> Result<Box<dyn InputSink>> {
    if dry_run {
        return Ok(Box::new(NullSink));
    }
    native_sink()
}

#[cfg(windows)]
fn native_sink() -> Result<Box<dyn InputSink>> {
    Ok(Box::new(key_press_replay::SendInputSink::new()))
}

#[cfg(not(windows))]
fn native_sink() -> Result<Box<dyn InputSink>> {
    Err(key_press_replay::KprError::unsupported_platform(
        "input injection requires Windows; use --dry-run elsewhere",
    )
    .into())
}

/// SendInput only reaches elevated windows when the caller is elevated too,
/// so warn up front.
#[cfg(windows)]
fn warn_if_not_elevated() {
    if !is_elevated() {
        println!("{}", "WARNING: Not running as Administrator.".yellow());
        println!("{}", "Key presses may not reach elevated windows.".yellow());
        println!();
    }
}

#[cfg(not(windows))]
fn warn_if_not_elevated() {}

/// Whether the current process token is elevated.
#[cfg(windows)]
fn is_elevated() -> bool {
    use std::mem;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcessToken};
    use winapi::um::securitybaseapi::GetTokenInformation;
    use winapi::um::winnt::{TokenElevation, HANDLE, TOKEN_ELEVATION, TOKEN_QUERY};

    unsafe {
        let mut token: HANDLE = std::ptr::null_mut();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
        let mut returned = 0u32;
        let ok = GetTokenInformation(
            token,
            TokenElevation,
            &mut elevation as *mut _ as *mut _,
            mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        );
        CloseHandle(token);

        ok != 0 && elevation.TokenIsElevated != 0
    }
}
