// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use klogfwd::init::args::DaemonArgs;
use klogfwd::init::daemon::Daemon;
use klogfwd::init::wait;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::process::ExitCode;
use std::time::Duration;
use tokio::select;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing::{error, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

// Used when daemonized
static WORKING_DIR: &str = "/";

const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Parser)]
#[command(name = "klogfwd")]
#[command(bin_name = "klogfwd")]
#[command(version, about = "Forward kernel ring-buffer messages to syslog", long_about = None)]
struct Arguments {
    #[command(flatten)]
    daemon: DaemonArgs,
}

fn main() -> ExitCode {
    let opt = Arguments::parse();
    let args = opt.daemon;

    if !args.foreground {
        let status_log = args.status_log.then(|| args.status_log_file.as_str());
        if let Err(e) = daemonize(&args.pid_file, status_log) {
            eprintln!("klogfwd: ERROR: failed to daemonize: {e}");
            return ExitCode::from(1);
        }
    }

    let _guard = match setup_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("klogfwd: ERROR: failed to setup logging: {e}");
            return ExitCode::from(1);
        }
    };

    match run_daemon(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "kernel log forwarder failed");
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn run_daemon(args: DaemonArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = args.build_config();

    let mut join_set = JoinSet::new();
    let cancel_token = CancellationToken::new();
    {
        let token = cancel_token.clone();
        join_set.spawn(async move { Daemon::new(config).run(token).await });
    }

    let mut sig_hup = sig(SignalKind::hangup());
    loop {
        select! {
            _ = signal_wait() => {
                info!("shutdown signal received");
                cancel_token.cancel();
                break;
            },
            _ = sig_hup.recv() => {
                // Hangup of the controlling terminal is expected when the
                // session that launched us goes away; keep running.
                info!("ignoring SIGHUP");
            },
            e = wait::wait_for_any_task(&mut join_set) => {
                match e {
                    Ok(()) => warn!("unexpected early exit of forwarder"),
                    Err(e) => return Err(e),
                }
                break;
            },
        }
    }

    wait::wait_for_tasks_with_timeout(&mut join_set, Duration::from_secs(SHUTDOWN_TIMEOUT_SECS))
        .await
}

type LoggerGuard = tracing_appender::non_blocking::WorkerGuard;

fn setup_logging() -> Result<LoggerGuard, Box<dyn Error + Send + Sync>> {
    LogTracer::init().expect("Unable to setup log tracer!");

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    use std::io::IsTerminal;

    // Skip color codes when not in a terminal
    let use_ansi = std::io::stdout().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_writer)
        .with_target(false)
        .with_level(true)
        .with_ansi(use_ansi)
        .compact();

    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).unwrap();

    Ok(guard)
}

/// Detach from the controlling terminal, acquiring the pid-file lock in
/// the process. The daemon's stdout/stderr go to the status log when one
/// was requested, otherwise to the null device.
fn daemonize(pid_file: &str, status_log_file: Option<&str>) -> Result<(), Box<dyn Error>> {
    // Do not use tracing in here, it is not set up until after we daemonize
    let (stdout_file, stderr_file) = match status_log_file {
        Some(path) => match OpenOptions::new().append(true).create(true).open(path) {
            Ok(file) => {
                let clone = file.try_clone()?;
                (file, clone)
            }
            Err(e) => {
                // Status logging is optional; keep going without it.
                eprintln!("klogfwd: cannot open status log {path}: {e}, continuing without");
                null_output()?
            }
        },
        None => null_output()?,
    };

    let daemonize = daemonize::Daemonize::new()
        .pid_file(pid_file)
        .working_directory(WORKING_DIR)
        .stdout(stdout_file)
        .stderr(stderr_file);

    match daemonize.start() {
        Ok(_) => Ok(()),
        // daemonize 0.5 keeps `Error::kind`/`ErrorKind` private, so the
        // lock-pidfile failure is distinguished by its public Display string
        // ("unable to lock pid file"). Behavior is identical to matching the
        // `ErrorKind::LockPidfile` variant.
        Err(e) if e.to_string().starts_with("unable to lock pid file") => Err(format!(
            "another instance is already running (pid file {pid_file} is locked)"
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}

fn null_output() -> Result<(File, File), Box<dyn Error>> {
    let file = OpenOptions::new().write(true).open("/dev/null")?;
    let clone = file.try_clone()?;
    Ok((file, clone))
}

async fn signal_wait() {
    let mut sig_term = sig(SignalKind::terminate());
    let mut sig_int = sig(SignalKind::interrupt());
    let mut sig_quit = sig(SignalKind::quit());

    select! {
        _ = sig_term.recv() => {},
        _ = sig_int.recv() => {},
        _ = sig_quit.recv() => {},
    }
}

fn sig(kind: SignalKind) -> Signal {
    signal(kind).unwrap()
}
