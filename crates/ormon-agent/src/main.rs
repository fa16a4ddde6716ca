mod dispatcher;

use anyhow::Result;
use ormon_common::config::AgentConfig;
use ormon_common::error::UsageError;
use ormon_common::types::Mode;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  ormon-agent [config|fetch|autoconf|suggest]");
    eprintln!();
    eprintln!("The metric variant is selected with ORMON_VARIANT; run");
    eprintln!("'ormon-agent suggest' for the list of variants.");
}

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(e) => {
            if e.downcast_ref::<UsageError>().is_some() {
                eprintln!("ormon-agent: {e}");
                print_usage();
                2
            } else {
                tracing::error!("{e:#}");
                1
            }
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ormon=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mode = Mode::from_arg(args.get(1).map(String::as_str))?;

    // `suggest` is static and must work even with a broken environment;
    // `autoconf` reports environment problems instead of failing on them.
    let lines = match mode {
        Mode::ListVariants => dispatcher::list_variants(),
        _ => match AgentConfig::from_env() {
            Ok(config) => dispatcher::run(mode, &config)?,
            Err(e) if mode == Mode::Probe => vec![format!("no (configuration invalid: {e})")],
            Err(e) => return Err(e.into()),
        },
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
