use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use relnote_core::config::RawInputs;
use relnote_core::pipeline;
use relnote_probes::default_probe;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate release notes by comparing two releases of a chain.
///
/// Every input can also come from the `INPUT_*` variables a CI action runner
/// sets; empty values count as unset.
#[derive(Debug, Parser)]
#[command(name = "relnote", version, about)]
struct Cli {
    /// Release scope: client, runtime or full.
    #[arg(long, env = "INPUT_SCOPE")]
    scope: Option<String>,

    /// Chain being released: mandala, karura or acala.
    #[arg(long, alias = "network", env = "INPUT_NETWORK")]
    chain: Option<String>,

    /// Newer release identifier (tag or branch); requires --previous.
    #[arg(long, env = "INPUT_CURRENT")]
    current: Option<String>,

    /// Older release identifier (tag or branch); requires --current.
    #[arg(long, env = "INPUT_PREVIOUS")]
    previous: Option<String>,

    /// Report template; defaults to the bundled one.
    #[arg(long, env = "INPUT_TEMPLATE")]
    template: Option<String>,

    /// File holding the runtime build summary.
    #[arg(long, env = "INPUT_SRTOOL_DETAILS")]
    srtool_details: Option<String>,

    /// File holding the runtime size diff.
    #[arg(long, env = "INPUT_SUBWASM_INFO")]
    subwasm_info: Option<String>,

    /// Where to write the report.
    #[arg(long, env = "INPUT_OUTPUT")]
    output: Option<String>,

    /// Working tree to inspect.
    #[arg(long, env = "INPUT_REPO")]
    repo: Option<String>,

    /// Timeout for each dependency-graph query, in seconds.
    #[arg(long, env = "INPUT_CARGO_TIMEOUT_SECS")]
    cargo_timeout_secs: Option<String>,

    /// Also print the report to stdout.
    #[arg(long)]
    print: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn inputs(&self) -> RawInputs {
        RawInputs {
            scope: self.scope.clone(),
            chain: self.chain.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            template: self.template.clone(),
            srtool_details: self.srtool_details.clone(),
            subwasm_info: self.subwasm_info.clone(),
            output: self.output.clone(),
            repo: self.repo.clone(),
            cargo_timeout_secs: self.cargo_timeout_secs.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let request = cli.inputs().validate().context("invalid inputs")?;
    let report = pipeline::run(&request, default_probe(request.cargo_timeout)).with_context(|| {
        format!("failed to generate release note for {}", request.chain)
    })?;

    if let Some(step_output) = std::env::var_os("GITHUB_OUTPUT").filter(|v| !v.is_empty()) {
        let step_output = Utf8PathBuf::from_path_buf(step_output.into())
            .map_err(|path| anyhow::anyhow!("GITHUB_OUTPUT is not UTF-8: {}", path.display()))?;
        pipeline::publish_output_path(&step_output, &report.output)
            .context("failed to publish step output")?;
    }

    if cli.print {
        print!("{}", report.text);
    }
    eprintln!("Release note written to {}", report.output);

    Ok(())
}

fn init_tracing(verbose: u8) {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        match verbose {
            0 => "warn",
            1 => "warn,relnote_core=info,relnote_probes=info",
            2 => "info,relnote_core=debug,relnote_probes=debug",
            _ => "debug,relnote_core=trace,relnote_probes=trace",
        }
        .to_string()
    });
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
