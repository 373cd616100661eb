//! tldvalidate: validates one or more URIs or email addresses against the
//! public-suffix lookup engine. Exits 0 iff every argument validated.

use clap::Parser;

#[derive(Parser)]
#[command(name = "tldvalidate")]
#[command(author = "Kaitu.io")]
#[command(version)]
#[command(about = "Validate URIs and email addresses against the TLD rule set", long_about = None)]
struct Cli {
    /// One or more URIs or email address-list fields to validate.
    inputs: Vec<String>,

    /// Comma-separated scheme whitelist for URI arguments (`*` = any).
    #[arg(long, default_value = "*")]
    schemes: String,

    /// Treat each argument as an email address-list field instead of a URI.
    #[arg(long)]
    list: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(()) = run(&cli) {
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ()> {
    tldrs::load_if_absent(None, true).map_err(|e| eprintln!("tldvalidate: failed to load rules: {e}"))?;
    let rules = tldrs::get_loaded().expect("just loaded");

    let mut all_ok = true;
    for input in &cli.inputs {
        if cli.list {
            let addresses = tldrs::extract_addresses(&rules, input);
            if addresses.is_empty() {
                all_ok = false;
                println!("FAIL {input}");
            } else {
                for addr in &addresses {
                    println!("OK   {} ({})", addr.email_only, input);
                }
            }
            continue;
        }

        match tldrs::lookup_uri(&rules, input, &cli.schemes, tldrs::UriFlags::default()) {
            Ok(info) if info.outcome.is_success() => {
                println!("OK   {input} [{}]", info.tld);
                if cli.verbose {
                    if let Some(country) = info.country {
                        println!("     country: {country}");
                    }
                }
            }
            Ok(info) => {
                all_ok = false;
                println!("FAIL {input} (status: {})", tldrs::status_to_string(info.status));
            }
            Err(e) => {
                all_ok = false;
                println!("FAIL {input} ({e})");
            }
        }
    }

    if all_ok {
        Ok(())
    } else {
        Err(())
    }
}
