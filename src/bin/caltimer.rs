use caltimer::ScheduleExpression;
use clap::Parser;
use jiff::Zoned;
use std::process;

#[derive(Parser)]
#[command(
    name = "caltimer",
    about = "Calendar-based schedule expressions",
    version
)]
struct Cli {
    /// Second field (default "0")
    #[arg(long)]
    second: Option<String>,

    /// Minute field (default "0")
    #[arg(long)]
    minute: Option<String>,

    /// Hour field (default "0")
    #[arg(long)]
    hour: Option<String>,

    /// Day-of-month field, e.g. "15", "last fri", "-3" (default "*")
    #[arg(long, allow_hyphen_values = true)]
    day_of_month: Option<String>,

    /// Month field, e.g. "7" or "jul" (default "*")
    #[arg(long)]
    month: Option<String>,

    /// Day-of-week field, e.g. "mon-fri" (default "*")
    #[arg(long)]
    day_of_week: Option<String>,

    /// Year field (default "*")
    #[arg(long)]
    year: Option<String>,

    /// Inclusive window start (RFC 9557, e.g. 2026-01-01T00:00:00[UTC])
    #[arg(long)]
    start: Option<String>,

    /// Inclusive window end
    #[arg(long)]
    end: Option<String>,

    /// IANA timezone the fields are evaluated in
    #[arg(long)]
    timezone: Option<String>,

    /// Reference time (defaults to now)
    #[arg(long)]
    from: Option<String>,

    /// Only show fire times at or before this time
    #[arg(long)]
    to: Option<String>,

    /// Number of fire times to show
    #[arg(short, long, default_value = "1")]
    n: u32,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Validate the fields without computing fire times
    #[arg(long)]
    check: bool,

    /// Show the parsed expression as JSON
    #[arg(long)]
    parse: bool,
}

fn parse_zoned(text: &str, what: &str) -> Zoned {
    match text.parse() {
        Ok(z) => z,
        Err(e) => {
            eprintln!("error: invalid {what}: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut builder = ScheduleExpression::builder();
    if let Some(text) = cli.second {
        builder = builder.second(text);
    }
    if let Some(text) = cli.minute {
        builder = builder.minute(text);
    }
    if let Some(text) = cli.hour {
        builder = builder.hour(text);
    }
    if let Some(text) = cli.day_of_month {
        builder = builder.day_of_month(text);
    }
    if let Some(text) = cli.month {
        builder = builder.month(text);
    }
    if let Some(text) = cli.day_of_week {
        builder = builder.day_of_week(text);
    }
    if let Some(text) = cli.year {
        builder = builder.year(text);
    }
    if let Some(text) = cli.start {
        builder = builder.start(parse_zoned(&text, "start"));
    }
    if let Some(text) = cli.end {
        builder = builder.end(parse_zoned(&text, "end"));
    }
    if let Some(name) = cli.timezone {
        builder = builder.timezone(name);
    }

    let expr = match builder.build() {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if cli.check {
        println!("\u{2713} valid");
        process::exit(0);
    }

    if cli.parse {
        match serde_json::to_string_pretty(&expr) {
            Ok(json) => {
                println!("{json}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    }

    let mut n = cli.n;
    if n > 1000 {
        eprintln!("warning: capped at 1000 fire times");
        n = 1000;
    }

    let from = match cli.from {
        Some(text) => parse_zoned(&text, "reference"),
        None => Zoned::now(),
    };

    let results: Vec<Zoned> = match cli.to {
        Some(text) => {
            let to = parse_zoned(&text, "bound");
            expr.between(&from, &to).take(n as usize).collect()
        }
        None => expr.fire_times(&from).take(n as usize).collect(),
    };

    if results.is_empty() {
        eprintln!("no upcoming fire times");
        process::exit(0);
    }

    if cli.json {
        let iso_strings: Vec<String> = results.iter().map(|z| z.to_string()).collect();
        println!("{}", serde_json::to_string(&iso_strings).unwrap());
    } else {
        for z in &results {
            println!("{z}");
        }
    }
}
