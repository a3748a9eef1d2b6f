use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use session_calendar::{
    CalendarConfig, ExchangeCalendar, HolidayFile, HolidaySet, HolidaySource, load_config_path,
};
use shared_utils::optional_env_var;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "SESSION_CALENDAR_CONFIG";
const HOLIDAYS_ENV: &str = "SESSION_CALENDAR_HOLIDAYS";

#[derive(Parser)]
#[command(version, about = "Trading session calendar CLI")]
struct Cli {
    /// Calendar TOML file (falls back to $SESSION_CALENDAR_CONFIG, then the SHSZ preset)
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Holiday list, one YYYYMMDD per line (falls back to $SESSION_CALENDAR_HOLIDAYS)
    #[arg(long, value_name = "FILE")]
    holidays: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List session dates
    Sessions {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Print open / break / close instants of one session
    Boundaries {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Print every tradable minute of one session
    Minutes {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Check whether an RFC 3339 instant is a trading minute
    IsOpen {
        #[arg(long)]
        at: DateTime<Utc>,
    },
    /// Name, timezone, range and totals
    Summary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1) Calendar config
    let config = match cli.config.or_else(|| optional_env_var(CONFIG_ENV)) {
        Some(path) => load_config_path(&path)?,
        None => CalendarConfig::shsz_default().context("build SHSZ preset")?,
    };

    // 2) Holidays (an unreadable file means no extra holidays)
    let holidays = match cli.holidays.or_else(|| optional_env_var(HOLIDAYS_ENV)) {
        Some(path) => HolidayFile::new(path).fetch_holidays(),
        None => HolidaySet::new(),
    };

    // 3) Build
    let cal = ExchangeCalendar::new(config, holidays).context("build calendar")?;

    match cli.cmd {
        Cmd::Sessions { from, to } => {
            for day in cal.schedule().sessions() {
                if from.is_some_and(|f| day < f) || to.is_some_and(|t| day > t) {
                    continue;
                }
                println!("{day}");
            }
        }
        Cmd::Boundaries { date } => {
            let b = cal.boundaries_for(date)?;
            println!("open        {}", b.open.to_rfc3339());
            if let (Some(bs), Some(be)) = (b.break_start, b.break_end) {
                println!("break_start {}", bs.to_rfc3339());
                println!("break_end   {}", be.to_rfc3339());
            }
            println!("close       {}", b.close.to_rfc3339());
        }
        Cmd::Minutes { date } => {
            for m in cal.minutes_for_session(date)? {
                println!("{}", m.to_rfc3339());
            }
        }
        Cmd::IsOpen { at } => match cal.session_for_minute(at) {
            Some(day) => println!("true ({day})"),
            None => println!("false"),
        },
        Cmd::Summary => {
            println!("name      {}", cal.name());
            println!("timezone  {}", cal.timezone().name());
            if let (Some(first), Some(last)) = (cal.first_session(), cal.last_session()) {
                println!("sessions  {} ({first} .. {last})", cal.schedule().len());
            } else {
                println!("sessions  0");
            }
            println!("minutes   {}", cal.all_minutes().len());
            println!("holidays  {}", cal.holidays().len());
        }
    }

    Ok(())
}
