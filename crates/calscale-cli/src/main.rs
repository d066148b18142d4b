use anyhow::Result;
use chrono::{FixedOffset, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use calscale_core::{
    energy_report, today_snapshot, ActivityLevel, BmrProvider, ChartPeriod, EnergyReport,
    Granularity, Sex, SyntheticProvider, UserProfile,
};

#[derive(Parser)]
#[command(name = "calscale")]
#[command(author, version, about = "Calorie expenditure analytics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        long,
        global = true,
        default_value_t = 0,
        help = "UTC offset in hours for calendar bucketing"
    )]
    utc_offset: i32,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Log debug output to stderr")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show basal/active/total energy series for a period")]
    Chart {
        #[arg(long, value_enum, default_value = "week", help = "Chart period")]
        period: PeriodArg,
        #[arg(long, help = "Output as JSON")]
        json: bool,
        #[arg(long, help = "Derive basal energy from the profile's BMR")]
        bmr: bool,
        #[arg(long, help = "Show processing time")]
        benchmark: bool,
        #[arg(long, help = "Disable spinner")]
        no_spinner: bool,
        #[command(flatten)]
        provider: ProviderArgs,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    #[command(about = "Show today's energy snapshot")]
    Today {
        #[arg(long, help = "Output as JSON")]
        json: bool,
        #[arg(long, help = "Derive basal energy from the profile's BMR")]
        bmr: bool,
        #[command(flatten)]
        provider: ProviderArgs,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    #[command(about = "Show BMR and TDEE for a profile")]
    Profile {
        #[arg(long, help = "Output as JSON")]
        json: bool,
        #[command(flatten)]
        profile: ProfileArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
    HalfYear,
    Year,
}

impl PeriodArg {
    fn to_core(self) -> ChartPeriod {
        match self {
            PeriodArg::Week => ChartPeriod::Week,
            PeriodArg::Month => ChartPeriod::Month,
            PeriodArg::HalfYear => ChartPeriod::HalfYear,
            PeriodArg::Year => ChartPeriod::Year,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActivityArg {
    Sedentary,
    Light,
    Moderate,
    High,
    Athlete,
}

#[derive(Debug, Clone, Copy, Args)]
struct ProviderArgs {
    #[arg(long, default_value_t = 1800.0, help = "Synthetic basal level, kcal/day")]
    basal_base: f64,
    #[arg(long, default_value_t = 600.0, help = "Synthetic active level, kcal/day")]
    active_base: f64,
    #[arg(long, default_value_t = 150.0, help = "Synthetic day-to-day variation, kcal")]
    daily_variation: f64,
}

#[derive(Debug, Clone, Copy, Args)]
struct ProfileArgs {
    #[arg(long, value_enum, default_value = "male")]
    sex: SexArg,
    #[arg(long, default_value_t = 30)]
    age: u32,
    #[arg(long, default_value_t = 170.0, help = "Height in cm")]
    height: f64,
    #[arg(long, default_value_t = 80.0, help = "Weight in kg")]
    weight: f64,
    #[arg(long, value_enum, default_value = "moderate")]
    activity: ActivityArg,
}

impl ProviderArgs {
    fn to_provider(self, tz: FixedOffset) -> SyntheticProvider {
        SyntheticProvider {
            authorized: true,
            basal_base: self.basal_base,
            active_base: self.active_base,
            daily_variation: self.daily_variation,
            tz,
        }
    }
}

impl ProfileArgs {
    fn to_profile(self) -> UserProfile {
        UserProfile {
            sex: match self.sex {
                SexArg::Male => Sex::Male,
                SexArg::Female => Sex::Female,
            },
            age: self.age,
            height_cm: self.height,
            weight_kg: self.weight,
            activity: match self.activity {
                ActivityArg::Sedentary => ActivityLevel::Sedentary,
                ActivityArg::Light => ActivityLevel::Light,
                ActivityArg::Moderate => ActivityLevel::Moderate,
                ActivityArg::High => ActivityLevel::High,
                ActivityArg::Athlete => ActivityLevel::Athlete,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let tz = offset_from_hours(cli.utc_offset)?;

    match cli.command {
        Some(Commands::Chart {
            period,
            json,
            bmr,
            benchmark,
            no_spinner,
            provider,
            profile,
        }) => run_chart(
            period.to_core(),
            json,
            bmr,
            benchmark,
            no_spinner,
            provider,
            profile,
            tz,
        ),
        Some(Commands::Today {
            json,
            bmr,
            provider,
            profile,
        }) => run_today(json, bmr, provider, profile, tz),
        Some(Commands::Profile { json, profile }) => run_profile(json, profile),
        None => run_chart(
            ChartPeriod::Week,
            cli.json,
            false,
            false,
            true,
            ProviderArgs {
                basal_base: 1800.0,
                active_base: 600.0,
                daily_variation: 150.0,
            },
            ProfileArgs {
                sex: SexArg::Male,
                age: 30,
                height: 170.0,
                weight: 80.0,
                activity: ActivityArg::Moderate,
            },
            tz,
        ),
    }
}

fn offset_from_hours(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {hours}"))
}

#[allow(clippy::too_many_arguments)]
fn run_chart(
    period: ChartPeriod,
    json: bool,
    bmr: bool,
    benchmark: bool,
    no_spinner: bool,
    provider_args: ProviderArgs,
    profile_args: ProfileArgs,
    tz: FixedOffset,
) -> Result<()> {
    use std::time::Instant;
    use tokio::runtime::Runtime;

    let spinner = make_spinner(json || no_spinner, "Fetching energy samples...");

    let now = Utc::now();
    let start = Instant::now();
    let rt = Runtime::new()?;
    let provider = provider_args.to_provider(tz);

    tracing::debug!(?period, utc_offset = tz.local_minus_utc() / 3600, "building chart");

    let report = if bmr {
        let provider = BmrProvider::new(provider, profile_args.to_profile(), tz);
        rt.block_on(energy_report(&provider, period, now, &tz))?
    } else {
        rt.block_on(energy_report(&provider, period, now, &tz))?
    };
    let processing_time_ms = start.elapsed().as_millis();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report_table(&report, now.with_timezone(&tz).date_naive());

    if benchmark {
        use colored::Colorize;
        println!(
            "{}",
            format!("  Processing time: {processing_time_ms}ms").bright_black()
        );
    }

    Ok(())
}

fn print_report_table(report: &EnergyReport, end_local: chrono::NaiveDate) {
    use colored::Colorize;
    use comfy_table::{ContentArrangement, Table};

    let monthly = report.meta.granularity == Granularity::Month;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if monthly {
        table.set_header(vec!["Month", "Basal", "Active", "Total", "Avg/day"]);
    } else {
        table.set_header(vec!["Date", "Basal", "Active", "Total"]);
    }

    for ((basal, active), total) in report
        .basal
        .points
        .iter()
        .zip(&report.active.points)
        .zip(&report.total.points)
    {
        let mut row = vec![
            if monthly {
                total.date.format("%Y-%m").to_string()
            } else {
                total.date.format("%Y-%m-%d").to_string()
            },
            format_kcal(basal.kcal),
            format_kcal(active.kcal),
            format_kcal(total.kcal),
        ];
        if monthly {
            row.push(format_kcal(total.daily_average(end_local)));
        }
        table.add_row(row);
    }

    println!("{table}");
    println!(
        "\nTotal: {} kcal | Daily max: {} kcal | Active {} of {} {}",
        format_kcal(report.total.summary.total_kcal).bold(),
        format_kcal(report.total.summary.max_bucket_kcal),
        report.total.summary.active_buckets,
        report.total.summary.bucket_count,
        if monthly { "months" } else { "days" },
    );
}

fn run_today(
    json: bool,
    bmr: bool,
    provider_args: ProviderArgs,
    profile_args: ProfileArgs,
    tz: FixedOffset,
) -> Result<()> {
    use colored::Colorize;
    use tokio::runtime::Runtime;

    let now = Utc::now();
    let rt = Runtime::new()?;
    let provider = provider_args.to_provider(tz);
    let profile = profile_args.to_profile();

    let snapshot = if bmr {
        let provider = BmrProvider::new(provider, profile, tz);
        rt.block_on(today_snapshot(&provider, Some(&profile), now, &tz))?
    } else {
        rt.block_on(today_snapshot(&provider, Some(&profile), now, &tz))?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", snapshot.date.format("%Y-%m-%d").to_string().bold());
    println!("  Basal:  {} kcal", format_kcal(snapshot.basal_kcal));
    println!("  Active: {} kcal", format_kcal(snapshot.active_kcal));
    println!(
        "  Total:  {} kcal",
        format_kcal(snapshot.total_kcal).bold()
    );
    if let (Some(bmr), Some(tdee)) = (snapshot.bmr, snapshot.tdee) {
        println!(
            "{}",
            format!("  BMR {} kcal/day | TDEE {} kcal/day", format_kcal(bmr), format_kcal(tdee))
                .bright_black()
        );
    }

    Ok(())
}

fn run_profile(json: bool, profile_args: ProfileArgs) -> Result<()> {
    use colored::Colorize;

    let profile = profile_args.to_profile();
    let bmr = profile.bmr();
    let tdee = profile.tdee();

    if json {
        let output = serde_json::json!({
            "profile": profile,
            "bmr": bmr,
            "tdee": tdee,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("BMR:  {} kcal/day", format_kcal(bmr).bold());
    println!("TDEE: {} kcal/day", format_kcal(tdee).bold());

    Ok(())
}

fn make_spinner(disabled: bool, message: &'static str) -> Option<indicatif::ProgressBar> {
    if disabled {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    Some(pb)
}

fn format_kcal(kcal: f64) -> String {
    let n = kcal.round() as i64;
    let s = n.abs().to_string();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut result = String::with_capacity(len + len / 3 + 1);
    if n < 0 {
        result.push('-');
    }
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(b as char);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_kcal_groups_thousands() {
        assert_eq!(format_kcal(0.0), "0");
        assert_eq!(format_kcal(999.4), "999");
        assert_eq!(format_kcal(1800.0), "1,800");
        assert_eq!(format_kcal(12345.6), "12,346");
        assert_eq!(format_kcal(-2100.0), "-2,100");
    }

    #[test]
    fn offset_rejects_out_of_range_hours() {
        assert!(offset_from_hours(0).is_ok());
        assert!(offset_from_hours(-11).is_ok());
        assert!(offset_from_hours(14).is_ok());
        assert!(offset_from_hours(99).is_err());
    }
}
