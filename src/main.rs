use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::Parser;
use coincsv::{
    interval::interval_label,
    market::{AssetCatalog, MarketClient, PricePoint},
    time,
};
use csv::Writer;
use std::{fmt::Display, fs::File, io, process::ExitCode};

const EXIT_UNKNOWN_ASSET: u8 = 3;
const EXIT_UNKNOWN_CURRENCY: u8 = 4;
const EXIT_EMPTY_SERIES: u8 = 5;

/// Create a CSV file with cryptocurrency price development using the
/// CoinGecko Public API.
///
/// Data intervals: 1 day = 5m, 7 days = 30m, 14 days = 1h, 30 days = 4h,
/// >30 days = 1d.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// ID of the cryptocurrency to retrieve data for.
    #[arg(short = 'i', long, required_unless_present = "list")]
    crypto_id: Option<String>,

    /// Currency to retrieve data in.
    #[arg(short, long, required_unless_present = "list")]
    currency: Option<String>,

    /// Number of days of price data to retrieve.
    #[arg(short, long, required_unless_present = "list",
          value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,

    /// Print list of valid crypto_id values and corresponding cryptocurrency names.
    #[arg(short, long)]
    list: bool,

    /// Convert timestamps to a human-readable format.
    #[arg(short, long)]
    readable_timestamps: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let client = MarketClient::new();

    let catalog = client
        .coin_list()
        .context("failed to fetch the coin reference list")?;

    if args.list {
        print_asset_list(&catalog);
        return Ok(ExitCode::SUCCESS);
    }

    let currencies = client
        .supported_currencies()
        .context("failed to fetch the supported currency list")?;

    // `required_unless_present` above guarantees these are set when not listing.
    let crypto_id = args
        .crypto_id
        .as_deref()
        .expect("clap requires --crypto-id unless --list is used");
    let currency = args
        .currency
        .as_deref()
        .expect("clap requires --currency unless --list is used");
    let days = args
        .days
        .expect("clap requires --days unless --list is used");

    let Some(name) = catalog.name_of(crypto_id) else {
        eprintln!(
            "Error: '{crypto_id}' is not a valid crypto_id value. \
             Use the --list flag to see valid options."
        );
        return Ok(ExitCode::from(EXIT_UNKNOWN_ASSET));
    };

    if !currencies.iter().any(|c| c == currency) {
        eprintln!(
            "Error: '{currency}' is not a valid currency. Supported currencies are: {}",
            currencies.join(", ")
        );
        return Ok(ExitCode::from(EXIT_UNKNOWN_CURRENCY));
    }

    let prices = client
        .market_chart(crypto_id, currency, days)
        .with_context(|| format!("failed to fetch price data for {crypto_id}"))?;

    if prices.is_empty() {
        eprintln!("Error: no price data found for {name} in {currency} for the last {days} days.");
        return Ok(ExitCode::from(EXIT_EMPTY_SERIES));
    }

    let interval = interval_label(days);
    let filename = output_filename(name, currency, days, interval);
    write_csv(&filename, &prices, args.readable_timestamps)
        .with_context(|| format!("failed to write '{filename}'"))?;

    println!(
        "Price data for {name} in {currency} for the last {days} days \
         with {interval} intervals written to {filename}."
    );

    Ok(ExitCode::SUCCESS)
}

fn print_asset_list(catalog: &AssetCatalog) {
    for coin in catalog.iter() {
        println!("{}: {}", coin.id, coin.name);
    }
}

fn output_filename(name: &str, currency: &str, days: u32, interval: &str) -> String {
    format!("{name}_{currency}_{days}d_{interval}_prices.csv")
}

fn write_csv(filename: &str, prices: &[PricePoint], readable_timestamps: bool) -> Result<()> {
    let file = File::create(filename)?;
    write_series(file, prices, readable_timestamps, &Local)
}

/// Write the `timestamp,price` rows into `sink` in the order received.
///
/// Timestamps are raw millisecond values, or `YYYY-MM-DD HH:MM:SS` strings
/// in `tz` when `readable_timestamps` is set.
fn write_series<W, Tz>(
    sink: W,
    prices: &[PricePoint],
    readable_timestamps: bool,
    tz: &Tz,
) -> Result<()>
where
    W: io::Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut writer = Writer::from_writer(sink);

    writer.write_record(["timestamp", "price"])?;

    for point in prices {
        let timestamp = if readable_timestamps {
            time::human_from_millis(tz, point.timestamp_millis())?
        } else {
            point.timestamp_millis().to_string()
        };
        writer.write_record([timestamp, point.price().to_string()])?;
    }

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn prices() -> Vec<PricePoint> {
        vec![
            PricePoint::new(1700000000000, Decimal::from_str_exact("35000.5").unwrap()),
            PricePoint::new(1700003600000, Decimal::from_str_exact("35100.2").unwrap()),
        ]
    }

    #[test]
    fn writes_raw_timestamp_rows() {
        let mut sink = Vec::new();
        write_series(&mut sink, &prices(), false, &Utc).unwrap();

        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "timestamp,price\n\
             1700000000000,35000.5\n\
             1700003600000,35100.2\n"
        );
    }

    #[test]
    fn writes_readable_timestamp_rows() {
        let mut sink = Vec::new();
        write_series(&mut sink, &prices(), true, &Utc).unwrap();

        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "timestamp,price\n\
             2023-11-14 22:13:20,35000.5\n\
             2023-11-14 23:13:20,35100.2\n"
        );
    }

    #[test]
    fn filename_follows_the_output_pattern() {
        assert_eq!(
            output_filename("Bitcoin", "usd", 7, "30m"),
            "Bitcoin_usd_7d_30m_prices.csv"
        );
    }

    #[test]
    fn required_arguments_enforced_unless_listing() {
        use clap::{CommandFactory, FromArgMatches};

        assert!(Args::command().try_get_matches_from(["coincsv"]).is_err());
        assert!(Args::command()
            .try_get_matches_from(["coincsv", "-i", "bitcoin", "-c", "usd"])
            .is_err());
        assert!(Args::command()
            .try_get_matches_from(["coincsv", "-i", "bitcoin", "-c", "usd", "-d", "0"])
            .is_err());

        let matches = Args::command()
            .try_get_matches_from(["coincsv", "--list"])
            .unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        assert!(args.list);
        assert!(!args.readable_timestamps);

        let matches = Args::command()
            .try_get_matches_from(["coincsv", "-i", "bitcoin", "-c", "usd", "-d", "7", "-r"])
            .unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        assert_eq!(args.crypto_id.as_deref(), Some("bitcoin"));
        assert_eq!(args.currency.as_deref(), Some("usd"));
        assert_eq!(args.days, Some(7));
        assert!(args.readable_timestamps);
    }
}
