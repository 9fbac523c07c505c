use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;
use url::Url;

use lc_fetch::domain::StopId;
use lc_fetch::fetcher::{Fetcher, FetcherConfig, Query, RegularStreams};
use lc_fetch::stream::ConnectionStream;

/// How many connections to print per stream before stopping.
const MAX_PRINTED: usize = 20;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Get feed configuration from environment
    let entrypoints_raw = std::env::var("LC_ENTRYPOINTS").unwrap_or_else(|_| {
        eprintln!("Warning: LC_ENTRYPOINTS not set. Using the demo feed.");
        "https://graph.irail.be/sncb/connections".to_string()
    });
    let entrypoints: Vec<Url> = entrypoints_raw
        .split(',')
        .map(|raw| Url::parse(raw.trim()).expect("LC_ENTRYPOINTS contains an invalid URL"))
        .collect();

    let departure_stop = std::env::var("LC_DEPARTURE_STOP")
        .expect("LC_DEPARTURE_STOP not set (stop id to depart from)");
    let departure_stop = StopId::parse(&departure_stop).expect("invalid departure stop id");

    let departure_time = match std::env::var("LC_DEPARTURE_TIME") {
        Ok(raw) => DateTime::parse_from_rfc3339(&raw)
            .expect("LC_DEPARTURE_TIME is not RFC 3339")
            .with_timezone(&Utc),
        Err(_) => Utc::now(),
    };

    let config = FetcherConfig::new(entrypoints);
    let fetcher = Fetcher::new(config).expect("Failed to create fetcher");

    let query = Query::new(departure_stop, departure_time);
    let streams = fetcher
        .start_regular(&query)
        .await
        .expect("Failed to start fetching");

    match streams {
        RegularStreams::Single(stream) => print_stream(stream).await,
        RegularStreams::PerEntryPoint(streams) => {
            // A real consumer hands these to a time-ordered merge; the
            // demo prints each entry point's head separately.
            for stream in streams {
                print_stream(stream).await;
            }
        }
    }

    fetcher.close();
}

async fn print_stream(
    mut stream: ConnectionStream<lc_fetch::fetch::HttpTransport>,
) {
    let mut printed = 0;
    while printed < MAX_PRINTED {
        match stream.next().await {
            Some(Ok(connection)) => {
                println!(
                    "{}  {} -> {}  (arrives {})",
                    connection.departure_time,
                    connection.departure_stop,
                    connection.arrival_stop,
                    connection.arrival_time,
                );
                printed += 1;
            }
            Some(Err(error)) => {
                eprintln!("stream failed: {error}");
                return;
            }
            None => break,
        }
    }
    println!("({printed} connections)");
}
