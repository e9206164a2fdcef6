use std::{env, fs};

use anyhow::{Context, bail};
use log::{info, warn};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use ml_toolkit::{
    Datapoint, Persist, TrainingConfig, models::LeastSquares, streaming::OnlineLearner,
};

const QUEUE_SIZE: usize = 64;

/// Trains an online linear model from whitespace separated `x... y` rows read
/// from stdin and prints the learned parameters.
///
/// Usage: `ml_toolkit <config.json> [features]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: ml_toolkit <config.json> [features]");
    };

    let features = match args.next() {
        Some(n) => n.parse().context("the amount of features must be a number")?,
        None => 1,
    };

    let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = TrainingConfig::from_json(&json)?;

    let model = LeastSquares::online(features, config.learning_rate)
        .with_regularization(config.regularization);

    let (tx, rx) = mpsc::channel(QUEUE_SIZE);
    let mut session = OnlineLearner::new(model)
        .divergence(config.divergence)
        .on_update(|update| info!(seq = update.seq; "parameters {:?}", update.state))
        .spawn(rx);

    let producer = tokio::spawn(async move {
        let mut lines = BufReader::new(io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let Some(point) = parse_row(&line) else {
                warn!("ignoring malformed row {line:?}");
                continue;
            };

            if tx.send(point).await.is_err() {
                break;
            }
        }

        io::Result::Ok(())
    });

    while let Some(e) = session.next_error().await {
        warn!("{e}");
    }

    let done = session.join().await?;

    if done.aborted {
        producer.abort();
    } else {
        producer.await??;
    }

    info!(processed = done.processed, skipped = done.skipped; "stream finished");
    println!("{}", done.model.to_json()?);
    Ok(())
}

/// Parses a row of numbers, the last one being the label.
fn parse_row(line: &str) -> Option<Datapoint> {
    let mut values = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<f64>, _>>()
        .ok()?;

    let y = values.pop()?;
    Some(Datapoint::new(values, vec![y]))
}
