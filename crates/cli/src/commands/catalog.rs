//! Catalog and search commands.

use std::io::{self, Write};
use std::time::Duration;

use qkart_core::Product;
use qkart_storefront::search::{NOT_FOUND_MESSAGE, SearchOutcome, SearchState};
use qkart_storefront::{Notice, Storefront};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliError;
use crate::show;

/// List every product.
pub async fn products(storefront: &Storefront) -> Result<(), CliError> {
    let products = storefront.load_catalog().await?;
    let mut out = io::stdout().lock();
    for product in products.iter() {
        write_product(&mut out, product)?;
    }
    Ok(())
}

/// Run one search and print the matches.
pub async fn search(storefront: &Storefront, text: &str) -> Result<(), CliError> {
    let outcome = storefront.search(text).await;
    print_outcome(&outcome)
}

/// Read queries from stdin, one per line, as if typed into a search box.
///
/// Queries are debounced: only a query followed by a pause at least as long
/// as the configured delay (or the end of input) is searched.
pub async fn search_interactive(storefront: &Storefront) -> Result<(), CliError> {
    let mut results = storefront.search_results();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;
    let mut last_shown = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(query) = line? else { break };
                storefront.schedule_search(query.clone());
                last = Some(query);
            }
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = results.borrow_and_update().clone();
                if let SearchState::Done { query, outcome } = state {
                    print_result(&query, &outcome)?;
                    last_shown = Some(query);
                }
            }
        }
    }

    let Some(last) = last else {
        return Ok(());
    };
    if last_shown.as_ref() == Some(&last) {
        return Ok(());
    }

    // Input ended before the last query's result arrived.
    let config = storefront.config();
    let limit = config.search_debounce + config.api.timeout + Duration::from_secs(1);
    let finished = tokio::time::timeout(
        limit,
        results.wait_for(|state| matches!(state, SearchState::Done { query, .. } if *query == last)),
    )
    .await;

    if let Ok(Ok(state)) = finished
        && let SearchState::Done { query, outcome } = (*state).clone()
    {
        print_result(&query, &outcome)?;
    }
    Ok(())
}

fn print_result(query: &str, outcome: &SearchOutcome) -> Result<(), CliError> {
    writeln!(io::stdout().lock(), "> {query}")?;
    print_outcome(outcome)
}

fn print_outcome(outcome: &SearchOutcome) -> Result<(), CliError> {
    match outcome {
        SearchOutcome::Found(products) => {
            let mut out = io::stdout().lock();
            for product in products {
                write_product(&mut out, product)?;
            }
        }
        SearchOutcome::NotFound(_) => show(&Notice::info(NOT_FOUND_MESSAGE)),
    }
    Ok(())
}

fn write_product(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}/5",
        product.id,
        product.name,
        product.category,
        product.cost,
        product.rating()
    )
}
