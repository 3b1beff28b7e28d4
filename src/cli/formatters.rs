use crate::format::middle_ellipsis;
use crate::store::{BalanceState, NetworkState, ProfileState, TokenEvent, TransactionState};
use crate::tokens::TokenRegistry;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

fn csv_string(records: Vec<Vec<String>>) -> String {
    let mut wtr = Writer::from_writer(vec![]);
    for record in records {
        let _ = wtr.write_record(&record);
    }
    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

/// Render `(metric, value)` pairs in any output format.
fn format_metrics(rows: Vec<(&str, String)>, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = new_table(vec!["Metric", "Value"]);
            for (metric, value) in &rows {
                table.add_row(vec![Cell::new(metric), Cell::new(value)]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let object: serde_json::Map<String, serde_json::Value> = rows
                .into_iter()
                .map(|(metric, value)| (metric.to_lowercase().replace(' ', "_"), json!(value)))
                .collect();
            serde_json::to_string_pretty(&object).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Csv => {
            let mut records = vec![vec!["metric".to_string(), "value".to_string()]];
            records.extend(
                rows.into_iter()
                    .map(|(metric, value)| vec![metric.to_lowercase().replace(' ', "_"), value]),
            );
            csv_string(records)
        }
    }
}

pub fn format_profile(profile: &ProfileState, format: &OutputFormat) -> String {
    let details = &profile.details;
    format_metrics(
        vec![
            (
                "Address",
                details.address.map(|a| a.to_string()).unwrap_or_default(),
            ),
            ("Chain", details.chain.clone()),
            ("Balance", details.balance.clone()),
            ("ENS Name", details.ens_name.clone()),
        ],
        format,
    )
}

pub fn format_network(network: &NetworkState, chain_id: u64, format: &OutputFormat) -> String {
    format_metrics(
        vec![
            ("Network", network.network.clone()),
            ("Expected Chain Id", chain_id.to_string()),
            ("Wrong Network", network.is_wrong_network.to_string()),
        ],
        format,
    )
}

pub fn format_balances(
    balances: &BalanceState,
    registry: &TokenRegistry,
    format: &OutputFormat,
) -> String {
    let rows: Vec<_> = registry
        .iter()
        .filter_map(|token| balances.tokens.get(&token.symbol))
        .collect();

    match format {
        OutputFormat::Table => {
            let mut table = new_table(vec!["Token", "Balance", "Optimistic", "Status"]);
            for b in rows {
                table.add_row(vec![
                    Cell::new(&b.symbol),
                    Cell::new(b.balance.as_deref().unwrap_or("-")),
                    Cell::new(b.optimistic_balance.as_deref().unwrap_or("-")),
                    Cell::new(b.error.as_deref().unwrap_or(if b.loading { "loading" } else { "ok" })),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string()),
        OutputFormat::Csv => {
            let mut records = vec![vec![
                "token".to_string(),
                "balance".to_string(),
                "optimistic_balance".to_string(),
                "error".to_string(),
            ]];
            for b in rows {
                records.push(vec![
                    b.symbol.clone(),
                    b.balance.clone().unwrap_or_default(),
                    b.optimistic_balance.clone().unwrap_or_default(),
                    b.error.clone().unwrap_or_default(),
                ]);
            }
            csv_string(records)
        }
    }
}

pub fn format_events(events: &[TokenEvent], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_events_table(events),
        OutputFormat::Json => {
            serde_json::to_string_pretty(events).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => format_events_csv(events),
    }
}

fn format_events_table(events: &[TokenEvent]) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }

    let mut table = new_table(vec![
        "Block", "Type", "Token", "From", "To", "Amount", "Status", "Tx Hash",
    ]);

    for event in events {
        table.add_row(vec![
            Cell::new(event.block_number.map_or("-".to_string(), |b| b.to_string())),
            Cell::new(format!("{:?}", event.kind)),
            Cell::new(&event.token),
            Cell::new(format!("{:#}", event.from)),
            Cell::new(format!("{:#}", event.to)),
            Cell::new(&event.amount),
            Cell::new(format!("{:?}", event.status)),
            Cell::new(middle_ellipsis(&event.transaction_hash.to_string(), 4)),
        ]);
    }

    table.to_string()
}

fn format_events_csv(events: &[TokenEvent]) -> String {
    let mut records = vec![
        [
            "block_number",
            "type",
            "token",
            "from",
            "to",
            "amount",
            "status",
            "transaction_hash",
            "log_index",
        ]
        .map(String::from)
        .to_vec(),
    ];

    for event in events {
        records.push(vec![
            event.block_number.map_or(String::new(), |b| b.to_string()),
            format!("{:?}", event.kind),
            event.token.clone(),
            event.from.to_string(),
            event.to.to_string(),
            event.amount.clone(),
            format!("{:?}", event.status),
            event.transaction_hash.to_string(),
            event.log_index.map_or(String::new(), |i| i.to_string()),
        ]);
    }

    csv_string(records)
}

pub fn format_transaction(
    action: &str,
    token: &str,
    transaction: &TransactionState,
    optimistic_balance: Option<&str>,
    format: &OutputFormat,
) -> String {
    let status = match transaction {
        TransactionState::Idle => "idle",
        TransactionState::Submitting => "submitting",
        TransactionState::Succeeded(_) => "submitted",
        TransactionState::Failed(_) => "failed",
    };
    format_metrics(
        vec![
            ("Action", action.to_string()),
            ("Token", token.to_string()),
            ("Status", status.to_string()),
            (
                "Tx Hash",
                transaction.tx_hash().map(|h| h.to_string()).unwrap_or_default(),
            ),
            (
                "Projected Balance",
                optimistic_balance.unwrap_or_default().to_string(),
            ),
        ],
        format,
    )
}

pub fn format_allowance(
    token: &str,
    spender: &str,
    allowance: &str,
    format: &OutputFormat,
) -> String {
    format_metrics(
        vec![
            ("Token", token.to_string()),
            ("Spender", spender.to_string()),
            ("Allowance", allowance.to_string()),
        ],
        format,
    )
}
