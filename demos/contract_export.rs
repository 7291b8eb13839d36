//! Contract export example
//!
//! Run with: cargo run --example contract_export [INVENTORY_JSON] [COMPONENT_NAME]
//!
//! Examples:
//!   cargo run --example contract_export                              # demos/touchpanel.json
//!   cargo run --example contract_export room.json > contract.json
//!   cargo run --example contract_export room.json RoomPanel
//!
//! Prints the processor-side join mapping for an inventory as JSON, followed
//! (on stderr) by a summary of the generated joins.

use touchpanel_bridge::contract::{ContractConfig, ContractDocument, DeviceInventory, SignalRegistry};

fn print_usage() {
    eprintln!("Usage: contract_export [INVENTORY_JSON] [COMPONENT_NAME]");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "demos/touchpanel.json".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("touchpanel_bridge=info".parse()?),
        )
        .init();

    let mut config = ContractConfig::default();
    if let Some(component) = args.next() {
        config = config.component_name(component);
    }

    let inventory = match DeviceInventory::from_path(&path) {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    // Generation errors are fatal: a partial contract would desync panel and processor
    let registry = match SignalRegistry::with_config(&inventory, config) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Contract error: {}", e);
            std::process::exit(2);
        }
    };

    let document = ContractDocument::from_registry(&registry);
    println!("{}", document.to_json_pretty()?);

    eprintln!();
    eprintln!("{:<40} {:<8} {:>4}", "outbound", "kind", "join");
    for signal in registry.outbound() {
        eprintln!("{:<40} {:<8} {:>4}", signal.name, signal.kind, signal.join);
    }
    eprintln!();
    eprintln!("{:<40} {:<8} {:>4}", "inbound", "kind", "join");
    for signal in registry.inbound() {
        eprintln!("{:<40} {:<8} {:>4}", signal.name, signal.kind, signal.join);
    }

    Ok(())
}
