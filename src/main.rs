use anyhow::Context;
use log::{info, warn};

use pow_ledger::{Ledger, LedgerConfig, Transaction};

/// Environment variable naming an optional JSON config file
const CONFIG_ENV: &str = "POW_LEDGER_CONFIG";

// Load the ledger configuration, falling back to defaults when unset
fn load_config() -> anyhow::Result<LedgerConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let config = LedgerConfig::from_json_file(&path)
                .with_context(|| format!("loading {}", path.to_string_lossy()))?;
            info!("Loaded ledger config from {}", path.to_string_lossy());
            Ok(config)
        }
        None => Ok(LedgerConfig::default()),
    }
}

fn show_balances(ledger: &Ledger) {
    for (id, balance) in ledger.accounts() {
        info!("{} : {}", id, balance);
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let ledger = Ledger::with_config(load_config()?)?;

    let alice = ledger.add_account("alice")?;
    let bob = ledger.add_account("bob")?;
    let clint = ledger.add_account("clint")?;
    show_balances(&ledger);

    let transfers = [
        (&alice, bob.id(), 2.0),
        (&bob, clint.id(), 1.5),
        (&clint, alice.id(), 9.0),
    ];
    for (sender, receiver, amount) in transfers {
        if !sender.transfer_money(receiver, amount)? {
            warn!("{} -> {} of {} was rejected", sender.id(), receiver, amount);
        }
    }

    let pool = ledger
        .pending_transactions()
        .iter()
        .map(|raw| Transaction::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    info!("Pending pool: {}", serde_json::to_string(&pool)?);

    let block = ledger.mine()?;
    println!("{}", serde_json::to_string_pretty(&block)?);
    show_balances(&ledger);

    Ok(())
}
