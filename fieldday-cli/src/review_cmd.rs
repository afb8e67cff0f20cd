use anyhow::Result;
use fieldday_core::{EndOfDayAlert, daily_completion_rate};

use crate::config::load_config;
use crate::describe;
use crate::state::{FileLedger, ServiceStore, SystemClock};

pub fn end_of_day(dismiss: bool, reset: bool) -> Result<()> {
    let cfg = load_config()?;
    let alert = EndOfDayAlert::new(SystemClock { tz: cfg.tz()? }, &cfg.settings);
    let mut ledger = FileLedger::open()?;

    if dismiss {
        alert.dismiss(&mut ledger);
        ledger.save()?;
        println!("End-of-day alert dismissed for {}.", alert.today());
        return Ok(());
    }
    if reset {
        alert.reset(&mut ledger);
        ledger.save()?;
        println!("End-of-day alert re-armed.");
        return Ok(());
    }

    let store = ServiceStore::open()?;
    let today = alert.today();
    let open = alert.check(store.snapshot(), &ledger);
    if open.is_empty() {
        if alert.seen_today(&ledger) {
            println!("Alert already dismissed for {today}.");
        } else {
            println!("Nothing to flag for {today}.");
        }
    } else {
        println!("{} visit(s) still open on {today}:", open.len());
        for s in open {
            println!("  {}", describe(s));
        }
    }
    println!(
        "Completion: {:.0}%",
        daily_completion_rate(store.snapshot(), today)
    );
    Ok(())
}
