use cronograma_core::domains::activity::projections;
use cronograma_core::domains::activity::store::ActivitySnapshot;
use cronograma_core::domains::condominium::service::Resolution;
use cronograma_core::globals;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Cronograma Debug Tool");
    println!("========================");

    let condominium_id = env::args().nth(1);
    if condominium_id.is_none() {
        eprintln!("Usage: debug_cronograma <condominium-id>");
        eprintln!("   Reads CRONOGRAMA_API_BASE_URL and CRONOGRAMA_STATUS_WIRE_MODE from the environment or .env");
    }

    cronograma_core::initialize_from_env().await?;
    let config = globals::get_config()?;
    println!("📍 API: {} (status mode: {})", config.api_base_url, config.status_wire_mode);

    let session = globals::get_schedule_session()?;
    let opened = session.open(condominium_id.as_deref()).await?;

    match &opened.resolution {
        Resolution::Selected { condominium } => {
            println!("🏢 Condominium: {} ({})", condominium.name, condominium.id);
        }
        Resolution::RedirectToSelection { route, reason } => {
            println!("↪️  Redirect to {}: {}", route, reason);
            return Ok(());
        }
        Resolution::Aborted => {
            println!("⏹️  Lookup aborted");
            return Ok(());
        }
    }

    let summary = session.summary();
    println!("\n📊 SUMMARY");
    println!("==========");
    for chip in &summary.chips {
        println!("   {:<12}: {:>4}", chip.label, chip.value);
    }

    let snapshot = globals::get_activity_store()?.snapshot();
    print_list(&snapshot)?;
    print_kanban(&snapshot)?;
    print_calendar(&snapshot);

    println!("\n✅ DEBUG SESSION COMPLETED");
    Ok(())
}

fn print_list(snapshot: &ActivitySnapshot) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n📋 LIST ({} activities)", snapshot.items.len());
    println!("==========");
    println!("{}", serde_json::to_string_pretty(&projections::list(&snapshot.items))?);
    Ok(())
}

fn print_kanban(snapshot: &ActivitySnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let board = projections::kanban(&snapshot.items);
    println!("\n🗂️  KANBAN");
    println!("==========");
    for column in &board.columns {
        println!("   {:<14} {:>3} cards", column.title, column.cards.len());
        for card in &column.cards {
            let action = card.quick_action_label.unwrap_or("-");
            println!("      • {} [{}]", card.activity.title, action);
        }
    }
    if board.excluded_count > 0 {
        println!("   ⚠️  {} activities with unrecognized status:", board.excluded_count);
        for activity in &board.excluded {
            println!("      • {} (status: {})", activity.title, activity.status);
        }
    }
    Ok(())
}

fn print_calendar(snapshot: &ActivitySnapshot) {
    let view = projections::calendar(&snapshot.items);
    println!("\n📅 CALENDAR ({} dated, {} undated)", view.dated_count(), view.undated);
    println!("==========");
    for (date, activities) in &view.days {
        let titles: Vec<&str> = activities.iter().map(|a| a.title.as_str()).collect();
        println!("   {}: {}", projections::display_date(date), titles.join(", "));
    }
}
