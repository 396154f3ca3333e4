use super::{CommandContext, OutputOptions, print_json};
use crate::display::render_history;
use crate::error::Result;
use crate::types::TicketId;

/// Show a ticket's change log
pub async fn cmd_history(api_url: Option<&str>, ticket: TicketId, output: OutputOptions) -> Result<()> {
    let ctx = CommandContext::connect(api_url).await?;
    let entries = ctx.store.history(ticket).await;
    ctx.flush();
    let entries = entries?;

    if output.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No history recorded for ticket #{ticket}");
        return Ok(());
    }
    println!("{}", render_history(&entries));
    Ok(())
}
