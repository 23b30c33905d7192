//! CLI Status Command
//!
//! Asks a running bot for its status over the admin API.

use anyhow::Result;
use devhelper_commands::status_text;
use devhelper_core::BotStatus;

pub async fn run(host: &str, port: u16) -> Result<()> {
    let url = format!("http://{host}:{port}/bot-status");
    let client = reqwest::Client::new();

    let resp = match client.get(&url).send().await {
        Ok(resp) => resp,
        Err(_) => {
            println!("DevHelper is not running on {host}:{port}");
            return Ok(());
        }
    };

    let body: serde_json::Value = resp.json().await?;
    match serde_json::from_value::<BotStatus>(body.clone()) {
        Ok(status) => println!("{}", status_text(&status)),
        Err(_) => println!("{}", serde_json::to_string_pretty(&body)?),
    }
    Ok(())
}
